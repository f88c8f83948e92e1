use anyhow::Result;
use chrono::Utc;
use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

use super::{fmt_datetime, parse_datetime, parse_uuid, Database};
use crate::error::ValidationError;
use crate::models::*;

const USER_COLUMNS: &str = "id, username, email, bio, music_mood_weight, created_at, updated_at";

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: parse_uuid(row.get(0)?),
        username: row.get(1)?,
        email: row.get(2)?,
        bio: row.get(3)?,
        music_mood_weight: row.get(4)?,
        created_at: parse_datetime(row.get(5)?),
        updated_at: parse_datetime(row.get(6)?),
    })
}

fn check_weight(weight: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&weight) {
        Ok(weight)
    } else {
        Err(ValidationError::invalid("music_mood_weight must be between 0 and 1").into())
    }
}

impl Database {
    pub fn create_user(&self, input: CreateUserInput) -> Result<User> {
        let username = input.username.trim().to_string();
        if username.is_empty() {
            return Err(ValidationError::invalid("username must not be empty").into());
        }
        let weight = check_weight(input.music_mood_weight.unwrap_or(DEFAULT_MUSIC_MOOD_WEIGHT))?;

        let conn = self.lock();
        let taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)",
            [&username],
            |row| row.get(0),
        )?;
        if taken {
            return Err(ValidationError::invalid(format!("username '{}' is taken", username)).into());
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO users (id, username, email, bio, music_mood_weight, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &username,
                &input.email,
                &input.bio,
                weight,
                fmt_datetime(&now),
                fmt_datetime(&now),
            ),
        )?;

        tracing::info!("Created user {} ({})", username, id);

        Ok(User {
            id,
            username,
            email: input.email,
            bio: input.bio,
            music_mood_weight: weight,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let conn = self.lock();
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
                [id.to_string()],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Like [`get_user`](Self::get_user) but a missing user is an error.
    pub(crate) fn require_user(&self, id: Uuid) -> Result<User> {
        self.get_user(id)?
            .ok_or_else(|| ValidationError::NotFound("User").into())
    }

    pub fn update_user(&self, id: Uuid, input: UpdateUserInput) -> Result<Option<User>> {
        let Some(existing) = self.get_user(id)? else {
            return Ok(None);
        };

        let email = input.email.unwrap_or(existing.email);
        let bio = input.bio.or(existing.bio);
        let weight = match input.music_mood_weight {
            Some(w) => check_weight(w)?,
            None => existing.music_mood_weight,
        };
        let now = Utc::now();

        self.lock().execute(
            "UPDATE users SET email = ?, bio = ?, music_mood_weight = ?, updated_at = ? WHERE id = ?",
            (&email, &bio, weight, fmt_datetime(&now), id.to_string()),
        )?;

        Ok(Some(User {
            id,
            username: existing.username,
            email,
            bio,
            music_mood_weight: weight,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    pub fn delete_user(&self, id: Uuid) -> Result<bool> {
        let rows = self
            .lock()
            .execute("DELETE FROM users WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    /// Profile aggregate, or `None` for an unknown user.
    pub fn get_profile_stats(&self, user_id: Uuid) -> Result<Option<ProfileStats>> {
        if self.get_user(user_id)?.is_none() {
            return Ok(None);
        }

        let moods = self.get_moods_by_user(user_id, None, 0)?;
        let journal_count = self.count_journal_entries(user_id)?;
        let plant_count = self.get_plants_by_user(user_id)?.len();

        Ok(Some(ProfileStats::compute(
            user_id,
            journal_count,
            &moods,
            plant_count,
        )))
    }
}
