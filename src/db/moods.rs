use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{fmt_datetime, parse_datetime, parse_uuid, Database};
use crate::error::ValidationError;
use crate::models::*;

const MOOD_COLUMNS: &str = "id, user_id, mood, note, source, created_at";

fn row_to_mood(row: &Row) -> rusqlite::Result<MoodEntry> {
    Ok(MoodEntry {
        id: parse_uuid(row.get(0)?),
        user_id: parse_uuid(row.get(1)?),
        mood: row.get(2)?,
        note: row.get(3)?,
        source: EntrySource::from_str(&row.get::<_, String>(4)?).unwrap_or(EntrySource::Manual),
        created_at: parse_datetime(row.get(5)?),
    })
}

/// Insert a mood row on an already-locked connection (or open transaction).
pub(super) fn insert_mood(
    conn: &Connection,
    user_id: Uuid,
    mood: i32,
    note: Option<String>,
    source: EntrySource,
    now: DateTime<Utc>,
) -> Result<MoodEntry> {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO moods (id, user_id, mood, note, source, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        (
            id.to_string(),
            user_id.to_string(),
            mood,
            &note,
            source.as_str(),
            fmt_datetime(&now),
        ),
    )?;

    Ok(MoodEntry {
        id,
        user_id,
        mood,
        note,
        source,
        created_at: now,
    })
}

impl Database {
    pub fn create_mood(&self, user_id: Uuid, input: CreateMoodInput) -> Result<MoodEntry> {
        if !(0..=MAX_MOOD_RATING).contains(&input.mood) {
            return Err(ValidationError::invalid(format!(
                "mood must be between 0 and {}, got {}",
                MAX_MOOD_RATING, input.mood
            ))
            .into());
        }
        self.require_user(user_id)?;

        let entry = insert_mood(
            &self.lock(),
            user_id,
            input.mood,
            input.note,
            EntrySource::Manual,
            Utc::now(),
        )?;
        tracing::debug!("Logged mood {} for user {}", entry.mood, user_id);
        Ok(entry)
    }

    pub fn get_mood(&self, id: Uuid) -> Result<Option<MoodEntry>> {
        let mood = self
            .lock()
            .query_row(
                &format!("SELECT {MOOD_COLUMNS} FROM moods WHERE id = ?"),
                [id.to_string()],
                row_to_mood,
            )
            .optional()?;
        Ok(mood)
    }

    /// A user's moods, newest first.
    pub fn get_moods_by_user(
        &self,
        user_id: Uuid,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<Vec<MoodEntry>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MOOD_COLUMNS} FROM moods WHERE user_id = ?
             ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?"
        ))?;

        // SQLite treats a negative LIMIT as "no limit"
        let limit = limit.map(i64::from).unwrap_or(-1);
        let moods = stmt
            .query_map((user_id.to_string(), limit, offset), row_to_mood)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(moods)
    }

    pub fn latest_mood(&self, user_id: Uuid) -> Result<Option<MoodEntry>> {
        Ok(self.get_moods_by_user(user_id, Some(1), 0)?.into_iter().next())
    }

    pub fn delete_mood(&self, id: Uuid) -> Result<bool> {
        let rows = self
            .lock()
            .execute("DELETE FROM moods WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }
}
