use anyhow::Result;
use chrono::Utc;
use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

use super::moods::insert_mood;
use super::plants::{select_plants_by_user, write_plant_change};
use super::{fmt_datetime, parse_datetime, parse_uuid, Database};
use crate::error::ValidationError;
use crate::growth;
use crate::models::*;
use crate::mood::{analyze_text, JournalMood};

const JOURNAL_COLUMNS: &str =
    "id, user_id, text, is_favorite, mood_id, sentiment_score, mood_type, created_at, updated_at";

fn row_to_entry(row: &Row) -> rusqlite::Result<JournalEntry> {
    Ok(JournalEntry {
        id: parse_uuid(row.get(0)?),
        user_id: parse_uuid(row.get(1)?),
        text: row.get(2)?,
        is_favorite: row.get::<_, i32>(3)? != 0,
        mood_id: row.get::<_, Option<String>>(4)?.map(parse_uuid),
        sentiment_score: row.get(5)?,
        mood_type: JournalMood::from_str(&row.get::<_, String>(6)?)
            .unwrap_or(JournalMood::Neutral),
        created_at: parse_datetime(row.get(7)?),
        updated_at: parse_datetime(row.get(8)?),
    })
}

fn auto_mood_note(entry_id: Uuid) -> String {
    format!("Auto-generated from journal entry {}", entry_id)
}

impl Database {
    /// Write a journal entry.
    ///
    /// In one transaction this scores the text, records the derived mood, and
    /// lets that mood act on each of the user's plants.
    pub fn create_journal_entry(
        &self,
        user_id: Uuid,
        input: CreateJournalInput,
    ) -> Result<JournalEntry> {
        if input.text.trim().is_empty() {
            return Err(ValidationError::invalid("journal text must not be empty").into());
        }
        self.require_user(user_id)?;

        let analysis = analyze_text(&input.text);
        let id = Uuid::new_v4();
        let now = Utc::now();

        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let mood = insert_mood(
            &tx,
            user_id,
            analysis.rating(),
            Some(auto_mood_note(id)),
            EntrySource::Journal,
            now,
        )?;

        tx.execute(
            "INSERT INTO journal_entries (id, user_id, text, is_favorite, mood_id, sentiment_score, mood_type, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                user_id.to_string(),
                &input.text,
                input.is_favorite as i32,
                mood.id.to_string(),
                analysis.score,
                analysis.mood_type.as_str(),
                fmt_datetime(&now),
                fmt_datetime(&now),
            ),
        )?;

        let plants = select_plants_by_user(&tx, user_id)?;
        for plant in plants {
            let (plant, log) = growth::mood_effect(plant, analysis.score, now);
            write_plant_change(&tx, &plant, &log)?;
        }

        tx.commit()?;

        tracing::info!(
            "Journal entry {} scored {:.3} ({})",
            id,
            analysis.score,
            analysis.mood_type.as_str()
        );

        Ok(JournalEntry {
            id,
            user_id,
            text: input.text,
            is_favorite: input.is_favorite,
            mood_id: Some(mood.id),
            sentiment_score: analysis.score,
            mood_type: analysis.mood_type,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_journal_entry(&self, id: Uuid) -> Result<Option<JournalEntry>> {
        let entry = self
            .lock()
            .query_row(
                &format!("SELECT {JOURNAL_COLUMNS} FROM journal_entries WHERE id = ?"),
                [id.to_string()],
                row_to_entry,
            )
            .optional()?;
        Ok(entry)
    }

    /// A user's journal, newest first.
    pub fn get_journal_entries(&self, user_id: Uuid) -> Result<Vec<JournalEntry>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {JOURNAL_COLUMNS} FROM journal_entries WHERE user_id = ?
             ORDER BY created_at DESC, rowid DESC"
        ))?;
        let entries = stmt
            .query_map([user_id.to_string()], row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn count_journal_entries(&self, user_id: Uuid) -> Result<usize> {
        let count: i64 = self.lock().query_row(
            "SELECT COUNT(*) FROM journal_entries WHERE user_id = ?",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Edit an entry. Changed text is re-scored and its linked mood follows;
    /// plants are not affected a second time.
    pub fn update_journal_entry(
        &self,
        id: Uuid,
        input: UpdateJournalInput,
    ) -> Result<Option<JournalEntry>> {
        let Some(mut entry) = self.get_journal_entry(id)? else {
            return Ok(None);
        };

        let now = Utc::now();
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        if let Some(text) = input.text.filter(|t| *t != entry.text) {
            if text.trim().is_empty() {
                return Err(ValidationError::invalid("journal text must not be empty").into());
            }
            let analysis = analyze_text(&text);

            let linked = match entry.mood_id {
                Some(mood_id) => {
                    tx.execute(
                        "UPDATE moods SET mood = ? WHERE id = ?",
                        (analysis.rating(), mood_id.to_string()),
                    )? > 0
                }
                None => false,
            };
            if !linked {
                let mood = insert_mood(
                    &tx,
                    entry.user_id,
                    analysis.rating(),
                    Some(auto_mood_note(id)),
                    EntrySource::Journal,
                    now,
                )?;
                entry.mood_id = Some(mood.id);
            }

            entry.text = text;
            entry.sentiment_score = analysis.score;
            entry.mood_type = analysis.mood_type;
        }
        if let Some(fav) = input.is_favorite {
            entry.is_favorite = fav;
        }
        entry.updated_at = now;

        tx.execute(
            "UPDATE journal_entries SET text = ?, is_favorite = ?, mood_id = ?, sentiment_score = ?, mood_type = ?, updated_at = ?
             WHERE id = ?",
            (
                &entry.text,
                entry.is_favorite as i32,
                entry.mood_id.map(|m| m.to_string()),
                entry.sentiment_score,
                entry.mood_type.as_str(),
                fmt_datetime(&now),
                id.to_string(),
            ),
        )?;
        tx.commit()?;

        Ok(Some(entry))
    }

    pub fn delete_journal_entry(&self, id: Uuid) -> Result<bool> {
        let rows = self
            .lock()
            .execute("DELETE FROM journal_entries WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }
}
