use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::OptionalExtension;
use serde_json::Value;

use super::{fmt_datetime, Database};

fn decode(path: &str, raw: &str) -> Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("Corrupt document at {}", path))
}

impl Database {
    pub fn get_document(&self, path: &str) -> Result<Option<Value>> {
        let raw: Option<String> = self
            .lock()
            .query_row("SELECT data FROM documents WHERE path = ?", [path], |row| {
                row.get(0)
            })
            .optional()?;
        raw.map(|r| decode(path, &r)).transpose()
    }

    /// Read-modify-write a document under the connection lock.
    ///
    /// `update` receives the current contents (if any) and returns the new
    /// contents, which are stored and returned.
    pub fn write_document<F>(&self, path: &str, collection: &str, update: F) -> Result<Value>
    where
        F: FnOnce(Option<Value>) -> Result<Value>,
    {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let current: Option<String> = tx
            .query_row("SELECT data FROM documents WHERE path = ?", [path], |row| {
                row.get(0)
            })
            .optional()?;
        let current = current.map(|r| decode(path, &r)).transpose()?;

        let next = update(current)?;
        tx.execute(
            "INSERT INTO documents (path, collection, data, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(path) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
            (
                path,
                collection,
                serde_json::to_string(&next)?,
                fmt_datetime(&Utc::now()),
            ),
        )?;
        tx.commit()?;

        Ok(next)
    }

    pub fn delete_document(&self, path: &str) -> Result<bool> {
        let rows = self
            .lock()
            .execute("DELETE FROM documents WHERE path = ?", [path])?;
        Ok(rows > 0)
    }

    /// All documents directly inside `collection`, ordered by path.
    pub fn list_documents(&self, collection: &str) -> Result<Vec<(String, Value)>> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT path, data FROM documents WHERE collection = ? ORDER BY path")?;
        let rows = stmt
            .query_map([collection], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(path, raw)| {
                let value = decode(&path, &raw)?;
                Ok((path, value))
            })
            .collect()
    }
}
