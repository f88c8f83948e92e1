//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::db;
use crate::docstore::DEFAULT_APP_ID;

const DEFAULT_REMINDER_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace for shared plant documents (PLANTPAL_APP_ID).
    pub app_id: String,
    /// SQLite file (PLANTPAL_DB_PATH).
    pub db_path: PathBuf,
    /// How often due reminders are dispatched; `None` disables the loop
    /// (PLANTPAL_REMINDER_INTERVAL_SECS=0).
    pub reminder_interval: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let app_id = std::env::var("PLANTPAL_APP_ID")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_APP_ID.to_string());

        let db_path = match std::env::var("PLANTPAL_DB_PATH") {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => db::default_path()?,
        };

        let interval_secs = match std::env::var("PLANTPAL_REMINDER_INTERVAL_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("PLANTPAL_REMINDER_INTERVAL_SECS is not a number: {raw}"))?,
            Err(_) => DEFAULT_REMINDER_INTERVAL_SECS,
        };
        let reminder_interval = (interval_secs > 0).then(|| Duration::from_secs(interval_secs));

        Ok(Self {
            app_id,
            db_path,
            reminder_interval,
        })
    }
}
