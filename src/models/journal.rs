use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::mood::JournalMood;

/// A free-text journal entry.
///
/// Sentiment is scored when the entry is written or its text changes, and a
/// matching [`MoodEntry`](super::MoodEntry) is kept in sync through `mood_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub is_favorite: bool,
    pub mood_id: Option<Uuid>,
    /// 0.0 (very negative) to 1.0 (very positive).
    pub sentiment_score: f64,
    pub mood_type: JournalMood,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJournalInput {
    pub text: String,
    #[serde(default)]
    pub is_favorite: bool,
}

/// Input for updating a journal entry. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateJournalInput {
    pub text: Option<String>,
    pub is_favorite: Option<bool>,
}

/// Prompts offered for the next journal entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalPrompts {
    /// Mood of the latest entry, or `None` before the first one.
    pub based_on: Option<JournalMood>,
    pub prompts: Vec<String>,
}
