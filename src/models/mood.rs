use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::mood::MoodLevelView;

/// Highest rating on the hand-entered mood scale.
pub const MAX_MOOD_RATING: i32 = 10;

/// A single mood rating, 0 (very low) to 10 (excellent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub mood: i32,
    pub note: Option<String>,
    pub source: EntrySource,
    pub created_at: DateTime<Utc>,
}

/// How a mood entry was recorded.
///
/// - `Manual`: the user picked a rating
/// - `Journal`: derived from the sentiment of a journal entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    Manual,
    Journal,
}

impl EntrySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Journal => "journal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(Self::Manual),
            "journal" => Some(Self::Journal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMoodInput {
    pub mood: i32,
    #[serde(default)]
    pub note: Option<String>,
}

/// A mood entry together with its display bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodCard {
    #[serde(flatten)]
    pub entry: MoodEntry,
    pub display: MoodLevelView,
}
