use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default share of a plant's health change driven by music listening.
pub const DEFAULT_MUSIC_MOOD_WEIGHT: f64 = 0.5;

/// A person tending one or more plants.
///
/// `music_mood_weight` scales how strongly listening sessions move their
/// plants' health, from 0.0 (music ignored) to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub music_mood_weight: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserInput {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub bio: Option<String>,
    /// Defaults to [`DEFAULT_MUSIC_MOOD_WEIGHT`].
    #[serde(default)]
    pub music_mood_weight: Option<f64>,
}

/// Input for updating a user. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserInput {
    pub email: Option<String>,
    pub bio: Option<String>,
    pub music_mood_weight: Option<f64>,
}
