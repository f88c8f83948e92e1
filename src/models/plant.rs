use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_SPECIES: &str = "Mystery Seedling";
pub const MIN_GROWTH_LEVEL: i32 = 1;
pub const MAX_GROWTH_LEVEL: i32 = 10;
pub const MAX_HEALTH: f64 = 100.0;

/// A user's virtual plant.
///
/// Health runs 0–100 and growth level 1–10. `health_status` is always derived
/// from `health` when the plant is written; it is stored so that lists can be
/// filtered and sorted without recomputing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plant {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub species: String,
    pub description: Option<String>,
    pub growth_level: i32,
    pub health: f64,
    pub health_status: HealthStatus,
    pub last_watered: Option<DateTime<Utc>>,
    pub last_fertilized: Option<DateTime<Utc>>,
    pub last_music_boost: Option<DateTime<Utc>>,
    pub total_music_minutes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Coarse health bucket shown next to a plant.
///
/// - `Excellent`: health 80 and above
/// - `Good`: 60–79
/// - `Fair`: 40–59
/// - `Poor`: 20–39
/// - `Critical`: below 20
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
            Self::Critical => "critical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "excellent" => Some(Self::Excellent),
            "good" => Some(Self::Good),
            "fair" => Some(Self::Fair),
            "poor" => Some(Self::Poor),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// A care or mood event recorded against a plant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantLog {
    pub id: Uuid,
    pub plant_id: Uuid,
    pub activity: PlantActivity,
    pub note: Option<String>,
    /// Activity-specific measurement, e.g. the mood score that caused it.
    pub value: f64,
    /// Health change the activity caused.
    pub growth_impact: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlantActivity {
    Watered,
    Fertilized,
    MusicBoost,
    Journal,
}

impl PlantActivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Watered => "watered",
            Self::Fertilized => "fertilized",
            Self::MusicBoost => "music_boost",
            Self::Journal => "journal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "watered" => Some(Self::Watered),
            "fertilized" => Some(Self::Fertilized),
            "music_boost" => Some(Self::MusicBoost),
            "journal" => Some(Self::Journal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlantInput {
    pub name: String,
    /// Defaults to [`DEFAULT_SPECIES`].
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Input for updating a plant. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePlantInput {
    pub name: Option<String>,
    pub species: Option<String>,
    pub description: Option<String>,
}

/// A listening session applied to a plant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicSessionInput {
    /// 0.0 (sad) to 1.0 (happy).
    pub mood_score: f64,
    pub minutes: u32,
}

/// A plant after a care or mood action, with the log entry it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantUpdate {
    pub plant: Plant,
    pub log: PlantLog,
}
