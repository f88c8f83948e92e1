use serde::{Deserialize, Serialize};

/// Shown in place of a mood badge when a user has not logged anything yet.
pub const NO_MOOD_EMOJI: &str = "🌱";

/// Display bucket for a 0–10 mood rating.
///
/// Buckets are closed at their lower bound: 8, 6, 4 and 2. The mapping is
/// total; anything above the scale is `Excellent`, anything below (or NaN)
/// is `VeryLow`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MoodLevel {
    Excellent,
    Good,
    Okay,
    Low,
    VeryLow,
}

impl MoodLevel {
    pub fn classify(value: f64) -> Self {
        if value >= 8.0 {
            Self::Excellent
        } else if value >= 6.0 {
            Self::Good
        } else if value >= 4.0 {
            Self::Okay
        } else if value >= 2.0 {
            Self::Low
        } else {
            Self::VeryLow
        }
    }

    pub fn from_rating(rating: i64) -> Self {
        Self::classify(rating as f64)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Okay => "Okay",
            Self::Low => "Low",
            Self::VeryLow => "Very Low",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Excellent => "bg-green-500",
            Self::Good => "bg-blue-500",
            Self::Okay => "bg-yellow-500",
            Self::Low => "bg-orange-500",
            Self::VeryLow => "bg-red-500",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Excellent => "😊",
            Self::Good => "🙂",
            Self::Okay => "😐",
            Self::Low => "😔",
            Self::VeryLow => "😢",
        }
    }

    pub fn view(&self) -> MoodLevelView {
        MoodLevelView {
            level: *self,
            label: self.label().to_string(),
            color: self.color().to_string(),
            emoji: self.emoji().to_string(),
        }
    }
}

/// Serialized form of a [`MoodLevel`] with its label, color and emoji spelled out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoodLevelView {
    pub level: MoodLevel,
    pub label: String,
    pub color: String,
    pub emoji: String,
}

/// Message shown under a user's average mood on their profile.
pub fn encouragement(average: f64) -> &'static str {
    if average >= 7.0 {
        "You're doing great! Keep up the positive energy! 🌟"
    } else if average >= 5.0 {
        "You're on a good path. Remember to take care of yourself! 🌱"
    } else {
        "Remember that it's okay to have ups and downs. Your plant is here to support you! 💚"
    }
}
