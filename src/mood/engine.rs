//! Unified mood determination and its effect on plant growth.
//!
//! Journal text and music listening each produce a [`MoodReading`] on a
//! 0.0–1.0 scale. [`unify`] merges them (journal weighted 0.6, music 0.4) and
//! [`growth_impact`] turns the result into growth points for the plant.

use serde::{Deserialize, Serialize};

const JOURNAL_WEIGHT: f64 = 0.6;
const MUSIC_WEIGHT: f64 = 0.4;

/// Points at which a plant is considered fully grown for staging purposes.
const FULL_GROWTH_POINTS: f64 = 20.0;

/// Named mood on the 0.0–1.0 score scale.
///
/// Declaration order matters: [`score_to_mood_type`] picks the first type whose
/// reference score is close enough.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MoodType {
    Euphoric,
    Happy,
    Upbeat,
    Energetic,
    Neutral,
    Calm,
    Melancholy,
    Sad,
    Low,
}

impl MoodType {
    pub const ALL: [MoodType; 9] = [
        Self::Euphoric,
        Self::Happy,
        Self::Upbeat,
        Self::Energetic,
        Self::Neutral,
        Self::Calm,
        Self::Melancholy,
        Self::Sad,
        Self::Low,
    ];

    pub fn reference_score(&self) -> f64 {
        match self {
            Self::Euphoric => 0.95,
            Self::Happy => 0.8,
            Self::Upbeat => 0.7,
            Self::Energetic => 0.75,
            Self::Neutral => 0.5,
            Self::Calm => 0.4,
            Self::Melancholy => 0.3,
            Self::Sad => 0.2,
            Self::Low => 0.15,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Euphoric => "🤩",
            Self::Happy => "😊",
            Self::Upbeat => "😎",
            Self::Energetic => "⚡",
            Self::Neutral => "😐",
            Self::Calm => "😌",
            Self::Melancholy => "😔",
            Self::Sad => "😢",
            Self::Low => "😞",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Euphoric => "euphoric",
            Self::Happy => "happy",
            Self::Upbeat => "upbeat",
            Self::Energetic => "energetic",
            Self::Neutral => "neutral",
            Self::Calm => "calm",
            Self::Melancholy => "melancholy",
            Self::Sad => "sad",
            Self::Low => "low",
        }
    }
}

pub fn score_to_mood_type(score: f64) -> MoodType {
    if let Some(close) = MoodType::ALL
        .iter()
        .find(|t| (score - t.reference_score()).abs() < 0.1)
    {
        return *close;
    }

    if score >= 0.8 {
        MoodType::Happy
    } else if score >= 0.6 {
        MoodType::Upbeat
    } else if score >= 0.4 {
        MoodType::Neutral
    } else if score >= 0.2 {
        MoodType::Sad
    } else {
        MoodType::Low
    }
}

/// A mood measurement from a single source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MoodReading {
    pub score: f64,
    pub mood_type: MoodType,
    pub confidence: f64,
}

impl MoodReading {
    /// Reading for a bare score, with the type derived from it.
    pub fn from_score(score: f64, confidence: f64) -> Self {
        let score = score.clamp(0.0, 1.0);
        Self {
            score,
            mood_type: score_to_mood_type(score),
            confidence,
        }
    }
}

/// Audio features of a listening session, each on Spotify's 0.0–1.0 scale
/// except `tempo` which is in BPM.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AudioFeatures {
    #[serde(default = "half")]
    pub valence: f64,
    #[serde(default = "half")]
    pub energy: f64,
    #[serde(default = "half")]
    pub danceability: f64,
    #[serde(default = "default_tempo")]
    pub tempo: f64,
}

fn half() -> f64 {
    0.5
}

fn default_tempo() -> f64 {
    120.0
}

impl Default for AudioFeatures {
    fn default() -> Self {
        Self {
            valence: half(),
            energy: half(),
            danceability: half(),
            tempo: default_tempo(),
        }
    }
}

pub fn analyze_music(features: &AudioFeatures) -> MoodReading {
    // 60–200 BPM mapped onto 0–1
    let tempo = ((features.tempo - 60.0) / 140.0).clamp(0.0, 1.0);

    let score = (features.valence * 0.4
        + features.energy * 0.3
        + features.danceability * 0.2
        + tempo * 0.1)
        .clamp(0.0, 1.0);

    let normalized = [features.valence, features.energy, features.danceability, tempo];
    let mean = normalized.iter().sum::<f64>() / normalized.len() as f64;
    let variance =
        normalized.iter().map(|f| (f - mean).powi(2)).sum::<f64>() / normalized.len() as f64;

    MoodReading {
        score,
        mood_type: score_to_mood_type(score),
        confidence: (1.0 - variance).max(0.3),
    }
}

/// Where a unified mood came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReadingSource {
    Journal,
    Music,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnifiedMood {
    pub score: f64,
    pub mood_type: MoodType,
    pub confidence: f64,
    pub sources: Vec<ReadingSource>,
    pub primary_source: Option<ReadingSource>,
}

/// Merge journal and music readings into one emotional state.
pub fn unify(journal: Option<&MoodReading>, music: Option<&MoodReading>) -> UnifiedMood {
    match (journal, music) {
        (None, None) => UnifiedMood {
            score: 0.5,
            mood_type: MoodType::Neutral,
            confidence: 0.0,
            sources: Vec::new(),
            primary_source: None,
        },
        (Some(only), None) => passthrough(only, ReadingSource::Journal),
        (None, Some(only)) => passthrough(only, ReadingSource::Music),
        (Some(journal), Some(music)) => {
            let score = journal.score * JOURNAL_WEIGHT + music.score * MUSIC_WEIGHT;
            let primary = if journal.confidence > music.confidence {
                ReadingSource::Journal
            } else {
                ReadingSource::Music
            };
            UnifiedMood {
                score,
                mood_type: score_to_mood_type(score),
                confidence: (journal.confidence + music.confidence) / 2.0,
                sources: vec![ReadingSource::Journal, ReadingSource::Music],
                primary_source: Some(primary),
            }
        }
    }
}

fn passthrough(reading: &MoodReading, source: ReadingSource) -> UnifiedMood {
    UnifiedMood {
        score: reading.score,
        mood_type: reading.mood_type,
        confidence: reading.confidence,
        sources: vec![source],
        primary_source: Some(source),
    }
}

/// Visual growth stage derived from accumulated growth points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlantStage {
    Wilt,
    Seedling,
    Sprout,
    Bloom,
}

impl PlantStage {
    pub fn from_points(points: u32) -> Self {
        let ratio = (points as f64 / FULL_GROWTH_POINTS).min(1.0);
        if ratio <= 0.2 {
            Self::Wilt
        } else if ratio <= 0.4 {
            Self::Seedling
        } else if ratio <= 0.7 {
            Self::Sprout
        } else {
            Self::Bloom
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Wilt => "Wilting",
            Self::Seedling => "Seedling",
            Self::Sprout => "Sprouting",
            Self::Bloom => "Blooming",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Wilt => "🥀",
            Self::Seedling => "🌱",
            Self::Sprout => "🌿",
            Self::Bloom => "🌸",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrowthImpact {
    pub growth_change: i32,
    pub new_growth_points: u32,
    pub plant_stage: PlantStage,
    pub stage_label: String,
    pub stage_emoji: String,
    pub mood_influence: MoodType,
    pub growth_multiplier: f64,
}

pub fn growth_impact(mood: &UnifiedMood, current_points: u32) -> GrowthImpact {
    let growth_change = if mood.score >= 0.8 {
        3
    } else if mood.score >= 0.6 {
        2
    } else if mood.score >= 0.4 {
        1
    } else if mood.score >= 0.2 {
        0
    } else {
        -1
    };

    let new_growth_points = (current_points as i64 + growth_change as i64).max(0) as u32;
    let stage = PlantStage::from_points(new_growth_points);

    GrowthImpact {
        growth_change,
        new_growth_points,
        plant_stage: stage,
        stage_label: stage.label().to_string(),
        stage_emoji: stage.emoji().to_string(),
        mood_influence: mood.mood_type,
        growth_multiplier: growth_multiplier(mood.score),
    }
}

pub fn growth_multiplier(score: f64) -> f64 {
    if score >= 0.8 {
        1.5
    } else if score >= 0.6 {
        1.2
    } else if score >= 0.4 {
        1.0
    } else if score >= 0.2 {
        0.8
    } else {
        0.5
    }
}

/// Up to three nudges for the user given their current mood score.
pub fn recommendations(score: f64) -> Vec<&'static str> {
    let all: &[&'static str] = if score < 0.3 {
        &[
            "Consider writing about what's bothering you in your journal",
            "Listen to some uplifting music to help your plant grow",
            "Take a moment to water your virtual plant - it needs your care",
            "Try a short breathing exercise",
        ]
    } else if score < 0.5 {
        &[
            "Share what's on your mind in a journal entry",
            "Put on some energizing music to boost your mood",
            "Check in with your plant - how is it feeling today?",
        ]
    } else if score > 0.7 {
        &[
            "Your positive energy is helping your plant thrive!",
            "Consider journaling about what made you feel good today",
            "Your plant is blooming thanks to your positive mood!",
        ]
    } else {
        &[]
    };

    all.iter().take(3).copied().collect()
}

/// Plant-care suggestion keyed by a free-form mood label.
pub fn care_suggestion(label: &str) -> &'static str {
    match label.to_lowercase().as_str() {
        "stressed" => {
            "Feeling stressed? Take a deep breath and connect with your plant for a few minutes. 🌿"
        }
        "happy" => "Great mood! Log today's plant growth or give it some extra care! ✨",
        "sad" => {
            "It's okay to feel down. Spending some quiet time near your plants can be soothing. 💧"
        }
        "relaxed" => {
            "Feeling relaxed? Enjoy the calm with your plant. Maybe plan its next watering. 🧘‍♀️"
        }
        "energetic" => {
            "Full of energy? Your plants might benefit from a gentle clean or repotting! 🚀"
        }
        _ => "Remember to check on your PlantPal today. A little attention goes a long way! 😊",
    }
}
