//! Keyword sentiment for journal text, journaling prompts, and mood trends.

use serde::{Deserialize, Serialize};

use super::round_to;

const POSITIVE_WORDS: &[&str] = &[
    "happy", "joy", "love", "good", "great", "amazing", "wonderful", "excited", "fantastic",
    "awesome", "excellent", "perfect", "beautiful", "grateful", "blessed", "content",
    "peaceful", "cheerful", "delighted", "thrilled", "ecstatic", "optimistic", "hopeful",
    "proud", "accomplished",
];

const NEGATIVE_WORDS: &[&str] = &[
    "sad", "bad", "awful", "terrible", "hate", "angry", "frustrated", "depressed", "worried",
    "stressed", "horrible", "disgusting", "anxious", "upset", "disappointed", "lonely", "hurt",
    "pain", "difficult", "hard", "struggle", "problem", "issue", "concern",
];

const NEUTRAL_WORDS: &[&str] = &[
    "okay", "fine", "normal", "usual", "regular", "typical", "average", "ordinary", "standard",
    "common",
];

/// Keyword-based analysis never claims more certainty than this.
const MAX_KEYWORD_CONFIDENCE: f64 = 0.8;

/// Mood vocabulary used for journal entries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JournalMood {
    Happy,
    Content,
    Neutral,
    Calm,
    Sad,
}

impl JournalMood {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::Happy
        } else if score >= 0.65 {
            Self::Content
        } else if score >= 0.35 {
            Self::Neutral
        } else if score >= 0.2 {
            Self::Calm
        } else {
            Self::Sad
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Content => "content",
            Self::Neutral => "neutral",
            Self::Calm => "calm",
            Self::Sad => "sad",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "happy" => Some(Self::Happy),
            "content" => Some(Self::Content),
            "neutral" => Some(Self::Neutral),
            "calm" => Some(Self::Calm),
            "sad" => Some(Self::Sad),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentimentAnalysis {
    /// 0.0 (very negative) to 1.0 (very positive), 0.5 is neutral.
    pub score: f64,
    pub mood_type: JournalMood,
    pub confidence: f64,
    pub positive_words: usize,
    pub negative_words: usize,
    pub neutral_words: usize,
    pub keyword_density: f64,
}

impl SentimentAnalysis {
    /// The score projected onto the 0–10 rating scale users log by hand.
    pub fn rating(&self) -> i32 {
        (self.score * 10.0).round() as i32
    }
}

pub fn analyze_text(text: &str) -> SentimentAnalysis {
    let lower = text.to_lowercase();
    let total = lower.split_whitespace().count();

    let count = |words: &[&str]| words.iter().filter(|w| lower.contains(*w)).count();
    let pos = count(POSITIVE_WORDS);
    let neg = count(NEGATIVE_WORDS);
    let neu = count(NEUTRAL_WORDS);

    let score = if total == 0 {
        0.5
    } else {
        let pos_weight = pos as f64 / total as f64;
        let neg_weight = neg as f64 / total as f64;
        if pos_weight > neg_weight {
            0.5 + pos_weight * 0.4
        } else if neg_weight > pos_weight {
            0.5 - neg_weight * 0.4
        } else {
            0.5
        }
    }
    .clamp(0.0, 1.0);

    let density = (pos + neg + neu) as f64 / total.max(1) as f64;

    SentimentAnalysis {
        score: round_to(score, 3),
        mood_type: JournalMood::from_score(score),
        confidence: round_to((density * 2.0).min(MAX_KEYWORD_CONFIDENCE), 3),
        positive_words: pos,
        negative_words: neg,
        neutral_words: neu,
        keyword_density: round_to(density, 3),
    }
}

/// Three journaling prompts suited to a mood label.
pub fn prompt_suggestions(mood: &str) -> Vec<&'static str> {
    let prompts: [&'static str; 5] = match mood {
        "sad" | "anxious" => [
            "What's one small thing that could make today a little brighter?",
            "Write about someone who makes you feel supported and loved.",
            "What are three things you're grateful for, even during difficult times?",
            "Describe a memory that always makes you smile.",
            "What would you tell a friend who was feeling the same way?",
        ],
        "happy" | "excited" | "content" => [
            "What made you feel so good today? Capture all the details!",
            "Who contributed to your happiness today, and how?",
            "What aspects of your life are you most grateful for right now?",
            "Describe the best moment of your day in vivid detail.",
            "What are you most excited about in the coming days?",
        ],
        "neutral" | "calm" => [
            "What's on your mind today? Let your thoughts flow freely.",
            "Reflect on one thing you learned about yourself recently.",
            "What would make tomorrow even better than today?",
            "Write about something you're looking forward to.",
            "What's one goal you're working toward, and how do you feel about it?",
        ],
        _ => [
            "How are you feeling right now, and what might be influencing that?",
            "What's been the highlight of your week so far?",
            "Write about something that's been on your mind lately.",
            "What's one thing you appreciate about your current situation?",
            "If you could send a message to yourself one year from now, what would it be?",
        ],
    };

    prompts.into_iter().take(3).collect()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Neutral,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoodTrend {
    pub trend: Trend,
    pub trend_direction: TrendDirection,
    pub average_mood: f64,
    pub days_analyzed: usize,
    pub mood_scores: Vec<f64>,
}

/// Compare the three most recent scores against the three before them.
///
/// `scores` must be ordered newest first.
pub fn analyze_trend(scores: &[f64]) -> MoodTrend {
    if scores.is_empty() {
        return MoodTrend {
            trend: Trend::Stable,
            trend_direction: TrendDirection::Neutral,
            average_mood: 0.5,
            days_analyzed: 0,
            mood_scores: Vec::new(),
        };
    }

    let mean = |s: &[f64]| s.iter().sum::<f64>() / s.len() as f64;
    let average = mean(scores);

    let (trend, direction) = if scores.len() >= 3 {
        let recent = mean(&scores[..3]);
        let older_window = &scores[3..scores.len().min(6)];
        let older = if older_window.is_empty() {
            recent
        } else {
            mean(older_window)
        };

        if recent > older + 0.1 {
            (Trend::Improving, TrendDirection::Up)
        } else if recent < older - 0.1 {
            (Trend::Declining, TrendDirection::Down)
        } else {
            (Trend::Stable, TrendDirection::Neutral)
        }
    } else {
        (Trend::InsufficientData, TrendDirection::Neutral)
    };

    MoodTrend {
        trend,
        trend_direction: direction,
        average_mood: round_to(average, 3),
        days_analyzed: scores.len(),
        mood_scores: scores.to_vec(),
    }
}
