use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MoodEntry;
use crate::mood::{self, MoodLevel, MoodLevelView};

/// Summary shown on a user's profile.
///
/// Never stored; recomputed from the user's journal and mood history on
/// every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileStats {
    pub user_id: Uuid,
    pub total_entries: usize,
    pub total_moods: usize,
    /// Mean mood rating rounded to one decimal, 0 when nothing is logged.
    pub average_mood: f64,
    pub level: MoodLevelView,
    pub encouragement: String,
    pub plant_count: usize,
}

impl ProfileStats {
    pub fn compute(
        user_id: Uuid,
        journal_count: usize,
        moods: &[MoodEntry],
        plant_count: usize,
    ) -> Self {
        let average = if moods.is_empty() {
            0.0
        } else {
            let sum: i64 = moods.iter().map(|m| m.mood as i64).sum();
            mood::round_to(sum as f64 / moods.len() as f64, 1)
        };

        let mut level = MoodLevel::classify(average).view();
        if moods.is_empty() {
            level.emoji = mood::NO_MOOD_EMOJI.to_string();
        }

        Self {
            user_id,
            total_entries: journal_count,
            total_moods: moods.len(),
            average_mood: average,
            level,
            encouragement: mood::encouragement(average).to_string(),
            plant_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntrySource;
    use chrono::Utc;

    fn entry(mood: i32) -> MoodEntry {
        MoodEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            mood,
            note: None,
            source: EntrySource::Manual,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn no_moods_averages_to_zero() {
        let stats = ProfileStats::compute(Uuid::nil(), 3, &[], 0);
        assert_eq!(stats.average_mood, 0.0);
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.level.label, "Very Low");
        assert_eq!(stats.level.emoji, mood::NO_MOOD_EMOJI);
    }

    #[test]
    fn average_is_rounded_to_one_decimal() {
        let moods = [entry(7), entry(8), entry(8)];
        let stats = ProfileStats::compute(Uuid::nil(), 0, &moods, 1);
        assert_eq!(stats.average_mood, 7.7);
        assert_eq!(stats.total_moods, 3);
        assert_eq!(stats.level.label, "Good");
        assert!(stats.encouragement.starts_with("You're doing great"));
    }
}
