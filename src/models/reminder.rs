use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every day of the week, 1 = Monday through 7 = Sunday.
pub const ALL_DAYS: &str = "1234567";

/// A scheduled nudge for a user, optionally about one of their plants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plant_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub reminder_type: ReminderType,
    pub scheduled_for: DateTime<Utc>,
    /// ISO weekday digits the reminder may fire on.
    pub days_of_week: String,
    pub is_active: bool,
    pub notified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reminder {
    /// Whether the reminder should be sent at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active || self.notified || self.scheduled_for > now {
            return false;
        }
        let weekday = now.weekday().number_from_monday();
        self.days_of_week
            .chars()
            .filter_map(|c| c.to_digit(10))
            .any(|d| d == weekday)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReminderType {
    Journal,
    Water,
    Mood,
    Custom,
}

impl ReminderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Journal => "journal",
            Self::Water => "water",
            Self::Mood => "mood",
            Self::Custom => "custom",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "journal" => Some(Self::Journal),
            "water" => Some(Self::Water),
            "mood" => Some(Self::Mood),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReminderInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub plant_id: Option<Uuid>,
    /// Defaults to `Custom`.
    #[serde(default)]
    pub reminder_type: Option<ReminderType>,
    pub scheduled_for: DateTime<Utc>,
    /// Defaults to every day.
    #[serde(default)]
    pub days_of_week: Option<String>,
}

/// Input for updating a reminder. All fields are optional for partial updates.
///
/// Rescheduling clears `notified` so the reminder can fire again.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateReminderInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub days_of_week: Option<String>,
    pub is_active: Option<bool>,
}

/// Outcome of one pass over due reminders.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchReport {
    pub checked: usize,
    pub sent: usize,
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reminder(days: &str) -> Reminder {
        // 2024-01-01 was a Monday
        let scheduled = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        Reminder {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plant_id: None,
            title: "Water".to_string(),
            description: String::new(),
            reminder_type: ReminderType::Water,
            scheduled_for: scheduled,
            days_of_week: days.to_string(),
            is_active: true,
            notified: false,
            created_at: scheduled,
            updated_at: scheduled,
        }
    }

    #[test]
    fn due_once_scheduled_time_passes() {
        let r = reminder(ALL_DAYS);
        assert!(!r.is_due(Utc.with_ymd_and_hms(2024, 1, 1, 8, 59, 0).unwrap()));
        assert!(r.is_due(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()));
    }

    #[test]
    fn respects_days_of_week() {
        let weekdays = reminder("12345");
        // Saturday
        assert!(!weekdays.is_due(Utc.with_ymd_and_hms(2024, 1, 6, 10, 0, 0).unwrap()));
        // Following Monday
        assert!(weekdays.is_due(Utc.with_ymd_and_hms(2024, 1, 8, 10, 0, 0).unwrap()));
    }

    #[test]
    fn inactive_or_notified_reminders_are_never_due() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();

        let mut r = reminder(ALL_DAYS);
        r.is_active = false;
        assert!(!r.is_due(now));

        let mut r = reminder(ALL_DAYS);
        r.notified = true;
        assert!(!r.is_due(now));
    }
}
