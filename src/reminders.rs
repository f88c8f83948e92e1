//! Reminder dispatch.
//!
//! There is no delivery channel beyond the log: a due reminder is announced
//! with `tracing::info!` and marked notified so it fires once.

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::db::Database;
use crate::models::DispatchReport;

/// Announce every due reminder and, unless `dry_run`, mark it notified.
pub fn dispatch_due(db: &Database, now: DateTime<Utc>, dry_run: bool) -> Result<DispatchReport> {
    let pending = db.get_pending_reminders()?;
    let mut report = DispatchReport {
        checked: pending.len(),
        ..Default::default()
    };

    for reminder in pending {
        if !reminder.is_due(now) {
            report.skipped += 1;
            continue;
        }

        tracing::info!(
            user_id = %reminder.user_id,
            reminder_type = reminder.reminder_type.as_str(),
            "Reminder due: {}",
            reminder.title
        );

        if !dry_run {
            db.mark_reminder_notified(reminder.id)?;
        }
        report.sent += 1;
    }

    Ok(report)
}

/// Run [`dispatch_due`] every `period` until `shutdown` fires.
pub fn spawn_reminder_loop(
    db: Database,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        tracing::info!("Reminder loop started (every {:?})", period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match dispatch_due(&db, Utc::now(), false) {
                        Ok(report) if report.sent > 0 => {
                            tracing::debug!("Dispatched {} of {} pending reminders", report.sent, report.checked);
                        }
                        Ok(_) => {}
                        Err(e) => tracing::error!("Reminder dispatch failed: {:#}", e),
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Reminder loop stopping");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateReminderInput, CreateUserInput};
    use chrono::TimeZone;

    fn setup() -> (Database, uuid::Uuid) {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        let user = db
            .create_user(CreateUserInput {
                username: "sam".to_string(),
                email: "sam@example.com".to_string(),
                bio: None,
                music_mood_weight: None,
            })
            .unwrap();
        (db, user.id)
    }

    fn reminder_at(at: DateTime<Utc>, days: &str) -> CreateReminderInput {
        CreateReminderInput {
            title: "Write in your journal".to_string(),
            description: String::new(),
            plant_id: None,
            reminder_type: None,
            scheduled_for: at,
            days_of_week: Some(days.to_string()),
        }
    }

    #[test]
    fn sends_due_reminders_once() {
        let (db, user_id) = setup();
        // Monday
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        db.create_reminder(user_id, reminder_at(now - chrono::Duration::hours(1), "1234567"))
            .unwrap();

        let first = dispatch_due(&db, now, false).unwrap();
        assert_eq!(first, DispatchReport { checked: 1, sent: 1, skipped: 0 });

        let second = dispatch_due(&db, now, false).unwrap();
        assert_eq!(second, DispatchReport::default());
    }

    #[test]
    fn dry_run_leaves_reminders_pending() {
        let (db, user_id) = setup();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        db.create_reminder(user_id, reminder_at(now, "1")).unwrap();

        assert_eq!(dispatch_due(&db, now, true).unwrap().sent, 1);
        assert_eq!(dispatch_due(&db, now, true).unwrap().sent, 1);
    }

    #[test]
    fn skips_future_and_off_day_reminders() {
        let (db, user_id) = setup();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        db.create_reminder(user_id, reminder_at(now + chrono::Duration::hours(1), "1234567"))
            .unwrap();
        // Saturday only
        db.create_reminder(user_id, reminder_at(now, "6")).unwrap();

        let report = dispatch_due(&db, now, false).unwrap();
        assert_eq!(report, DispatchReport { checked: 2, sent: 0, skipped: 2 });
    }

    #[tokio::test]
    async fn loop_stops_on_shutdown() {
        let (db, _) = setup();
        let (tx, rx) = broadcast::channel(1);
        let handle = spawn_reminder_loop(db, Duration::from_millis(10), rx);

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop should stop")
            .unwrap();
    }
}
