use anyhow::Result;
use chrono::Utc;
use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

use super::{fmt_datetime, parse_datetime, parse_uuid, Database};
use crate::error::ValidationError;
use crate::models::*;

const REMINDER_COLUMNS: &str = "id, user_id, plant_id, title, description, reminder_type, scheduled_for, \
     days_of_week, is_active, notified, created_at, updated_at";

fn row_to_reminder(row: &Row) -> rusqlite::Result<Reminder> {
    Ok(Reminder {
        id: parse_uuid(row.get(0)?),
        user_id: parse_uuid(row.get(1)?),
        plant_id: row.get::<_, Option<String>>(2)?.map(parse_uuid),
        title: row.get(3)?,
        description: row.get(4)?,
        reminder_type: ReminderType::from_str(&row.get::<_, String>(5)?)
            .unwrap_or(ReminderType::Custom),
        scheduled_for: parse_datetime(row.get(6)?),
        days_of_week: row.get(7)?,
        is_active: row.get::<_, i32>(8)? != 0,
        notified: row.get::<_, i32>(9)? != 0,
        created_at: parse_datetime(row.get(10)?),
        updated_at: parse_datetime(row.get(11)?),
    })
}

/// Days must be ISO weekday digits 1–7, at least one of them.
fn check_days(days: &str) -> Result<()> {
    if days.is_empty() || !days.chars().all(|c| ('1'..='7').contains(&c)) {
        return Err(ValidationError::invalid(format!(
            "days_of_week must be digits 1-7 (Monday-Sunday), got '{}'",
            days
        ))
        .into());
    }
    Ok(())
}

impl Database {
    pub fn create_reminder(&self, user_id: Uuid, input: CreateReminderInput) -> Result<Reminder> {
        if input.title.trim().is_empty() {
            return Err(ValidationError::invalid("reminder title must not be empty").into());
        }
        let days = input.days_of_week.unwrap_or_else(|| ALL_DAYS.to_string());
        check_days(&days)?;
        self.require_user(user_id)?;

        if let Some(plant_id) = input.plant_id {
            match self.get_plant(plant_id)? {
                Some(plant) if plant.user_id == user_id => {}
                _ => return Err(ValidationError::NotFound("Plant").into()),
            }
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        let reminder_type = input.reminder_type.unwrap_or(ReminderType::Custom);

        self.lock().execute(
            "INSERT INTO reminders (id, user_id, plant_id, title, description, reminder_type, scheduled_for,
                                    days_of_week, is_active, notified, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1, 0, ?, ?)",
            (
                id.to_string(),
                user_id.to_string(),
                input.plant_id.map(|p| p.to_string()),
                &input.title,
                &input.description,
                reminder_type.as_str(),
                fmt_datetime(&input.scheduled_for),
                &days,
                fmt_datetime(&now),
                fmt_datetime(&now),
            ),
        )?;

        Ok(Reminder {
            id,
            user_id,
            plant_id: input.plant_id,
            title: input.title,
            description: input.description,
            reminder_type,
            scheduled_for: input.scheduled_for,
            days_of_week: days,
            is_active: true,
            notified: false,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_reminder(&self, id: Uuid) -> Result<Option<Reminder>> {
        let reminder = self
            .lock()
            .query_row(
                &format!("SELECT {REMINDER_COLUMNS} FROM reminders WHERE id = ?"),
                [id.to_string()],
                row_to_reminder,
            )
            .optional()?;
        Ok(reminder)
    }

    /// A user's reminders, soonest first.
    pub fn get_reminders_by_user(&self, user_id: Uuid) -> Result<Vec<Reminder>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {REMINDER_COLUMNS} FROM reminders WHERE user_id = ? ORDER BY scheduled_for, rowid"
        ))?;
        let reminders = stmt
            .query_map([user_id.to_string()], row_to_reminder)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reminders)
    }

    /// Active reminders that have not fired yet, across all users.
    pub fn get_pending_reminders(&self) -> Result<Vec<Reminder>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {REMINDER_COLUMNS} FROM reminders WHERE is_active = 1 AND notified = 0
             ORDER BY scheduled_for, rowid"
        ))?;
        let reminders = stmt
            .query_map([], row_to_reminder)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reminders)
    }

    pub fn update_reminder(&self, id: Uuid, input: UpdateReminderInput) -> Result<Option<Reminder>> {
        let Some(mut reminder) = self.get_reminder(id)? else {
            return Ok(None);
        };

        if let Some(title) = input.title {
            if title.trim().is_empty() {
                return Err(ValidationError::invalid("reminder title must not be empty").into());
            }
            reminder.title = title;
        }
        if let Some(description) = input.description {
            reminder.description = description;
        }
        if let Some(days) = input.days_of_week {
            check_days(&days)?;
            reminder.days_of_week = days;
        }
        if let Some(active) = input.is_active {
            reminder.is_active = active;
        }
        if let Some(scheduled_for) = input.scheduled_for {
            reminder.scheduled_for = scheduled_for;
            reminder.notified = false;
        }
        reminder.updated_at = Utc::now();

        self.lock().execute(
            "UPDATE reminders SET title = ?, description = ?, scheduled_for = ?, days_of_week = ?,
                 is_active = ?, notified = ?, updated_at = ?
             WHERE id = ?",
            (
                &reminder.title,
                &reminder.description,
                fmt_datetime(&reminder.scheduled_for),
                &reminder.days_of_week,
                reminder.is_active as i32,
                reminder.notified as i32,
                fmt_datetime(&reminder.updated_at),
                id.to_string(),
            ),
        )?;

        Ok(Some(reminder))
    }

    pub fn mark_reminder_notified(&self, id: Uuid) -> Result<bool> {
        let rows = self.lock().execute(
            "UPDATE reminders SET notified = 1, updated_at = ? WHERE id = ?",
            (fmt_datetime(&Utc::now()), id.to_string()),
        )?;
        Ok(rows > 0)
    }

    pub fn delete_reminder(&self, id: Uuid) -> Result<bool> {
        let rows = self
            .lock()
            .execute("DELETE FROM reminders WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }
}
