//! Rules for how care, music and mood change a plant.
//!
//! Everything here is pure: functions take the current plant and return the
//! new state plus the log entry to record. Persisting both is the caller's job
//! (see `Database::apply_plant_change`).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::*;

/// Health gained from a watering.
pub const WATER_HEALTH: f64 = 5.0;
/// Health gained from fertilizing.
pub const FERTILIZE_HEALTH: f64 = 3.0;
/// Journal mood weight in the plant health formula.
pub const JOURNAL_MOOD_WEIGHT: f64 = 0.4;

const GROWTH_HEALTH_THRESHOLD: f64 = 80.0;

impl HealthStatus {
    pub fn from_health(health: f64) -> Self {
        if health >= 80.0 {
            Self::Excellent
        } else if health >= 60.0 {
            Self::Good
        } else if health >= 40.0 {
            Self::Fair
        } else if health >= 20.0 {
            Self::Poor
        } else {
            Self::Critical
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CareAction {
    Water,
    Fertilize,
}

fn clamp_health(health: f64) -> f64 {
    health.clamp(0.0, MAX_HEALTH)
}

fn new_log(
    plant: &Plant,
    activity: PlantActivity,
    note: String,
    value: f64,
    impact: f64,
    now: DateTime<Utc>,
) -> PlantLog {
    PlantLog {
        id: Uuid::new_v4(),
        plant_id: plant.id,
        activity,
        note: Some(note),
        value,
        growth_impact: impact,
        created_at: now,
    }
}

fn finish(mut plant: Plant, now: DateTime<Utc>) -> Plant {
    plant.health = clamp_health(plant.health);
    plant.health_status = HealthStatus::from_health(plant.health);
    plant.updated_at = now;
    plant
}

pub fn care(mut plant: Plant, action: CareAction, now: DateTime<Utc>) -> (Plant, PlantLog) {
    let before = plant.health;
    let (activity, gain) = match action {
        CareAction::Water => {
            plant.last_watered = Some(now);
            (PlantActivity::Watered, WATER_HEALTH)
        }
        CareAction::Fertilize => {
            plant.last_fertilized = Some(now);
            (PlantActivity::Fertilized, FERTILIZE_HEALTH)
        }
    };
    plant.health += gain;
    let plant = finish(plant, now);

    let log = new_log(
        &plant,
        activity,
        format!("{} {}", plant.name, activity.as_str()),
        gain,
        plant.health - before,
        now,
    );
    (plant, log)
}

/// Apply a listening session.
///
/// Health moves by `(mood_score - 0.5) * 20 * weight`, plus up to five bonus
/// points for time spent listening. A plant that reaches 80 health grows a
/// level and gives back some health for it.
pub fn music_effect(
    mut plant: Plant,
    weight: f64,
    session: &MusicSessionInput,
    now: DateTime<Utc>,
) -> (Plant, PlantLog) {
    let mood_score = session.mood_score.clamp(0.0, 1.0);
    let base = (mood_score - 0.5) * 20.0 * weight;
    let time_bonus = (session.minutes as f64 * 0.5).min(5.0);
    let effect = base + time_bonus;

    plant.health = clamp_health(plant.health + effect);
    plant.total_music_minutes += session.minutes as i64;
    plant.last_music_boost = Some(now);

    if plant.health >= GROWTH_HEALTH_THRESHOLD && plant.growth_level < MAX_GROWTH_LEVEL {
        plant.growth_level += 1;
        plant.health = (plant.health - 10.0).max(70.0);
    }

    let plant = finish(plant, now);
    let log = new_log(
        &plant,
        PlantActivity::MusicBoost,
        format!(
            "Music mood: {:.2}, Minutes: {}",
            mood_score, session.minutes
        ),
        mood_score,
        effect,
        now,
    );
    (plant, log)
}

/// Apply the mood of a journal entry (0.0–1.0).
pub fn mood_effect(mut plant: Plant, mood_score: f64, now: DateTime<Utc>) -> (Plant, PlantLog) {
    let mood_score = mood_score.clamp(0.0, 1.0);
    let impact = mood_score * JOURNAL_MOOD_WEIGHT;

    plant.health = clamp_health(plant.health + impact * 20.0);
    if mood_score > 0.6 && plant.growth_level < MAX_GROWTH_LEVEL {
        plant.growth_level += 1;
    }

    let plant = finish(plant, now);
    let log = new_log(
        &plant,
        PlantActivity::Journal,
        "Mood update from journal".to_string(),
        mood_score,
        impact,
        now,
    );
    (plant, log)
}
