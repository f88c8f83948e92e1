use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{fmt_datetime, parse_datetime, parse_opt_datetime, parse_uuid, Database};
use crate::error::ValidationError;
use crate::growth::{self, CareAction};
use crate::models::*;

const PLANT_COLUMNS: &str = "id, user_id, name, species, description, growth_level, health, health_status, \
     last_watered, last_fertilized, last_music_boost, total_music_minutes, created_at, updated_at";

const LOG_COLUMNS: &str = "id, plant_id, activity, note, value, growth_impact, created_at";

fn row_to_plant(row: &Row) -> rusqlite::Result<Plant> {
    let health: f64 = row.get(6)?;
    Ok(Plant {
        id: parse_uuid(row.get(0)?),
        user_id: parse_uuid(row.get(1)?),
        name: row.get(2)?,
        species: row.get(3)?,
        description: row.get(4)?,
        growth_level: row.get(5)?,
        health,
        health_status: HealthStatus::from_str(&row.get::<_, String>(7)?)
            .unwrap_or_else(|| HealthStatus::from_health(health)),
        last_watered: parse_opt_datetime(row.get(8)?),
        last_fertilized: parse_opt_datetime(row.get(9)?),
        last_music_boost: parse_opt_datetime(row.get(10)?),
        total_music_minutes: row.get(11)?,
        created_at: parse_datetime(row.get(12)?),
        updated_at: parse_datetime(row.get(13)?),
    })
}

fn row_to_log(row: &Row) -> rusqlite::Result<PlantLog> {
    Ok(PlantLog {
        id: parse_uuid(row.get(0)?),
        plant_id: parse_uuid(row.get(1)?),
        activity: PlantActivity::from_str(&row.get::<_, String>(2)?)
            .unwrap_or(PlantActivity::Watered),
        note: row.get(3)?,
        value: row.get(4)?,
        growth_impact: row.get(5)?,
        created_at: parse_datetime(row.get(6)?),
    })
}

fn select_plant(conn: &Connection, id: Uuid) -> Result<Option<Plant>> {
    let plant = conn
        .query_row(
            &format!("SELECT {PLANT_COLUMNS} FROM plants WHERE id = ?"),
            [id.to_string()],
            row_to_plant,
        )
        .optional()?;
    Ok(plant)
}

pub(super) fn select_plants_by_user(conn: &Connection, user_id: Uuid) -> Result<Vec<Plant>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PLANT_COLUMNS} FROM plants WHERE user_id = ? ORDER BY created_at DESC, rowid DESC"
    ))?;
    let plants = stmt
        .query_map([user_id.to_string()], row_to_plant)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(plants)
}

/// Persist a plant's new growth state together with the log entry explaining it.
pub(super) fn write_plant_change(conn: &Connection, plant: &Plant, log: &PlantLog) -> Result<()> {
    conn.execute(
        "UPDATE plants SET growth_level = ?, health = ?, health_status = ?, last_watered = ?,
             last_fertilized = ?, last_music_boost = ?, total_music_minutes = ?, updated_at = ?
         WHERE id = ?",
        (
            plant.growth_level,
            plant.health,
            plant.health_status.as_str(),
            plant.last_watered.as_ref().map(fmt_datetime),
            plant.last_fertilized.as_ref().map(fmt_datetime),
            plant.last_music_boost.as_ref().map(fmt_datetime),
            plant.total_music_minutes,
            fmt_datetime(&plant.updated_at),
            plant.id.to_string(),
        ),
    )?;

    conn.execute(
        "INSERT INTO plant_logs (id, plant_id, activity, note, value, growth_impact, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        (
            log.id.to_string(),
            log.plant_id.to_string(),
            log.activity.as_str(),
            &log.note,
            log.value,
            log.growth_impact,
            fmt_datetime(&log.created_at),
        ),
    )?;

    Ok(())
}

impl Database {
    pub fn create_plant(&self, user_id: Uuid, input: CreatePlantInput) -> Result<Plant> {
        if input.name.trim().is_empty() {
            return Err(ValidationError::invalid("plant name must not be empty").into());
        }
        self.require_user(user_id)?;

        let id = Uuid::new_v4();
        let now = Utc::now();
        let species = input
            .species
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SPECIES.to_string());
        let health = MAX_HEALTH;
        let status = HealthStatus::from_health(health);

        self.lock().execute(
            "INSERT INTO plants (id, user_id, name, species, description, growth_level, health, health_status,
                                 total_music_minutes, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)",
            (
                id.to_string(),
                user_id.to_string(),
                &input.name,
                &species,
                &input.description,
                MIN_GROWTH_LEVEL,
                health,
                status.as_str(),
                fmt_datetime(&now),
                fmt_datetime(&now),
            ),
        )?;

        tracing::info!("Planted {} ({}) for user {}", input.name, species, user_id);

        Ok(Plant {
            id,
            user_id,
            name: input.name,
            species,
            description: input.description,
            growth_level: MIN_GROWTH_LEVEL,
            health,
            health_status: status,
            last_watered: None,
            last_fertilized: None,
            last_music_boost: None,
            total_music_minutes: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_plant(&self, id: Uuid) -> Result<Option<Plant>> {
        select_plant(&self.lock(), id)
    }

    pub fn get_plants_by_user(&self, user_id: Uuid) -> Result<Vec<Plant>> {
        select_plants_by_user(&self.lock(), user_id)
    }

    pub fn update_plant(&self, id: Uuid, input: UpdatePlantInput) -> Result<Option<Plant>> {
        let Some(mut plant) = self.get_plant(id)? else {
            return Ok(None);
        };

        if let Some(name) = input.name {
            if name.trim().is_empty() {
                return Err(ValidationError::invalid("plant name must not be empty").into());
            }
            plant.name = name;
        }
        if let Some(species) = input.species.filter(|s| !s.trim().is_empty()) {
            plant.species = species;
        }
        if input.description.is_some() {
            plant.description = input.description;
        }
        plant.updated_at = Utc::now();

        self.lock().execute(
            "UPDATE plants SET name = ?, species = ?, description = ?, updated_at = ? WHERE id = ?",
            (
                &plant.name,
                &plant.species,
                &plant.description,
                fmt_datetime(&plant.updated_at),
                id.to_string(),
            ),
        )?;

        Ok(Some(plant))
    }

    pub fn delete_plant(&self, id: Uuid) -> Result<bool> {
        let rows = self
            .lock()
            .execute("DELETE FROM plants WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    pub fn care_for_plant(&self, id: Uuid, action: CareAction) -> Result<Option<PlantUpdate>> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let Some(plant) = select_plant(&tx, id)? else {
            return Ok(None);
        };

        let (plant, log) = growth::care(plant, action, Utc::now());
        write_plant_change(&tx, &plant, &log)?;
        tx.commit()?;

        tracing::debug!(
            "Plant {} {}: health {:.1}",
            plant.id,
            log.activity.as_str(),
            plant.health
        );
        Ok(Some(PlantUpdate { plant, log }))
    }

    /// Apply a listening session, weighted by the owner's `music_mood_weight`.
    pub fn play_music_for_plant(
        &self,
        id: Uuid,
        session: MusicSessionInput,
    ) -> Result<Option<PlantUpdate>> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let Some(plant) = select_plant(&tx, id)? else {
            return Ok(None);
        };
        let weight: f64 = tx
            .query_row(
                "SELECT music_mood_weight FROM users WHERE id = ?",
                [plant.user_id.to_string()],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(ValidationError::NotFound("User"))?;

        let (plant, log) = growth::music_effect(plant, weight, &session, Utc::now());
        write_plant_change(&tx, &plant, &log)?;
        tx.commit()?;

        tracing::debug!(
            "Plant {} music boost: health {:.1}, {} minutes total",
            plant.id,
            plant.health,
            plant.total_music_minutes
        );
        Ok(Some(PlantUpdate { plant, log }))
    }

    pub fn apply_plant_change(&self, plant: Plant, log: PlantLog) -> Result<PlantUpdate> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        write_plant_change(&tx, &plant, &log)?;
        tx.commit()?;

        tracing::debug!(
            "Plant {} {}: health {:.1}, level {}",
            plant.id,
            log.activity.as_str(),
            plant.health,
            plant.growth_level
        );

        Ok(PlantUpdate { plant, log })
    }

    /// Care history for a plant, newest first.
    pub fn get_plant_logs(&self, plant_id: Uuid) -> Result<Vec<PlantLog>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {LOG_COLUMNS} FROM plant_logs WHERE plant_id = ? ORDER BY created_at DESC, rowid DESC"
        ))?;
        let logs = stmt
            .query_map([plant_id.to_string()], row_to_log)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }
}
