//! PlantPal: a wellness companion server.
//!
//! Users log moods and journal entries; a virtual plant grows (or wilts) with
//! them. Shared plant state lives in a small JSON document store that
//! clients can subscribe to for live updates.

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod docstore;
pub mod error;
pub mod growth;
pub mod models;
pub mod mood;
pub mod reminders;
