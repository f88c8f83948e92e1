//! Domain models for PlantPal.
//!
//! # Records
//!
//! - [`User`]: owner of everything else; deleting one removes their data.
//! - [`MoodEntry`]: a 0–10 rating, entered by hand or derived from a journal entry.
//! - [`JournalEntry`]: free text, scored for sentiment when written.
//! - [`Plant`] and [`PlantLog`]: the virtual plant and its care history.
//! - [`Reminder`]: a scheduled nudge, optionally tied to a plant.
//!
//! # Derived
//!
//! - [`ProfileStats`]: per-user aggregate, never persisted.

mod journal;
mod mood;
mod plant;
mod profile;
mod reminder;
mod user;

pub use journal::*;
pub use mood::*;
pub use plant::*;
pub use profile::*;
pub use reminder::*;
pub use user::*;
