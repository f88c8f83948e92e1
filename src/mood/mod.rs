//! Mood scoring.
//!
//! Two scales live side by side:
//!
//! - the 0–10 integer rating users enter by hand, bucketed for display by
//!   [`scale::MoodLevel`];
//! - the 0.0–1.0 score produced by text and music analysis, named by
//!   [`engine::MoodType`] and fed into plant growth.

pub mod engine;
pub mod scale;
pub mod sentiment;

pub use engine::*;
pub use scale::*;
pub use sentiment::*;

/// Round to a fixed number of decimal places.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
