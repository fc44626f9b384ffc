//! Read-time aggregation of derived rating values.
//!
//! Both backends feed the same pure functions, so the derived values can
//! never diverge between adapters. Results are computed on every read and
//! never persisted, so they always reflect the latest underlying rows.

use crate::model::RatingMode;

/// Effective overall rating of a place.
///
/// In `Overall` mode this is the manual value verbatim (which may be
/// absent). `Aggregate` mode is reserved for future visit-level rating
/// wiring: visits carry no rating today, and the store does not roll dish
/// ratings into a place rating on its own — that computation, if wanted,
/// belongs to the caller.
pub fn place_rating(mode: RatingMode, manual: Option<f64>) -> Option<f64> {
    match mode {
        RatingMode::Overall => manual,
        RatingMode::Aggregate => None,
    }
}

/// Overall rating of a list: the mean of the ratings of its attached
/// places, skipping places with no rating. Absent when no attached place
/// has one.
pub fn list_rating(place_ratings: &[Option<f64>]) -> Option<f64> {
    let rated: Vec<f64> = place_ratings.iter().filter_map(|r| *r).collect();
    if rated.is_empty() {
        None
    } else {
        Some(rated.iter().sum::<f64>() / rated.len() as f64)
    }
}
