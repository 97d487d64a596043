// src/models/venue.rs

//! Per-venue occupancy records derived from module timetables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Marker stored in occupancy maps for a taken half-hour slot.
pub const OCCUPIED: &str = "occupied";

/// A lesson as seen from a venue: module code injected, venue stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VenueLesson {
    pub module_code: String,

    pub class_no: String,

    pub start_time: String,

    pub end_time: String,

    pub week_text: String,

    pub day_text: String,

    pub lesson_type: String,
}

/// The lessons held at one venue on one day, with a half-hour occupancy
/// map covering them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DayAvailability {
    pub day: String,

    pub classes: Vec<VenueLesson>,

    /// Slot ("HHMM") to occupancy marker. Slots without lessons are
    /// simply absent.
    pub availability: BTreeMap<String, String>,
}

/// Venue name to its per-day occupancy. Never contains a venue with an
/// empty day list.
pub type VenueAvailability = BTreeMap<String, Vec<DayAvailability>>;
