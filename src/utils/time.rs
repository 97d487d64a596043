// src/utils/time.rs

//! Half-hour slot arithmetic for venue occupancy maps.

/// Parse an "HHMM" time string into minutes since midnight.
fn to_minutes(time: &str) -> Option<u32> {
    if time.len() != 4 || !time.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: u32 = time.get(0..2)?.parse().ok()?;
    let minutes: u32 = time.get(2..4)?.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Format minutes since midnight back into "HHMM".
fn to_time(minutes: u32) -> String {
    format!("{:02}{:02}", minutes / 60, minutes % 60)
}

/// Enumerate the half-hour slots from `start` (inclusive) up to `end`
/// (exclusive).
///
/// `time_range("1830", "2030")` is `["1830", "1900", "1930", "2000"]`.
/// Unparseable or inverted inputs yield an empty range.
pub fn time_range(start: &str, end: &str) -> Vec<String> {
    let (Some(start), Some(end)) = (to_minutes(start), to_minutes(end)) else {
        return Vec::new();
    };

    let mut slots = Vec::new();
    let mut current = start;
    while current < end {
        slots.push(to_time(current));
        current += 30;
    }
    slots
}
