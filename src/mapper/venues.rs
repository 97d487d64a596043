// src/mapper/venues.rs

//! Conversion of module timetables into per-venue occupancy grids.

use std::collections::HashMap;

use crate::models::{DayAvailability, OCCUPIED, RawLesson, VenueAvailability, VenueLesson};
use crate::utils::time::time_range;

/// Convert one module's timetable into venue availability.
///
/// Lessons without a venue are dropped; the rest are grouped by venue
/// and then by day, with every half-hour slot from a lesson's start up
/// to its end marked occupied. Venues never appear with an empty lesson
/// list.
pub fn extract_venue_availability(
    module_code: &str,
    timetable: &[RawLesson],
) -> VenueAvailability {
    // 1. Only include lessons that actually have a venue
    // 2. Map lessons to the venue they're in
    let mut by_venue: VenueAvailability = VenueAvailability::new();
    let mut day_groups: HashMap<String, Vec<Vec<&RawLesson>>> = HashMap::new();
    let mut day_index: HashMap<(String, String), usize> = HashMap::new();

    for lesson in timetable {
        if lesson.venue.is_empty() {
            continue;
        }

        // 3. Group by day within the venue, in first-seen order
        let groups = day_groups.entry(lesson.venue.clone()).or_default();
        let slot = *day_index
            .entry((lesson.venue.clone(), lesson.day_text.clone()))
            .or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
        groups[slot].push(lesson);
    }

    for (venue, groups) in day_groups {
        let days = groups
            .into_iter()
            .map(|day_lessons| {
                // 4. Inject the module code and strip the venue
                let classes = day_lessons
                    .iter()
                    .map(|lesson| VenueLesson {
                        module_code: module_code.to_string(),
                        class_no: lesson.class_no.clone(),
                        start_time: lesson.start_time.clone(),
                        end_time: lesson.end_time.clone(),
                        week_text: lesson.week_text.clone(),
                        day_text: lesson.day_text.clone(),
                        lesson_type: lesson.lesson_type.clone(),
                    })
                    .collect();

                // 5. Mark the time between lesson start and end occupied
                let mut availability = std::collections::BTreeMap::new();
                for lesson in &day_lessons {
                    for slot in time_range(&lesson.start_time, &lesson.end_time) {
                        availability.insert(slot, OCCUPIED.to_string());
                    }
                }

                DayAvailability {
                    day: day_lessons[0].day_text.clone(),
                    classes,
                    availability,
                }
            })
            .collect();

        by_venue.insert(venue, days);
    }

    by_venue
}

/// Merge per-module availability maps into one semester-wide map.
///
/// Day entries for the same venue and day are combined: their class
/// lists concatenate in ingestion order and their occupancy maps union.
pub fn merge_venue_availability(
    maps: impl IntoIterator<Item = VenueAvailability>,
) -> VenueAvailability {
    let mut merged = VenueAvailability::new();

    for map in maps {
        for (venue, days) in map {
            let existing = merged.entry(venue).or_default();
            for day in days {
                match existing.iter_mut().find(|d| d.day == day.day) {
                    Some(slot) => {
                        slot.classes.extend(day.classes);
                        slot.availability.extend(day.availability);
                    }
                    None => existing.push(day),
                }
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(venue: &str, day: &str, start: &str, end: &str) -> RawLesson {
        RawLesson {
            class_no: "1".to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            week_text: "Every Week".to_string(),
            venue: venue.to_string(),
            day_text: day.to_string(),
            lesson_type: "Lecture".to_string(),
        }
    }

    #[test]
    fn test_single_lesson_occupancy() {
        let availability = extract_venue_availability(
            "CS3216",
            &[lesson("COM1-VCRM", "Monday", "1830", "2030")],
        );

        assert_eq!(availability.len(), 1);
        let days = &availability["COM1-VCRM"];
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].day, "Monday");

        assert_eq!(days[0].classes.len(), 1);
        assert_eq!(days[0].classes[0].module_code, "CS3216");

        let slots: Vec<&str> = days[0].availability.keys().map(String::as_str).collect();
        assert_eq!(slots, vec!["1830", "1900", "1930", "2000"]);
        assert!(days[0].availability.values().all(|v| v == OCCUPIED));
    }

    #[test]
    fn test_lesson_without_venue_is_dropped() {
        let availability =
            extract_venue_availability("CS3216", &[lesson("", "Monday", "1830", "2030")]);
        assert!(availability.is_empty());
    }

    #[test]
    fn test_days_grouped_within_venue() {
        let availability = extract_venue_availability(
            "CS2100",
            &[
                lesson("COM1-0208", "Monday", "0900", "1000"),
                lesson("COM1-0208", "Wednesday", "0900", "1000"),
                lesson("COM1-0208", "Monday", "1400", "1500"),
            ],
        );

        let days = &availability["COM1-0208"];
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].day, "Monday");
        assert_eq!(days[0].classes.len(), 2);
        assert_eq!(
            days[0].availability.keys().collect::<Vec<_>>(),
            vec!["0900", "0930", "1400", "1430"]
        );
        assert_eq!(days[1].day, "Wednesday");
        assert_eq!(days[1].classes.len(), 1);
    }

    #[test]
    fn test_merge_combines_shared_venues_and_days() {
        let first = extract_venue_availability(
            "CS1010",
            &[lesson("COM1-0208", "Monday", "0900", "1000")],
        );
        let second = extract_venue_availability(
            "CS2100",
            &[
                lesson("COM1-0208", "Monday", "1400", "1500"),
                lesson("LT19", "Tuesday", "1000", "1100"),
            ],
        );

        let merged = merge_venue_availability([first, second]);

        assert_eq!(merged.len(), 2);
        let monday = &merged["COM1-0208"][0];
        assert_eq!(monday.classes.len(), 2);
        assert_eq!(monday.classes[0].module_code, "CS1010");
        assert_eq!(monday.classes[1].module_code, "CS2100");
        assert!(monday.availability.contains_key("0900"));
        assert!(monday.availability.contains_key("1400"));
    }

    #[test]
    fn test_multiple_venues() {
        let availability = extract_venue_availability(
            "CS2100",
            &[
                lesson("COM1-0208", "Monday", "0900", "1000"),
                lesson("LT19", "Tuesday", "1000", "1200"),
            ],
        );

        assert_eq!(availability.len(), 2);
        assert!(availability.contains_key("COM1-0208"));
        assert!(availability.contains_key("LT19"));
    }
}
