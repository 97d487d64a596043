// src/mapper/lessons.rs

//! Grouping of per-occurrence timetable events into recurring lessons.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::{RawLesson, TimetableLesson};
use crate::services::validation::{lesson_type_name, weekday_name};
use crate::utils::acad;

/// Occurrences of the same recurring lesson share every field of this
/// key. Unrelated sessions that happen to collide on the full key are a
/// known edge case and are not disambiguated further.
fn lesson_key(lesson: &TimetableLesson) -> String {
    [
        lesson.activity.as_deref(),
        lesson.modgrp.as_deref(),
        lesson.day.as_deref(),
        lesson.start_time.as_deref(),
        lesson.end_time.as_deref(),
        lesson.session.as_deref(),
        lesson.room.as_deref(),
    ]
    .map(|field| field.unwrap_or(""))
    .join("|")
}

/// Academic week number of one occurrence. Occurrences on unnumbered
/// weeks count as week 0.
fn event_week(event: &TimetableLesson) -> u32 {
    event
        .eventdate
        .as_deref()
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
        .and_then(acad::acad_week_number)
        .unwrap_or(0)
}

/// Infer the recurrence descriptor for a group of occurrences from
/// their dates alone.
///
/// Exactly 13 occurrences fill a 13-week term; six occurrences spaced
/// two weeks apart alternate weeks; anything else falls back to the
/// literal sorted week list. The fallback is deliberately left as-is
/// for terms with irregular special or makeup sessions.
fn week_text(events: &[&TimetableLesson]) -> String {
    // All 13 weeks
    if events.len() == 13 {
        return "Every Week".to_string();
    }

    let mut weeks: Vec<u32> = events.iter().map(|event| event_week(event)).collect();
    weeks.sort_unstable();

    // A consistent two-week gap over six occurrences means the lesson
    // alternates weeks; the first week's parity says which ones
    let every_second_week = weeks.windows(2).all(|pair| pair[1] - pair[0] == 2);
    if every_second_week && weeks.len() == 6 {
        return if weeks[0] % 2 == 1 {
            "Odd Weeks"
        } else {
            "Even Weeks"
        }
        .to_string();
    }

    weeks
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Collapse per-occurrence timetable events into recurring lessons,
/// one per distinct grouping key, with inferred recurrence text.
pub fn map_timetable_lessons(lessons: &[TimetableLesson]) -> Vec<RawLesson> {
    // Group in first-seen order so output is deterministic
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<&TimetableLesson>> = HashMap::new();
    for lesson in lessons {
        let key = lesson_key(lesson);
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(lesson);
    }

    order
        .iter()
        .filter_map(|key| groups.get(key))
        .map(|events| {
            let first = events[0];
            let activity = first.activity.clone().unwrap_or_default();
            let modgrp = first.modgrp.clone().unwrap_or_default();

            // The group label carries the activity code as a prefix,
            // which is redundant in the class number
            let class_no = if activity.is_empty() {
                modgrp
            } else {
                modgrp.replacen(&activity, "", 1)
            };

            RawLesson {
                class_no,
                // Times come with a ':' delimiter, canonical form has none
                start_time: first.start_time.clone().unwrap_or_default().replace(':', ""),
                end_time: first.end_time.clone().unwrap_or_default().replace(':', ""),
                week_text: week_text(events),
                // Room can be null
                venue: first.room.clone().unwrap_or_default(),
                day_text: first
                    .day
                    .as_deref()
                    .and_then(weekday_name)
                    .unwrap_or_default()
                    .to_string(),
                lesson_type: first
                    .activity
                    .as_deref()
                    .and_then(lesson_type_name)
                    .unwrap_or_default()
                    .to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// An occurrence of a weekly lecture on the Monday of the given
    /// instructional week of AY2018/19 semester 1.
    fn occurrence(week: u32) -> TimetableLesson {
        let date = acad::instructional_week_start(2018, week).unwrap();
        TimetableLesson {
            term: Some("1810".to_string()),
            room: Some("COM1-0208".to_string()),
            numweeks: Some(13),
            start_time: Some("14:00".to_string()),
            end_time: Some("16:00".to_string()),
            activity: Some("L".to_string()),
            modgrp: Some("L1".to_string()),
            csize: Some(200),
            module: Some("CS1010".to_string()),
            eventdate: Some(date.format("%Y-%m-%d").to_string()),
            session: Some("1".to_string()),
            deptfac: Some("00301ACAD1".to_string()),
            day: Some("1".to_string()),
        }
    }

    #[test]
    fn test_thirteen_occurrences_recur_every_week() {
        let events: Vec<_> = (1..=13).map(occurrence).collect();
        let lessons = map_timetable_lessons(&events);

        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].week_text, "Every Week");
    }

    #[test]
    fn test_odd_week_pattern() {
        let events: Vec<_> = [1, 3, 5, 7, 9, 11].map(occurrence).into_iter().collect();
        let lessons = map_timetable_lessons(&events);

        assert_eq!(lessons[0].week_text, "Odd Weeks");
    }

    #[test]
    fn test_even_week_pattern() {
        let events: Vec<_> = [2, 4, 6, 8, 10, 12].map(occurrence).into_iter().collect();
        let lessons = map_timetable_lessons(&events);

        assert_eq!(lessons[0].week_text, "Even Weeks");
    }

    #[test]
    fn test_irregular_pattern_falls_back_to_week_list() {
        let events: Vec<_> = [1, 2, 3, 7, 13].map(occurrence).into_iter().collect();
        let lessons = map_timetable_lessons(&events);

        assert_eq!(lessons[0].week_text, "1,2,3,7,13");
    }

    #[test]
    fn test_two_week_gaps_without_six_occurrences_fall_back() {
        let events: Vec<_> = [1, 3, 5].map(occurrence).into_iter().collect();
        let lessons = map_timetable_lessons(&events);

        assert_eq!(lessons[0].week_text, "1,3,5");
    }

    #[test]
    fn test_field_mapping() {
        let lessons = map_timetable_lessons(&[occurrence(1)]);
        let lesson = &lessons[0];

        assert_eq!(lesson.class_no, "1");
        assert_eq!(lesson.start_time, "1400");
        assert_eq!(lesson.end_time, "1600");
        assert_eq!(lesson.venue, "COM1-0208");
        assert_eq!(lesson.day_text, "Monday");
        assert_eq!(lesson.lesson_type, "Lecture");
    }

    #[test]
    fn test_null_room_becomes_empty_venue() {
        let mut event = occurrence(1);
        event.room = None;
        let lessons = map_timetable_lessons(&[event]);

        assert_eq!(lessons[0].venue, "");
    }

    #[test]
    fn test_distinct_groups_stay_separate() {
        let mut tutorial = occurrence(1);
        tutorial.activity = Some("T".to_string());
        tutorial.modgrp = Some("T03".to_string());
        tutorial.room = Some("COM1-0113".to_string());

        let lessons = map_timetable_lessons(&[occurrence(1), tutorial, occurrence(2)]);

        assert_eq!(lessons.len(), 2);
        assert_eq!(lessons[0].lesson_type, "Lecture");
        assert_eq!(lessons[0].week_text, "1,2");
        assert_eq!(lessons[1].class_no, "03");
        assert_eq!(lessons[1].lesson_type, "Tutorial");
    }
}
