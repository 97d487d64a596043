// src/services/validation.rs

//! Schema validation for raw upstream records.
//!
//! Validators never fail the program: they return a [`Validation`]
//! report listing every violated constraint, and the caller decides
//! whether to drop, log or abort. Required fields are strict; unknown
//! extra fields are tolerated at the deserialization layer.

use chrono::NaiveDate;

use crate::models::{ModuleExam, Semester, TimetableLesson};

/// One violated constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

/// Outcome of validating one record.
#[derive(Debug, Clone, Default)]
pub struct Validation {
    violations: Vec<Violation>,
}

impl Validation {
    /// True if the record satisfied every constraint.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Every constraint the record violated.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    fn check(&mut self, ok: bool, field: &'static str, message: impl Into<String>) {
        if !ok {
            self.violations.push(Violation {
                field,
                message: message.into(),
            });
        }
    }
}

/// Weekday name for an upstream day code. Sunday has no code: lessons
/// on Sunday are always invalid.
pub fn weekday_name(code: &str) -> Option<&'static str> {
    match code {
        "1" => Some("Monday"),
        "2" => Some("Tuesday"),
        "3" => Some("Wednesday"),
        "4" => Some("Thursday"),
        "5" => Some("Friday"),
        "6" => Some("Saturday"),
        _ => None,
    }
}

/// Lesson type name for an upstream activity code.
pub fn lesson_type_name(code: &str) -> Option<&'static str> {
    match code {
        // Recognized by the site frontend
        "B" => Some("Laboratory"),
        "L" => Some("Lecture"),
        "D" => Some("Design Lecture"),
        "R" => Some("Recitation"),
        "P" => Some("Packaged Lecture"),
        "X" => Some("Packaged Tutorial"),
        "W" => Some("Workshop"),
        "E" => Some("Seminar-Style Module Class"),
        "S" => Some("Sectional Teaching"),
        "T" => Some("Tutorial"),
        "2" => Some("Tutorial Type 2"),
        "3" => Some("Tutorial Type 3"),

        // Not recognized by the site frontend
        "4" => Some("Tutorial Type 4"),
        "5" => Some("Tutorial Type 5"),
        "6" => Some("Tutorial Type 6"),
        "7" => Some("Tutorial Type 7"),
        "8" => Some("Tutorial Type 8"),
        "9" => Some("Tutorial Type 9"),
        "A" => Some("Supervision of Academic Exercise"),
        "O" => Some("Others"),
        "V" => Some("Lecture On Demand"),
        "I" => Some("Independent Study Module"),
        "C" => Some("Bedside Tutorial"),
        "M" => Some("Ensemble Teaching"),
        "J" => Some("Mini-Project"),
        _ => None,
    }
}

/// Validate one timetable event record.
pub fn validate_lesson(lesson: &TimetableLesson) -> Validation {
    let mut report = Validation::default();

    report.check(
        lesson.start_time.is_some(),
        "start_time",
        "start time is required",
    );
    report.check(lesson.end_time.is_some(), "end_time", "end time is required");
    if let (Some(start), Some(end)) = (&lesson.start_time, &lesson.end_time) {
        report.check(
            start != end,
            "end_time",
            "start and end time must differ",
        );
    }

    let valid_date = lesson
        .eventdate
        .as_deref()
        .is_some_and(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok());
    report.check(valid_date, "eventdate", "event date must be a valid date");

    let known_activity = lesson
        .activity
        .as_deref()
        .is_some_and(|code| lesson_type_name(code).is_some());
    report.check(known_activity, "activity", "unknown lesson type code");

    report.check(lesson.modgrp.is_some(), "modgrp", "group label is required");

    let known_day = lesson
        .day
        .as_deref()
        .is_some_and(|code| weekday_name(code).is_some());
    report.check(known_day, "day", "unknown weekday code");

    report.check(
        lesson.numweeks.is_some_and(|weeks| weeks > 0),
        "numweeks",
        "week count must be a positive integer",
    );
    report.check(
        lesson.csize.is_some_and(|size| size >= 0),
        "csize",
        "class size must be non-negative",
    );

    report
}

/// Validate one exam record.
pub fn validate_exam(exam: &ModuleExam) -> Validation {
    let mut report = Validation::default();

    report.check(
        exam.start_time.is_some(),
        "start_time",
        "start time is required",
    );
    report.check(exam.module.is_some(), "module", "module code is required");
    report.check(
        exam.exam_date.is_some(),
        "exam_date",
        "exam date is required",
    );
    report.check(
        exam.duration.is_some_and(|minutes| minutes > 0),
        "duration",
        "duration must be a positive integer",
    );

    report
}

/// Coerce a JSON value to a valid semester number, if it is one.
pub fn parse_semester(value: &serde_json::Value) -> Option<Semester> {
    let semester = match value {
        serde_json::Value::Number(n) => Semester::try_from(n.as_i64()?).ok()?,
        serde_json::Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };

    (1..=4).contains(&semester).then_some(semester)
}

/// Validate that a value coerces to a semester number.
pub fn validate_semester(value: &serde_json::Value) -> bool {
    parse_semester(value).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn valid_lesson() -> TimetableLesson {
        TimetableLesson {
            term: Some("1810".to_string()),
            room: Some("S16-0436".to_string()),
            numweeks: Some(13),
            start_time: Some("14:00".to_string()),
            end_time: Some("15:00".to_string()),
            activity: Some("R".to_string()),
            modgrp: Some("R05".to_string()),
            csize: Some(50),
            module: Some("CS1010S".to_string()),
            eventdate: Some("2018-08-24".to_string()),
            session: Some("1".to_string()),
            deptfac: Some("00301ACAD1".to_string()),
            day: Some("5".to_string()),
        }
    }

    #[test]
    fn test_valid_lesson_passes() {
        assert!(validate_lesson(&valid_lesson()).is_valid());
    }

    #[test]
    fn test_null_room_is_allowed() {
        let lesson = TimetableLesson {
            room: None,
            ..valid_lesson()
        };
        assert!(validate_lesson(&lesson).is_valid());
    }

    #[test]
    fn test_null_day_is_rejected() {
        let lesson = TimetableLesson {
            day: None,
            ..valid_lesson()
        };
        let report = validate_lesson(&lesson);
        assert!(!report.is_valid());
        assert!(report.violations().iter().any(|v| v.field == "day"));
    }

    #[test]
    fn test_sunday_equivalent_day_is_rejected() {
        let lesson = TimetableLesson {
            day: Some("7".to_string()),
            ..valid_lesson()
        };
        assert!(!validate_lesson(&lesson).is_valid());
    }

    #[test]
    fn test_zero_class_size_is_valid() {
        let lesson = TimetableLesson {
            csize: Some(0),
            ..valid_lesson()
        };
        assert!(validate_lesson(&lesson).is_valid());
    }

    #[test]
    fn test_equal_start_and_end_time_rejected() {
        let lesson = TimetableLesson {
            start_time: Some("12:00".to_string()),
            end_time: Some("12:00".to_string()),
            ..valid_lesson()
        };
        let report = validate_lesson(&lesson);
        assert!(
            report
                .violations()
                .iter()
                .any(|v| v.message.contains("must differ"))
        );
    }

    #[test]
    fn test_invalid_lesson_reports_every_violation() {
        let lesson = TimetableLesson {
            numweeks: Some(0),
            start_time: None,
            end_time: None,
            eventdate: None,
            day: None,
            ..valid_lesson()
        };
        let report = validate_lesson(&lesson);
        assert!(!report.is_valid());
        let fields: Vec<_> = report.violations().iter().map(|v| v.field).collect();
        assert!(fields.contains(&"start_time"));
        assert!(fields.contains(&"eventdate"));
        assert!(fields.contains(&"numweeks"));
        assert!(fields.contains(&"day"));
    }

    #[test]
    fn test_validate_exam() {
        let exam = ModuleExam {
            term: Some("1810".to_string()),
            module: Some("CS2100".to_string()),
            exam_date: Some("2018-11-27".to_string()),
            start_time: Some("09:00".to_string()),
            end_time: Some("11:00".to_string()),
            duration: Some(120),
            acad_org: Some("00301".to_string()),
        };
        assert!(validate_exam(&exam).is_valid());

        let no_start = ModuleExam {
            start_time: None,
            duration: Some(0),
            ..exam
        };
        let report = validate_exam(&no_start);
        assert!(!report.is_valid());
        assert_eq!(report.violations().len(), 2);
    }

    #[test]
    fn test_validate_semester_coercion() {
        assert!(validate_semester(&json!(1)));
        assert!(validate_semester(&json!(4)));
        assert!(validate_semester(&json!("2")));
        assert!(!validate_semester(&json!(5)));
        assert!(!validate_semester(&json!(0)));
        assert!(!validate_semester(&json!("junk")));
        assert!(!validate_semester(&json!(null)));
    }
}
