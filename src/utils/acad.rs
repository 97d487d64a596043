// src/utils/acad.rs

//! Academic calendar arithmetic.
//!
//! The academic year starts on the first Monday of August. Week numbers
//! within a semester skip the recess week (between instructional weeks 6
//! and 7) and stop counting through reading and examination weeks.
//! Week-recurrence inference only needs the instructional week number of
//! a date, so that is all this module exposes.

use chrono::{Datelike, Duration, NaiveDate};

/// First Monday of August for the given calendar year, i.e. the start of
/// the academic year beginning in that year.
pub fn acad_year_start(year: i32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, 8, 1)?;
    let days_to_monday = (7 - first.weekday().num_days_from_monday()) % 7;
    Some(first + Duration::days(i64::from(days_to_monday)))
}

/// Start date of the academic year containing `date`.
fn acad_year_start_for(date: NaiveDate) -> Option<NaiveDate> {
    let start = acad_year_start(date.year())?;
    if date < start {
        acad_year_start(date.year() - 1)
    } else {
        Some(start)
    }
}

/// Instructional week number of `date` within its semester, or `None`
/// for weeks that carry no number (orientation, recess, reading).
///
/// Semester 2 starts 22 weeks after week 1 of semester 1; the special
/// terms follow in weeks 41-52 of the academic year.
pub fn acad_week_number(date: NaiveDate) -> Option<u32> {
    let start = acad_year_start_for(date)?;
    let mut week = (date - start).num_days() / 7 + 1;

    if week > 52 {
        return None;
    }

    // Special terms: term I spans weeks 41-46, term II weeks 47-52
    if week > 46 {
        return u32::try_from(week - 46).ok();
    }
    if week > 40 {
        return u32::try_from(week - 40).ok();
    }

    // Semester 2 starts 22 weeks after week 1 of semester 1
    if week > 23 {
        week -= 22;
    }

    match week {
        // Orientation week
        1 => None,
        // Vacation after the semester
        w if w > 18 => u32::try_from(w - 18).ok(),
        w => {
            let sem_week = w - 1;
            match sem_week {
                7 => None,  // recess
                15 => None, // reading
                16 | 17 => u32::try_from(sem_week - 15).ok(),
                s if s >= 8 => u32::try_from(s - 1).ok(),
                s => u32::try_from(s).ok(),
            }
        }
    }
}

/// Date of the Monday of the given instructional week in semester 1 of
/// the academic year starting in `year`. Inverse of `acad_week_number`
/// for instructional weeks; mainly useful for constructing test data.
pub fn instructional_week_start(year: i32, week: u32) -> Option<NaiveDate> {
    let start = acad_year_start(year)?;
    // Week 1 is the second week of the academic year; recess pushes
    // weeks 7 and up back by one more
    let acad_week = if week >= 7 { week + 2 } else { week + 1 };
    Some(start + Duration::weeks(i64::from(acad_week) - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_acad_year_start_is_first_monday_of_august() {
        assert_eq!(acad_year_start(2018), Some(date(2018, 8, 6)));
        assert_eq!(acad_year_start(2016), Some(date(2016, 8, 1)));
        assert_eq!(acad_year_start(2019), Some(date(2019, 8, 5)));
    }

    #[test]
    fn test_week_numbers_before_recess() {
        // AY2018/19 starts 2018-08-06; week 1 of semester 1 is the
        // following week
        assert_eq!(acad_week_number(date(2018, 8, 13)), Some(1));
        assert_eq!(acad_week_number(date(2018, 8, 24)), Some(2));
        assert_eq!(acad_week_number(date(2018, 9, 10)), Some(5));
    }

    #[test]
    fn test_recess_week_has_no_number() {
        // Instructional week 6 ends 2018-09-23; recess follows
        assert_eq!(acad_week_number(date(2018, 9, 17)), Some(6));
        assert_eq!(acad_week_number(date(2018, 9, 24)), None);
        assert_eq!(acad_week_number(date(2018, 10, 1)), Some(7));
    }

    #[test]
    fn test_orientation_week_has_no_number() {
        assert_eq!(acad_week_number(date(2018, 8, 6)), None);
    }

    #[test]
    fn test_semester_two_weeks() {
        // Semester 2 week 1 begins 22 weeks after semester 1 week 1
        let sem2_week1 = date(2018, 8, 13) + Duration::weeks(22);
        assert_eq!(acad_week_number(sem2_week1), Some(1));
        assert_eq!(acad_week_number(sem2_week1 + Duration::weeks(3)), Some(4));
    }

    #[test]
    fn test_instructional_week_start_round_trips() {
        for week in 1..=13 {
            let monday = instructional_week_start(2018, week).unwrap();
            assert_eq!(acad_week_number(monday), Some(week), "week {week}");
        }
    }
}
