//! Proleptic Gregorian calendar arithmetic used by recurrence expansion.
//!
//! Dates come from `chrono::NaiveDate`; only the week-start relative
//! numbering is computed here. Day-of-year values are zero-based.

use chrono::{Datelike, NaiveDate};

use super::Weekday;

/// Days from 0001-01-01 (day 1 of the common era) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

#[must_use]
pub fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 1, 1).is_some_and(|date| date.leap_year())
}

/// Number of days in a month, or zero if `month` is out of range.
#[must_use]
pub fn days_in_month(year: i32, month: u8) -> u8 {
    if !(1..=12).contains(&month) {
        return 0;
    }
    NaiveDate::from_ymd_opt(year, u32::from(month) + 1, 1)
        .or_else(|| NaiveDate::from_ymd_opt(year + 1, 1, 1))
        .and_then(|next| next.pred_opt())
        .and_then(|last| u8::try_from(last.day()).ok())
        .unwrap_or(31)
}

#[must_use]
pub fn days_in_year(year: i32) -> i32 {
    if is_leap_year(year) { 366 } else { 365 }
}

/// Zero-based day of the year. A day past the end of its month counts on
/// into the following months.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "a day within one year fits in i32"
)]
pub fn day_of_year(year: i32, month: u8, day: u8) -> i32 {
    (day_number(year, month, day) - day_number(year, 1, 1)) as i32
}

/// Days since 1970-01-01.
///
/// `month` must be in `1..=12`; `day` may run past the end of the month.
#[must_use]
pub fn day_number(year: i32, month: u8, day: u8) -> i64 {
    let first = NaiveDate::from_ymd_opt(year, u32::from(month), 1)
        .map_or(0, |date| i64::from(date.num_days_from_ce()) - UNIX_EPOCH_DAYS_FROM_CE);
    first + i64::from(day) - 1
}

/// The date `days` after 1970-01-01, saturating at the ends of the range
/// `chrono` supports.
fn date_at(days: i64) -> NaiveDate {
    i32::try_from(days + UNIX_EPOCH_DAYS_FROM_CE)
        .ok()
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

/// Inverse of [`day_number`].
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "chrono months and days are bounded by 12 and 31"
)]
pub fn date_from_day_number(days: i64) -> (i32, u8, u8) {
    let date = date_at(days);
    (date.year(), date.month() as u8, date.day() as u8)
}

/// Signed day difference `a - b`.
#[must_use]
pub fn days_between(a: (i32, u8, u8), b: (i32, u8, u8)) -> i64 {
    day_number(a.0, a.1, a.2) - day_number(b.0, b.1, b.2)
}

#[must_use]
pub fn weekday_of(year: i32, month: u8, day: u8) -> Weekday {
    let weekday = date_at(day_number(year, month, day)).weekday();
    Weekday::from_number(i64::from(weekday.num_days_from_sunday()))
}

#[must_use]
pub fn first_weekday_of_month(year: i32, month: u8) -> Weekday {
    weekday_of(year, month, 1)
}

/// Days from the most recent `wkst` on or before a day with weekday `dow`.
#[must_use]
pub fn offset_in_week(dow: Weekday, wkst: Weekday) -> i32 {
    (7 + dow.number() - wkst.number()) % 7
}

/// Week numbering of one year for BYWEEKNO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekNumbering {
    /// Zero-based day of year on which week 1 starts; negative when week 1
    /// begins in the previous December.
    pub start_of_week1: i32,
    pub weeks_in_year: i32,
}

/// ## Summary
/// Computes the week numbering of `year` for the week start `wkst`.
///
/// Week 1 is the first week holding at least four days of the year. Days
/// before it belong to the last week of the previous year.
#[must_use]
pub fn week_numbering(year: i32, wkst: Weekday) -> WeekNumbering {
    let start_of_week1 = week1_start(year, wkst);
    let start_of_next_week1 = days_in_year(year) + week1_start(year + 1, wkst);
    WeekNumbering {
        start_of_week1,
        weeks_in_year: (start_of_next_week1 - start_of_week1) / 7,
    }
}

fn week1_start(year: i32, wkst: Weekday) -> i32 {
    let days_in_first_week = 7 - offset_in_week(first_weekday_of_month(year, 1), wkst);
    if days_in_first_week < 4 {
        days_in_first_week
    } else {
        days_in_first_week - 7
    }
}

/// ## Summary
/// Returns `(week_number, weeks_in_that_year)` for a date, attributing days
/// before week 1 to the previous year and days after the last week to week 1
/// of the following year.
#[must_use]
pub fn week_of_year(year: i32, month: u8, day: u8, wkst: Weekday) -> (i32, i32) {
    let numbering = week_numbering(year, wkst);
    let doy = day_of_year(year, month, day);
    let offset = doy - numbering.start_of_week1;
    if offset < 0 {
        let previous = week_numbering(year - 1, wkst);
        let previous_doy = doy + days_in_year(year - 1);
        return (
            (previous_doy - previous.start_of_week1) / 7 + 1,
            previous.weeks_in_year,
        );
    }
    let week = offset / 7 + 1;
    if week > numbering.weeks_in_year {
        let next = week_numbering(year + 1, wkst);
        return (1, next.weeks_in_year);
    }
    (week, numbering.weeks_in_year)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leap_years() {
        assert!(is_leap_year(2000));
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(2023));
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2023, 4), 30);
        assert_eq!(days_in_month(2023, 13), 0);
    }

    #[test]
    fn day_numbers() {
        assert_eq!(day_number(1970, 1, 1), 0);
        assert_eq!(day_number(2000, 3, 1), 11_017);
        assert_eq!(day_number(1969, 12, 31), -1);
        assert_eq!(days_between((2021, 3, 1), (2021, 2, 1)), 28);
    }

    #[test]
    fn day_numbers_invert() {
        assert_eq!(date_from_day_number(0), (1970, 1, 1));
        assert_eq!(date_from_day_number(11_017), (2000, 3, 1));
        assert_eq!(date_from_day_number(-1), (1969, 12, 31));
        let leap_day = day_number(2024, 2, 29);
        assert_eq!(date_from_day_number(leap_day), (2024, 2, 29));
    }

    #[test]
    fn days_past_month_end_carry_over() {
        assert_eq!(day_number(2021, 2, 30), day_number(2021, 3, 2));
        assert_eq!(day_of_year(2021, 1, 32), 31);
        assert_eq!(weekday_of(2021, 2, 29), Weekday::Monday);
    }

    #[test]
    fn weekdays() {
        assert_eq!(weekday_of(2021, 1, 1), Weekday::Friday);
        assert_eq!(weekday_of(1997, 9, 2), Weekday::Tuesday);
        assert_eq!(first_weekday_of_month(2024, 2), Weekday::Thursday);
    }

    #[test]
    fn zero_based_day_of_year() {
        assert_eq!(day_of_year(2021, 1, 1), 0);
        assert_eq!(day_of_year(2024, 12, 31), 365);
        assert_eq!(day_of_year(2023, 3, 1), 59);
    }

    #[test]
    fn iso_week_numbering() {
        // 2021-01-01 is a Friday, so week 1 starts on Monday 2021-01-04.
        let numbering = week_numbering(2021, Weekday::Monday);
        assert_eq!(numbering.start_of_week1, 3);
        assert_eq!(numbering.weeks_in_year, 52);

        // 2020-01-01 is a Wednesday, so week 1 starts on 2019-12-30.
        let numbering = week_numbering(2020, Weekday::Monday);
        assert_eq!(numbering.start_of_week1, -2);
        assert_eq!(numbering.weeks_in_year, 53);
    }

    #[test]
    fn week_of_year_wraps_across_years() {
        assert_eq!(week_of_year(2021, 1, 1, Weekday::Monday), (53, 53));
        assert_eq!(week_of_year(2021, 1, 4, Weekday::Monday), (1, 52));
        assert_eq!(week_of_year(2019, 12, 30, Weekday::Monday), (1, 53));
    }
}
