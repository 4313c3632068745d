//! DATE and DATE-TIME values (RFC 5545 §3.3.4, §3.3.5) and their total order.

use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Time of day carried by a timed [`DateValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl TimeOfDay {
    pub const MIDNIGHT: Self = Self {
        hour: 0,
        minute: 0,
        second: 0,
    };

    #[must_use]
    pub const fn new(hour: u8, minute: u8, second: u8) -> Self {
        Self {
            hour,
            minute,
            second,
        }
    }
}

/// A calendar date, optionally carrying a time of day.
///
/// Values are ordered by [`DateValue::sort_key`]: a bare date sorts strictly
/// before every timed value on the same day, including midnight, and never
/// compares equal to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateValue {
    year: i32,
    month: u8,
    day: u8,
    time: Option<TimeOfDay>,
}

impl DateValue {
    /// Creates a date-only value.
    #[must_use]
    pub const fn date(year: i32, month: u8, day: u8) -> Self {
        Self {
            year,
            month,
            day,
            time: None,
        }
    }

    /// Creates a timed value.
    #[must_use]
    pub const fn date_time(year: i32, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            time: Some(TimeOfDay::new(hour, minute, second)),
        }
    }

    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    #[must_use]
    pub const fn month(&self) -> u8 {
        self.month
    }

    #[must_use]
    pub const fn day(&self) -> u8 {
        self.day
    }

    /// Time of day, or `None` for a date-only value.
    #[must_use]
    pub const fn time(&self) -> Option<TimeOfDay> {
        self.time
    }

    #[must_use]
    pub const fn is_timed(&self) -> bool {
        self.time.is_some()
    }

    /// Hour of a timed value, zero for a date.
    #[must_use]
    pub const fn hour(&self) -> u8 {
        match self.time {
            Some(t) => t.hour,
            None => 0,
        }
    }

    #[must_use]
    pub const fn minute(&self) -> u8 {
        match self.time {
            Some(t) => t.minute,
            None => 0,
        }
    }

    #[must_use]
    pub const fn second(&self) -> u8 {
        match self.time {
            Some(t) => t.second,
            None => 0,
        }
    }

    /// Drops the time of day.
    #[must_use]
    pub const fn to_date(self) -> Self {
        Self::date(self.year, self.month, self.day)
    }

    /// Returns a timed value, using midnight for a bare date.
    #[must_use]
    pub const fn to_date_time(self) -> Self {
        match self.time {
            Some(_) => self,
            None => Self::date_time(self.year, self.month, self.day, 0, 0, 0),
        }
    }

    /// Returns whether every field lies in its legal range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let date_ok = self.to_naive_date().is_some();
        let time_ok = self
            .time
            .is_none_or(|t| t.hour < 24 && t.minute < 60 && t.second < 60);
        date_ok && time_ok
    }

    /// ## Summary
    /// Key used for the total order.
    ///
    /// `((((year << 4) + month) << 5) + day)` shifted left 17 bits for a
    /// date, or extended with hour, minute and second plus one for a timed
    /// value. The trailing `+ 1` keeps a bare date strictly before midnight
    /// of the same day.
    #[must_use]
    pub fn sort_key(&self) -> i64 {
        let date_key =
            (((i64::from(self.year) << 4) + i64::from(self.month)) << 5) + i64::from(self.day);
        match self.time {
            Some(t) => {
                ((((((date_key << 5) + i64::from(t.hour)) << 6) + i64::from(t.minute)) << 6)
                    + i64::from(t.second))
                    + 1
            }
            None => date_key << 17,
        }
    }

    /// Converts to a chrono date, or `None` if the value is not a real date.
    #[must_use]
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, u32::from(self.month), u32::from(self.day))
    }

    /// Converts to a chrono date-time, using midnight for a bare date.
    #[must_use]
    pub fn to_naive_date_time(&self) -> Option<NaiveDateTime> {
        let time = NaiveTime::from_hms_opt(
            u32::from(self.hour()),
            u32::from(self.minute()),
            u32::from(self.second()),
        )?;
        Some(self.to_naive_date()?.and_time(time))
    }
}

impl Ord for DateValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for DateValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "chrono month, day and time components always fit in u8"
)]
impl From<NaiveDate> for DateValue {
    fn from(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self::date(date.year(), date.month() as u8, date.day() as u8)
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "chrono month, day and time components always fit in u8"
)]
impl From<NaiveDateTime> for DateValue {
    fn from(dt: NaiveDateTime) -> Self {
        use chrono::Datelike;
        Self::date_time(
            dt.year(),
            dt.month() as u8,
            dt.day() as u8,
            dt.hour() as u8,
            dt.minute() as u8,
            dt.second() as u8,
        )
    }
}

impl std::fmt::Display for DateValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}{:02}{:02}", self.year, self.month, self.day)?;
        if let Some(t) = self.time {
            write!(f, "T{:02}{:02}{:02}", t.hour, t.minute, t.second)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_date_sorts_before_timed_midnight() {
        let date = DateValue::date(2006, 6, 7);
        let midnight = DateValue::date_time(2006, 6, 7, 0, 0, 0);

        assert_ne!(date, midnight);
        assert!(date < midnight);
        assert_eq!(date.sort_key() + 1, midnight.sort_key());
    }

    #[test]
    fn equal_bare_dates_compare_equal() {
        let rdate = DateValue::date(2006, 6, 7);
        let exdate = DateValue::date(2006, 6, 7);
        assert_eq!(rdate.cmp(&exdate), Ordering::Equal);
    }

    #[test]
    fn bare_date_sorts_after_previous_day_end() {
        let late = DateValue::date_time(2006, 6, 6, 23, 59, 59);
        let date = DateValue::date(2006, 6, 7);
        assert!(late < date);
    }

    #[test]
    fn ordering_follows_fields() {
        let a = DateValue::date_time(2006, 6, 7, 9, 30, 0);
        let b = DateValue::date_time(2006, 6, 7, 9, 30, 1);
        let c = DateValue::date(2006, 7, 1);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn validity_checks_month_length() {
        assert!(DateValue::date(2024, 2, 29).is_valid());
        assert!(!DateValue::date(2023, 2, 29).is_valid());
        assert!(!DateValue::date(2023, 13, 1).is_valid());
        assert!(!DateValue::date_time(2023, 1, 1, 24, 0, 0).is_valid());
    }

    #[test]
    fn display_uses_basic_format() {
        assert_eq!(DateValue::date(2006, 6, 7).to_string(), "20060607");
        assert_eq!(
            DateValue::date_time(2006, 6, 7, 9, 5, 0).to_string(),
            "20060607T090500"
        );
    }

    #[test]
    fn chrono_round_trip() {
        let naive = NaiveDate::from_ymd_opt(2021, 3, 14)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let value = DateValue::from(naive);
        assert_eq!(value.to_naive_date_time(), Some(naive));
    }
}
