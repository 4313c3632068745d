//! Field-by-field date accumulator used by the generator cascade.

use std::cmp::Ordering;

use crate::rfc::ical::core::DateValue;
use crate::rfc::ical::core::calendar::{date_from_day_number, day_number};

const SECONDS_PER_DAY: i64 = 86_400;

/// Mutable date and time fields.
///
/// Each field generator writes only its own field. Fields may temporarily
/// hold out-of-range values (day 32, hour -1); [`DateBuilder::normalize`]
/// carries the overflow into the larger fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateBuilder {
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    pub minute: i32,
    pub second: i32,
}

impl DateBuilder {
    /// Seeds every field from `start`. Bare dates start at midnight.
    #[must_use]
    pub fn new(start: DateValue) -> Self {
        Self {
            year: start.year(),
            month: i32::from(start.month()),
            day: i32::from(start.day()),
            hour: i32::from(start.hour()),
            minute: i32::from(start.minute()),
            second: i32::from(start.second()),
        }
    }

    /// ## Summary
    /// Carries out-of-range fields into larger ones so that every field is
    /// back in its legal range.
    ///
    /// Time fields carry into days, months into years and days across month
    /// boundaries in either direction.
    pub fn normalize(&mut self) {
        let seconds = i64::from(self.second)
            + 60 * (i64::from(self.minute) + 60 * i64::from(self.hour));
        let carry_days = seconds.div_euclid(SECONDS_PER_DAY);
        let seconds = seconds.rem_euclid(SECONDS_PER_DAY);

        let months = self.month - 1;
        let year = self.year + months.div_euclid(12);
        let month = narrow(months.rem_euclid(12) + 1);

        let days = day_number(year, month, 1) + i64::from(self.day) - 1 + carry_days;
        let (year, month, day) = date_from_day_number(days);

        self.year = year;
        self.month = i32::from(month);
        self.day = i32::from(day);
        self.hour = narrow_i64(seconds / 3600);
        self.minute = narrow_i64(seconds / 60 % 60);
        self.second = narrow_i64(seconds % 60);
    }

    /// Copies the fields of `value` into the builder. Bare dates leave the
    /// time fields untouched.
    pub fn set(&mut self, value: DateValue) {
        self.year = value.year();
        self.month = i32::from(value.month());
        self.day = i32::from(value.day());
        if let Some(time) = value.time() {
            self.hour = i32::from(time.hour);
            self.minute = i32::from(time.minute);
            self.second = i32::from(time.second);
        }
    }

    /// The normalized date part.
    #[must_use]
    pub fn to_date(&self) -> DateValue {
        let mut normalized = *self;
        normalized.normalize();
        DateValue::date(
            normalized.year,
            narrow(normalized.month),
            narrow(normalized.day),
        )
    }

    /// The normalized date and time.
    #[must_use]
    pub fn to_date_time(&self) -> DateValue {
        let mut normalized = *self;
        normalized.normalize();
        DateValue::date_time(
            normalized.year,
            narrow(normalized.month),
            narrow(normalized.day),
            narrow(normalized.hour),
            narrow(normalized.minute),
            narrow(normalized.second),
        )
    }

    /// The date or date-time, depending on whether the rule is timed.
    #[must_use]
    pub fn to_value(&self, timed: bool) -> DateValue {
        if timed {
            self.to_date_time()
        } else {
            self.to_date()
        }
    }

    /// The year, month and day for calendar arithmetic. Only meaningful
    /// while the date fields are in range.
    #[must_use]
    pub const fn ymd(&self) -> (i32, u8, u8) {
        (self.year, narrow(self.month), narrow(self.day))
    }

    /// ## Summary
    /// Compares the builder with `target` at the target's precision.
    ///
    /// Against a bare date only year, month and day take part; against a
    /// timed value the time fields do as well. Fields are compared as they
    /// stand, without normalizing.
    #[must_use]
    pub fn compare_to(&self, target: &DateValue) -> Ordering {
        let date_key = |year: i32, month: i32, day: i32| {
            (((i64::from(year) << 4) + i64::from(month)) << 5) + i64::from(day)
        };
        let mut ours = date_key(self.year, self.month, self.day);
        let mut theirs = date_key(
            target.year(),
            i32::from(target.month()),
            i32::from(target.day()),
        );
        if target.is_timed() {
            let time_key = |key: i64, hour: i32, minute: i32, second: i32| {
                (((((key << 5) + i64::from(hour)) << 6) + i64::from(minute)) << 6)
                    + i64::from(second)
            };
            ours = time_key(ours, self.hour, self.minute, self.second);
            theirs = time_key(
                theirs,
                i32::from(target.hour()),
                i32::from(target.minute()),
                i32::from(target.second()),
            );
        }
        ours.cmp(&theirs)
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "callers narrow normalized fields, which fit in u8"
)]
const fn narrow(value: i32) -> u8 {
    value as u8
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "time-of-day components are below 86400"
)]
const fn narrow_i64(value: i64) -> i32 {
    value as i32
}
