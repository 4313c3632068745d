//! Predicates applied to fully assembled candidates.
//!
//! Filters express by-parts that narrow an already generated sequence
//! rather than generate it. They never touch generator state.

use crate::rfc::ical::core::calendar::{
    day_number, day_of_year, days_in_month, days_in_year, offset_in_week, week_of_year,
    weekday_of,
};
use crate::rfc::ical::core::{DateValue, Weekday, WeekdayNum};

use super::generators::Field;
use super::int_set::uniquify;

/// A predicate over candidate instants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// BYDAY, with ordinals counted within the month, or the year when
    /// `in_year` is set.
    ByDay {
        days: Vec<WeekdayNum>,
        in_year: bool,
    },
    ByMonthDay(Vec<i32>),
    ByYearDay(Vec<i32>),
    ByWeekNo {
        weeks: Vec<i32>,
        wkst: Weekday,
    },
    /// Keeps weeks whose distance from the start week is a multiple of
    /// `interval`.
    WeekInterval {
        interval: i64,
        /// Day number of the first day of the start week.
        first_week_start: i64,
    },
    /// Bit `n` set admits field value `n`.
    TimeMask { field: Field, mask: u64 },
}

impl Filter {
    #[must_use]
    pub fn by_day(days: &[WeekdayNum], in_year: bool) -> Self {
        Self::ByDay {
            days: days.to_vec(),
            in_year,
        }
    }

    #[must_use]
    pub fn by_month_day(days: &[i32]) -> Self {
        Self::ByMonthDay(uniquify(days))
    }

    #[must_use]
    pub fn by_year_day(days: &[i32]) -> Self {
        Self::ByYearDay(uniquify(days))
    }

    #[must_use]
    pub fn by_week_no(weeks: &[i32], wkst: Weekday) -> Self {
        Self::ByWeekNo {
            weeks: uniquify(weeks),
            wkst,
        }
    }

    /// `interval` counts weeks starting on `wkst`, from the week holding
    /// `start`.
    #[must_use]
    pub fn week_interval(interval: u32, wkst: Weekday, start: DateValue) -> Self {
        let (year, month, day) = (start.year(), start.month(), start.day());
        let offset = offset_in_week(weekday_of(year, month, day), wkst);
        Self::WeekInterval {
            interval: i64::from(interval.max(1)),
            first_week_start: day_number(year, month, day) - i64::from(offset),
        }
    }

    /// BYHOUR, or `None` when every hour is admitted.
    #[must_use]
    pub fn by_hour(hours: &[i32]) -> Option<Self> {
        Self::time_mask(Field::Hour, hours, 24)
    }

    /// BYMINUTE, or `None` when every minute is admitted.
    #[must_use]
    pub fn by_minute(minutes: &[i32]) -> Option<Self> {
        Self::time_mask(Field::Minute, minutes, 60)
    }

    /// BYSECOND, or `None` when every second is admitted.
    #[must_use]
    pub fn by_second(seconds: &[i32]) -> Option<Self> {
        Self::time_mask(Field::Second, seconds, 60)
    }

    fn time_mask(field: Field, values: &[i32], range: u32) -> Option<Self> {
        let mask = values
            .iter()
            .filter_map(|&value| u32::try_from(value).ok())
            .filter(|&value| value < range)
            .fold(0_u64, |mask, value| mask | (1 << value));
        if mask == (1_u64 << range) - 1 {
            return None;
        }
        Some(Self::TimeMask { field, mask })
    }

    /// Whether `candidate` passes this filter.
    #[must_use]
    pub fn matches(&self, candidate: &DateValue) -> bool {
        let (year, month, day) = (candidate.year(), candidate.month(), candidate.day());
        match self {
            Self::ByDay { days, in_year } => by_day_matches(days, *in_year, candidate),
            Self::ByMonthDay(days) => {
                let month_length = i32::from(days_in_month(year, month));
                days.iter().any(|&d| {
                    let d = if d < 0 { d + month_length + 1 } else { d };
                    d == i32::from(day)
                })
            }
            Self::ByYearDay(days) => {
                let year_length = days_in_year(year);
                let ordinal = day_of_year(year, month, day) + 1;
                days.iter().any(|&d| {
                    let d = if d < 0 { d + year_length + 1 } else { d };
                    d == ordinal
                })
            }
            Self::ByWeekNo { weeks, wkst } => {
                let (week, weeks_in_year) = week_of_year(year, month, day, *wkst);
                weeks
                    .iter()
                    .any(|&w| w == week || (w < 0 && w + weeks_in_year + 1 == week))
            }
            Self::WeekInterval {
                interval,
                first_week_start,
            } => {
                let weeks = (day_number(year, month, day) - first_week_start).div_euclid(7);
                weeks.rem_euclid(*interval) == 0
            }
            Self::TimeMask { field, mask } => {
                let Some(time) = candidate.time() else {
                    return false;
                };
                let value = match field {
                    Field::Hour => time.hour,
                    Field::Minute => time.minute,
                    _ => time.second,
                };
                mask & (1 << value) != 0
            }
        }
    }
}

/// ## Summary
/// BYDAY as a filter.
///
/// The ordinal of a candidate is the count of its weekday so far in the
/// period: days 1-7 are the first occurrence, 8-14 the second and so on.
/// Negative ordinals count from the end of the period. Week numbering and
/// the week start play no part.
fn by_day_matches(days: &[WeekdayNum], in_year: bool, candidate: &DateValue) -> bool {
    let (year, month, day) = (candidate.year(), candidate.month(), candidate.day());
    let weekday = weekday_of(year, month, day);
    let (index, period_length) = if in_year {
        (day_of_year(year, month, day), days_in_year(year))
    } else {
        (i32::from(day) - 1, i32::from(days_in_month(year, month)))
    };
    let occurrence = index / 7 + 1;
    let occurrences = (period_length - 1 - index % 7) / 7 + 1;

    days.iter().any(|entry| {
        entry.weekday == weekday
            && match entry.ordinal {
                0 => true,
                n if n > 0 => n == occurrence,
                n => occurrences + n + 1 == occurrence,
            }
    })
}
