use super::Field;
use crate::rfc::ical::core::calendar::{
    day_of_year, days_in_month, days_in_year, first_weekday_of_month, offset_in_week,
    week_of_year,
};
use crate::rfc::ical::core::{Weekday, WeekdayNum};
use crate::rfc::ical::expand::builder::DateBuilder;
use crate::rfc::ical::expand::int_set::{IntSet, uniquify};

/// Where the concrete values of an enumerated generator come from.
#[derive(Debug, Clone)]
pub(super) enum ValueSource {
    /// Absolute values, independent of the period.
    Fixed(Vec<i32>),
    MonthDays(Vec<i32>),
    YearDays(Vec<i32>),
    Weekdays {
        days: Vec<WeekdayNum>,
        in_year: bool,
    },
    WeekNumbers {
        weeks: Vec<i32>,
        wkst: Weekday,
    },
}

impl ValueSource {
    pub(super) fn fixed(values: &[i32]) -> Self {
        Self::Fixed(uniquify(values))
    }

    pub(super) fn month_days(days: &[i32]) -> Self {
        Self::MonthDays(uniquify(days))
    }

    pub(super) fn year_days(days: &[i32]) -> Self {
        Self::YearDays(uniquify(days))
    }

    pub(super) fn weekdays(days: &[WeekdayNum], in_year: bool) -> Self {
        Self::Weekdays {
            days: days.to_vec(),
            in_year,
        }
    }

    pub(super) fn week_numbers(weeks: &[i32], wkst: Weekday) -> Self {
        Self::WeekNumbers {
            weeks: uniquify(weeks),
            wkst,
        }
    }

    /// Resolves the sorted values for the period the builder is in.
    fn values_for(&self, builder: &DateBuilder) -> Vec<i32> {
        let (year, month, _) = builder.ymd();
        let month_length = i32::from(days_in_month(year, month));
        match self {
            Self::Fixed(values) => values.clone(),
            Self::MonthDays(days) => days
                .iter()
                .map(|&day| if day < 0 { day + month_length + 1 } else { day })
                .filter(|day| (1..=month_length).contains(day))
                .collect::<IntSet>()
                .into_vec(),
            Self::YearDays(days) => {
                let year_length = days_in_year(year);
                let first_of_month = day_of_year(year, month, 1);
                days.iter()
                    .map(|&day| if day < 0 { day + year_length + 1 } else { day })
                    .map(|day| day - first_of_month)
                    .filter(|day| (1..=month_length).contains(day))
                    .collect::<IntSet>()
                    .into_vec()
            }
            Self::Weekdays { days, in_year } => {
                weekday_dates(days, *in_year, year, month).into_vec()
            }
            Self::WeekNumbers { weeks, wkst } => (1..=days_in_month(year, month))
                .filter(|&day| {
                    let (week, weeks_in_year) = week_of_year(year, month, day, *wkst);
                    weeks
                        .iter()
                        .any(|&w| w == week || (w < 0 && w + weeks_in_year + 1 == week))
                })
                .map(i32::from)
                .collect(),
        }
    }
}

/// ## Summary
/// Days of `month` matching the BYDAY entries.
///
/// Ordinals count occurrences of the weekday from the start (positive) or
/// end (negative) of the month, or of the whole year when `in_year` is set.
fn weekday_dates(days: &[WeekdayNum], in_year: bool, year: i32, month: u8) -> IntSet {
    let month_length = i32::from(days_in_month(year, month));
    let (period_length, period_first_weekday, first_of_month) = if in_year {
        (
            days_in_year(year),
            first_weekday_of_month(year, 1),
            day_of_year(year, month, 1),
        )
    } else {
        (month_length, first_weekday_of_month(year, month), 0)
    };
    let month_first_weekday = first_weekday_of_month(year, month);

    let mut dates = IntSet::new();
    for day in days {
        if day.ordinal == 0 {
            let first = 1 + offset_in_week(day.weekday, month_first_weekday);
            dates.extend((first..=month_length).step_by(7));
            continue;
        }
        // zero-based index of the first occurrence within the period
        let first = offset_in_week(day.weekday, period_first_weekday);
        let index = if day.ordinal > 0 {
            first + (day.ordinal - 1) * 7
        } else {
            let last = first + (period_length - 1 - first) / 7 * 7;
            last + (day.ordinal + 1) * 7
        };
        let date = index - first_of_month + 1;
        if (0..period_length).contains(&index) && (1..=month_length).contains(&date) {
            dates.add(date);
        }
    }
    dates
}

/// Enumerated values with a cursor, rebuilt whenever the governing period
/// changes.
#[derive(Debug, Clone)]
pub(super) struct ByPartGenerator {
    source: ValueSource,
    values: Vec<i32>,
    cursor: usize,
    period: Option<i64>,
}

impl ByPartGenerator {
    pub(super) const fn new(source: ValueSource) -> Self {
        Self {
            source,
            values: Vec::new(),
            cursor: 0,
            period: None,
        }
    }

    pub(super) fn generate(&mut self, field: Field, builder: &DateBuilder) -> Option<i32> {
        let period = field.period(builder).0;
        if self.period != Some(period) {
            self.period = Some(period);
            self.values = self.source.values_for(builder);
            self.cursor = 0;
        }
        let value = self.values.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(value)
    }
}

/// A fixed value emitted once per governing period.
#[derive(Debug, Clone)]
pub(super) struct SingleValue {
    value: i32,
    period: Option<i64>,
}

impl SingleValue {
    pub(super) const fn new(value: i32) -> Self {
        Self {
            value,
            period: None,
        }
    }

    pub(super) const fn value(&self) -> i32 {
        self.value
    }

    pub(super) fn generate(&mut self, field: Field, builder: &DateBuilder) -> Option<i32> {
        let period = field.period(builder).0;
        if self.period == Some(period) {
            return None;
        }
        self.period = Some(period);
        Some(self.value)
    }
}
