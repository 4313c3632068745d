//! Field generators.
//!
//! A generator produces successive legal values for one field of a
//! [`DateBuilder`], given the larger fields already written. When it runs
//! out of values for the current governing period it reports
//! [`Step::Exhausted`] and the cascade advances the next larger field.

mod by_part;
mod serial;

use crate::rfc::ical::core::calendar::{day_number, days_in_month};
use crate::rfc::ical::core::{DateValue, Weekday, WeekdayNum};

use super::builder::DateBuilder;
use by_part::{ByPartGenerator, SingleValue, ValueSource};
use serial::SerialGenerator;

/// Outcome of one generator step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<T> {
    /// A value was written.
    Produced(T),
    /// No more values in the current governing period (or at all, for the
    /// year generator).
    Exhausted,
    /// A safety ceiling fired. Terminates the whole iteration.
    ShortCircuited,
}

/// A date or time field, ordered from largest to smallest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl Field {
    pub const ALL: [Self; 6] = [
        Self::Year,
        Self::Month,
        Self::Day,
        Self::Hour,
        Self::Minute,
        Self::Second,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
        }
    }

    /// Writes `value` into this field of the builder.
    pub(crate) const fn set(self, builder: &mut DateBuilder, value: i32) {
        match self {
            Self::Year => builder.year = value,
            Self::Month => builder.month = value,
            Self::Day => builder.day = value,
            Self::Hour => builder.hour = value,
            Self::Minute => builder.minute = value,
            Self::Second => builder.second = value,
        }
    }

    /// ## Summary
    /// The governing period of this field in the builder, as an absolute
    /// count of this field's units.
    ///
    /// Returns the first unit of the period, the last unit and the field
    /// value of the first unit. The year field has a single unbounded period.
    pub(crate) fn period(self, builder: &DateBuilder) -> (i64, i64, i32) {
        match self {
            Self::Year => (0, i64::MAX, 0),
            Self::Month => {
                let first = i64::from(builder.year) * 12;
                (first, first + 11, 1)
            }
            Self::Day => {
                let (year, month, _) = builder.ymd();
                let first = day_number(year, month, 1);
                (first, first + i64::from(days_in_month(year, month)) - 1, 1)
            }
            Self::Hour => {
                let (year, month, day) = builder.ymd();
                let first = day_number(year, month, day) * 24;
                (first, first + 23, 0)
            }
            Self::Minute => {
                let first = (Self::Hour.period(builder).0 + i64::from(builder.hour)) * 60;
                (first, first + 59, 0)
            }
            Self::Second => {
                let first = (Self::Minute.period(builder).0 + i64::from(builder.minute)) * 60;
                (first, first + 59, 0)
            }
        }
    }

    /// The absolute unit count of `value` in this field.
    pub(crate) fn absolute(self, value: DateValue) -> i64 {
        let (year, month, day) = (value.year(), value.month(), value.day());
        let days = day_number(year, month, day);
        let hours = days * 24 + i64::from(value.hour());
        let minutes = hours * 60 + i64::from(value.minute());
        match self {
            Self::Year => i64::from(year),
            Self::Month => i64::from(year) * 12 + i64::from(month) - 1,
            Self::Day => days,
            Self::Hour => hours,
            Self::Minute => minutes,
            Self::Second => minutes * 60 + i64::from(value.second()),
        }
    }
}

/// Counts consecutive unproductive steps of the year generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Throttle {
    remaining: u32,
    limit: u32,
}

#[derive(Debug, Clone)]
enum GeneratorKind {
    Serial(SerialGenerator),
    ByPart(ByPartGenerator),
    Single(SingleValue),
}

/// A generator for one field.
#[derive(Debug, Clone)]
pub struct FieldGenerator {
    field: Field,
    kind: GeneratorKind,
    throttle: Option<Throttle>,
}

impl FieldGenerator {
    /// ## Summary
    /// Emits `start + k * interval` in the field's units.
    ///
    /// When the governing period changes, the next value is the first unit
    /// in the new period that keeps the interval phase of the last value.
    #[must_use]
    pub fn serial(field: Field, interval: u32, start: DateValue) -> Self {
        Self::from_kind(
            field,
            GeneratorKind::Serial(SerialGenerator::new(field, interval, start)),
        )
    }

    /// ## Summary
    /// Emits the given values of the field in ascending order once per
    /// governing period.
    ///
    /// A single value yields a single-value generator.
    #[must_use]
    pub fn by_values(field: Field, values: &[i32]) -> Self {
        match values {
            [value] => Self::from_kind(field, GeneratorKind::Single(SingleValue::new(*value))),
            _ => Self::by_part(field, ValueSource::fixed(values)),
        }
    }

    /// Days of the month, negative values counting from the month's end.
    #[must_use]
    pub fn month_days(days: &[i32]) -> Self {
        Self::by_part(Field::Day, ValueSource::month_days(days))
    }

    /// Days of the year, negative values counting from the year's end.
    #[must_use]
    pub fn year_days(days: &[i32]) -> Self {
        Self::by_part(Field::Day, ValueSource::year_days(days))
    }

    /// Weekdays with ordinals resolved within the month, or within the year
    /// when `in_year` is set.
    #[must_use]
    pub fn weekdays(days: &[WeekdayNum], in_year: bool) -> Self {
        Self::by_part(Field::Day, ValueSource::weekdays(days, in_year))
    }

    /// Days falling in the given weeks of the year.
    #[must_use]
    pub fn week_numbers(weeks: &[i32], wkst: Weekday) -> Self {
        Self::by_part(Field::Day, ValueSource::week_numbers(weeks, wkst))
    }

    /// Short-circuits after `limit` consecutive steps without a call to
    /// [`FieldGenerator::work_done`].
    #[must_use]
    pub const fn with_throttle(mut self, limit: u32) -> Self {
        self.throttle = Some(Throttle {
            remaining: limit,
            limit,
        });
        self
    }

    fn by_part(field: Field, source: ValueSource) -> Self {
        Self::from_kind(field, GeneratorKind::ByPart(ByPartGenerator::new(source)))
    }

    const fn from_kind(field: Field, kind: GeneratorKind) -> Self {
        Self {
            field,
            kind,
            throttle: None,
        }
    }

    /// Whether the generator emits at most one value per governing period.
    #[must_use]
    pub const fn emits_at_most_one_per_cycle(&self) -> bool {
        matches!(self.kind, GeneratorKind::Single(_))
    }

    /// The value of a single-value generator.
    #[must_use]
    pub const fn single_value(&self) -> Option<i32> {
        match &self.kind {
            GeneratorKind::Single(single) => Some(single.value()),
            GeneratorKind::Serial(_) | GeneratorKind::ByPart(_) => None,
        }
    }

    /// ## Summary
    /// Writes the next value of the field into `builder`.
    ///
    /// Reads only the larger fields of the builder.
    pub fn generate(&mut self, builder: &mut DateBuilder) -> Step<i32> {
        if let Some(throttle) = &mut self.throttle {
            if throttle.remaining == 0 {
                tracing::warn!(
                    limit = throttle.limit,
                    field = self.field.as_str(),
                    "Generator produced no instance within its limit, short-circuiting"
                );
                return Step::ShortCircuited;
            }
            throttle.remaining -= 1;
        }

        let field = self.field;
        let produced = match &mut self.kind {
            GeneratorKind::Serial(serial) => serial.generate(field, builder),
            GeneratorKind::ByPart(by_part) => by_part.generate(field, builder),
            GeneratorKind::Single(single) => single.generate(field, builder),
        };
        match produced {
            Some(value) => {
                field.set(builder, value);
                Step::Produced(value)
            }
            None => Step::Exhausted,
        }
    }

    /// Resets the throttle after an instance was emitted.
    pub const fn work_done(&mut self) {
        if let Some(throttle) = &mut self.throttle {
            throttle.remaining = throttle.limit;
        }
    }
}
