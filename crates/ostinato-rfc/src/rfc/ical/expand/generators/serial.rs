use ostinato_core::constants::MAX_YEAR;

use super::Field;
use crate::rfc::ical::core::DateValue;
use crate::rfc::ical::expand::builder::DateBuilder;

/// Interval stepping in absolute field units.
///
/// `last` is the most recently emitted unit, starting one interval before the
/// start value. It only moves when a value is emitted, so a period that has
/// no room for the next step leaves the phase intact for the following one.
#[derive(Debug, Clone)]
pub(super) struct SerialGenerator {
    interval: i64,
    last: i64,
}

impl SerialGenerator {
    pub(super) fn new(field: Field, interval: u32, start: DateValue) -> Self {
        let interval = i64::from(interval.max(1));
        Self {
            interval,
            last: field.absolute(start) - interval,
        }
    }

    pub(super) fn generate(&mut self, field: Field, builder: &DateBuilder) -> Option<i32> {
        if field == Field::Year {
            let next = self.last + self.interval;
            if next > i64::from(MAX_YEAR) {
                return None;
            }
            self.last = next;
            return i32::try_from(next).ok();
        }

        let (first, last_in_period, base) = field.period(builder);
        let next = if self.last < first {
            let behind = (first - self.last).rem_euclid(self.interval);
            first + (self.interval - behind).rem_euclid(self.interval)
        } else {
            self.last + self.interval
        };
        if next > last_in_period {
            return None;
        }
        self.last = next;
        i32::try_from(next - first).ok().map(|offset| base + offset)
    }
}
