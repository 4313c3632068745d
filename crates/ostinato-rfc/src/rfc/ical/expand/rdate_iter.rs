//! Iteration over literal instants (RDATE / EXDATE lists).

use crate::rfc::ical::core::DateValue;

use super::error::{RecurrenceError, RecurrenceResult};
use super::iterator::RecurrenceIterator;

/// Walks a sorted copy of literal instants.
#[derive(Debug, Clone)]
pub struct RDateIterator {
    dates: Vec<DateValue>,
    cursor: usize,
}

impl RDateIterator {
    /// ## Summary
    /// Copies, sorts and de-duplicates `dates`.
    ///
    /// ## Errors
    /// Returns `RecurrenceError::InvalidDate` for a value that is not a real
    /// calendar date or time.
    pub fn new(dates: &[DateValue]) -> RecurrenceResult<Self> {
        if let Some(invalid) = dates.iter().find(|date| !date.is_valid()) {
            return Err(RecurrenceError::InvalidDate(*invalid));
        }
        let mut dates = dates.to_vec();
        dates.sort_unstable();
        dates.dedup();
        Ok(Self { dates, cursor: 0 })
    }
}

impl Iterator for RDateIterator {
    type Item = DateValue;

    fn next(&mut self) -> Option<DateValue> {
        let next = self.dates.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(next)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.dates.len() - self.cursor;
        (remaining, Some(remaining))
    }
}

impl RecurrenceIterator for RDateIterator {
    fn has_next(&mut self) -> bool {
        self.cursor < self.dates.len()
    }

    fn advance_to(&mut self, target: DateValue) {
        while self.dates.get(self.cursor).is_some_and(|date| *date < target) {
            self.cursor += 1;
        }
    }
}
