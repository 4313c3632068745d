//! The pull-iterator interface shared by every recurrence source.

use crate::rfc::ical::core::DateValue;

use super::error::{RecurrenceError, RecurrenceResult};

/// A forward-only, ascending sequence of recurrence instants.
///
/// `next` returns instants in the order of [`DateValue`]. Timed instants of
/// rules built with a timezone are in UTC.
pub trait RecurrenceIterator: Iterator<Item = DateValue> {
    /// Whether another instant is available. May compute it.
    fn has_next(&mut self) -> bool;

    /// ## Summary
    /// Skips every instant strictly before `target`.
    ///
    /// Calling it with a target at or before the last returned instant has
    /// no effect. Calling it twice with the same target is the same as
    /// calling it once.
    fn advance_to(&mut self, target: DateValue);

    /// ## Errors
    /// Always returns `RecurrenceError::Unsupported`. Recurrence sequences
    /// are derived values and cannot be edited through an iterator.
    fn remove(&mut self) -> RecurrenceResult<()> {
        Err(RecurrenceError::Unsupported("remove"))
    }
}

/// A type-erased recurrence iterator.
pub type BoxedRecurrenceIterator = Box<dyn RecurrenceIterator>;
