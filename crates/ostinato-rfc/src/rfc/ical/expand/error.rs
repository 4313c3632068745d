//! Recurrence construction errors.

use ostinato_core::error::CoreError;

use crate::rfc::ical::core::DateValue;

/// Result type for building recurrence iterators.
pub type RecurrenceResult<T> = Result<T, RecurrenceError>;

/// Precondition failures when building an iterator, and unsupported
/// operations on one.
///
/// Exhaustion and safety ceilings are never reported through this type; an
/// iterator that stops for either reason simply has no next value.
#[derive(Debug, thiserror::Error)]
pub enum RecurrenceError {
    /// INTERVAL of zero.
    #[error("Recurrence interval must be at least 1")]
    InvalidInterval,

    /// A by-part value outside its legal range.
    #[error("Invalid {part} value: {value}")]
    InvalidByPart { part: &'static str, value: i32 },

    /// A start date or literal date that is not a real calendar value.
    #[error("Invalid date: {0}")]
    InvalidDate(DateValue),

    /// Safety ceilings that would stop iteration before it starts.
    #[error("Invalid limits: {0}")]
    InvalidLimits(#[from] CoreError),

    /// The iterator does not support the requested operation.
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}
