use thiserror::Error;

use crate::rfc::ical::expand::{ConversionError, RecurrenceError};
use crate::rfc::ical::parse::ParseError;

/// Recurrence parsing and expansion errors
#[derive(Error, Debug)]
pub enum RfcError {
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),

    #[error("Recurrence error: {0}")]
    RecurrenceError(#[from] RecurrenceError),

    #[error("Timezone error: {0}")]
    ConversionError(#[from] ConversionError),
}

pub type RfcResult<T> = std::result::Result<T, RfcError>;
