//! Recurrence text parse error types.

use std::fmt;

/// Result type for recurrence text parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// An error that occurred while parsing recurrence text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The kind of error.
    pub kind: ParseErrorKind,
    /// Line number where the error occurred (1-based).
    pub line: usize,
    /// Column where the offending value starts (1-based).
    pub col: usize,
    /// Additional context.
    pub context: Option<String>,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub const fn new(kind: ParseErrorKind, line: usize, col: usize) -> Self {
        Self {
            kind,
            line,
            col,
            context: None,
        }
    }

    /// Attaches context to the error.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}: {}", self.line, self.col, self.kind)?;
        if let Some(context) = &self.context {
            write!(f, " ({context})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// The kind of parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Invalid DATE value.
    InvalidDate,
    /// Invalid TIME component.
    InvalidTime,
    /// Invalid DATE-TIME value.
    InvalidDateTime,
    /// Malformed RRULE part.
    InvalidRRule,
    /// Unknown FREQ value.
    InvalidFrequency,
    /// RRULE without a FREQ part.
    MissingFrequency,
    /// Unknown weekday code.
    InvalidWeekday,
    /// Both UNTIL and COUNT given.
    UntilCountConflict,
    /// Property name with characters outside `[A-Za-z0-9-]`, or empty.
    InvalidPropertyName,
    /// Malformed `;NAME=value` parameter.
    InvalidParameter,
    /// Quoted parameter value without a closing quote.
    UnclosedQuote,
    /// Content line without a `:` separating the value.
    MissingColon,
    /// Content line with an unrecognized name.
    UnknownProperty,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDate => write!(f, "invalid date"),
            Self::InvalidTime => write!(f, "invalid time"),
            Self::InvalidDateTime => write!(f, "invalid date-time"),
            Self::InvalidRRule => write!(f, "invalid recurrence rule"),
            Self::InvalidFrequency => write!(f, "invalid frequency"),
            Self::MissingFrequency => write!(f, "missing FREQ"),
            Self::InvalidWeekday => write!(f, "invalid weekday"),
            Self::UntilCountConflict => write!(f, "UNTIL and COUNT are mutually exclusive"),
            Self::InvalidPropertyName => write!(f, "invalid property name"),
            Self::InvalidParameter => write!(f, "invalid parameter"),
            Self::UnclosedQuote => write!(f, "unclosed quote"),
            Self::MissingColon => write!(f, "missing colon"),
            Self::UnknownProperty => write!(f, "unknown property"),
        }
    }
}
