//! Recurrence text parsing (RFC 5545).
//!
//! Turns `RRULE`/`EXRULE` values and `RDATE`/`EXDATE` lists into the
//! structured forms consumed by `rfc::ical::expand`.

mod error;
mod lexer;
mod values;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use lexer::{ContentLine, Parameter, parse_content_line, split_lines};
pub use values::{
    ParsedDate, parse_date, parse_date_list, parse_date_or_datetime, parse_datetime, parse_rrule,
};
