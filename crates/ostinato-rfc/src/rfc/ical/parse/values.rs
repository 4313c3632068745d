//! Value parsers for recurrence text (RFC 5545 §3.3).
//!
//! Error sources are intentionally discarded during parsing (`map_err_ignore`)
//! since the integer parse errors carry nothing beyond the position we report.
#![expect(
    clippy::map_err_ignore,
    reason = "Value parsers report position and kind rather than integer parse errors"
)]

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::rfc::ical::core::{DateValue, Frequency, RRule, Termination, Weekday, WeekdayNum};

/// A DATE or DATE-TIME value together with its UTC marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub value: DateValue,
    /// Whether the value ended with `Z`.
    pub is_utc: bool,
}

/// Parses a DATE value (RFC 5545 §3.3.4).
///
/// Format: YYYYMMDD (e.g., "19970714")
///
/// ## Errors
/// Returns an error if the string is not a valid 8-digit calendar date.
pub fn parse_date(s: &str, line: usize, col: usize) -> ParseResult<DateValue> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::new(ParseErrorKind::InvalidDate, line, col));
    }

    let year = s[0..4]
        .parse::<i32>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidDate, line, col))?;
    let month = s[4..6]
        .parse::<u8>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidDate, line, col))?;
    let day = s[6..8]
        .parse::<u8>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidDate, line, col))?;

    let date = DateValue::date(year, month, day);
    if !date.is_valid() {
        return Err(ParseError::new(ParseErrorKind::InvalidDate, line, col)
            .with_context(s.to_string()));
    }

    Ok(date)
}

/// Parses a DATE-TIME value (RFC 5545 §3.3.5).
///
/// Format: YYYYMMDD"T"HHMMSS[Z] (e.g., "19970714T133000Z")
///
/// ## Errors
/// Returns an error if the string is not a valid date-time.
pub fn parse_datetime(s: &str, line: usize, col: usize) -> ParseResult<ParsedDate> {
    let t_pos = s
        .find(['T', 't'])
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidDateTime, line, col))?;

    let date = parse_date(&s[..t_pos], line, col)?;
    let time_col = col + t_pos + 1;

    let (time_str, is_utc) = match s[t_pos + 1..].strip_suffix(['Z', 'z']) {
        Some(stripped) => (stripped, true),
        None => (&s[t_pos + 1..], false),
    };

    if time_str.len() != 6 || !time_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::new(ParseErrorKind::InvalidTime, line, time_col));
    }

    let field = |range: std::ops::Range<usize>| {
        time_str[range]
            .parse::<u8>()
            .map_err(|_| ParseError::new(ParseErrorKind::InvalidTime, line, time_col))
    };
    let value = DateValue::date_time(
        date.year(),
        date.month(),
        date.day(),
        field(0..2)?,
        field(2..4)?,
        field(4..6)?,
    );
    if !value.is_valid() {
        return Err(ParseError::new(ParseErrorKind::InvalidTime, line, time_col));
    }

    Ok(ParsedDate { value, is_utc })
}

/// Parses either a DATE or a DATE-TIME, depending on the presence of `T`.
///
/// ## Errors
/// Returns an error if the string is neither.
pub fn parse_date_or_datetime(s: &str, line: usize, col: usize) -> ParseResult<ParsedDate> {
    if s.contains(['T', 't']) {
        parse_datetime(s, line, col)
    } else {
        Ok(ParsedDate {
            value: parse_date(s, line, col)?,
            is_utc: false,
        })
    }
}

/// Parses a comma-separated RDATE/EXDATE value list.
///
/// ## Errors
/// Returns an error if any element is not a DATE or DATE-TIME.
pub fn parse_date_list(s: &str, line: usize, col: usize) -> ParseResult<Vec<ParsedDate>> {
    let mut offset = col;
    s.split(',')
        .map(|part| {
            let parsed = parse_date_or_datetime(part.trim(), line, offset);
            offset += part.len() + 1;
            parsed
        })
        .collect()
}

/// Parses a RECUR (RRULE) value (RFC 5545 §3.3.10).
///
/// Unknown rule parts are ignored. Only structural problems are reported;
/// the values are not checked for semantic consistency.
///
/// ## Errors
/// Returns an error if a part is malformed, FREQ is missing, or both UNTIL
/// and COUNT are present.
#[tracing::instrument(skip_all, fields(rule = %s))]
pub fn parse_rrule(s: &str, line: usize, col: usize) -> ParseResult<RRule> {
    let mut freq = None;
    let mut rrule = RRule::new(Frequency::Yearly);

    for part in s.trim().trim_end_matches(';').split(';') {
        let eq_pos = part
            .find('=')
            .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidRRule, line, col))?;

        let key = &part[..eq_pos];
        let value = &part[eq_pos + 1..];

        if key.eq_ignore_ascii_case("FREQ") {
            freq = Some(
                Frequency::parse(value)
                    .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidFrequency, line, col))?,
            );
        } else {
            parse_rrule_part(&mut rrule, key, value, line, col)?;
        }
    }

    let Some(freq) = freq else {
        tracing::debug!("RRULE has no FREQ part");
        return Err(ParseError::new(ParseErrorKind::MissingFrequency, line, col));
    };
    rrule.freq = freq;

    Ok(rrule)
}

/// Parses a single RRULE key-value pair other than FREQ.
fn parse_rrule_part(
    rrule: &mut RRule,
    key: &str,
    value: &str,
    line: usize,
    col: usize,
) -> ParseResult<()> {
    match key.to_ascii_uppercase().as_str() {
        "INTERVAL" => {
            rrule.interval = value
                .parse()
                .map_err(|_| ParseError::new(ParseErrorKind::InvalidRRule, line, col))?;
        }
        "COUNT" => parse_rrule_count(rrule, value, line, col)?,
        "UNTIL" => parse_rrule_until(rrule, value, line, col)?,
        "WKST" => {
            rrule.wkst = Weekday::parse(value)
                .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidWeekday, line, col))?;
        }
        "BYSECOND" => rrule.by_second = parse_int_list(value, line, col)?,
        "BYMINUTE" => rrule.by_minute = parse_int_list(value, line, col)?,
        "BYHOUR" => rrule.by_hour = parse_int_list(value, line, col)?,
        "BYDAY" => rrule.by_day = parse_byday(value, line, col)?,
        "BYMONTHDAY" => rrule.by_month_day = parse_int_list(value, line, col)?,
        "BYYEARDAY" => rrule.by_year_day = parse_int_list(value, line, col)?,
        "BYWEEKNO" => rrule.by_week_no = parse_int_list(value, line, col)?,
        "BYMONTH" => rrule.by_month = parse_int_list(value, line, col)?,
        "BYYEAR" => rrule.by_year = parse_int_list(value, line, col)?,
        "BYSETPOS" => rrule.by_set_pos = parse_int_list(value, line, col)?,
        other => {
            tracing::trace!(part = other, "Ignoring unknown RRULE part");
        }
    }
    Ok(())
}

/// Parses the COUNT component of an RRULE.
fn parse_rrule_count(rrule: &mut RRule, value: &str, line: usize, col: usize) -> ParseResult<()> {
    if matches!(rrule.termination, Termination::Until(_)) {
        return Err(ParseError::new(
            ParseErrorKind::UntilCountConflict,
            line,
            col,
        ));
    }
    rrule.termination = Termination::Count(
        value
            .parse()
            .map_err(|_| ParseError::new(ParseErrorKind::InvalidRRule, line, col))?,
    );
    Ok(())
}

/// Parses the UNTIL component of an RRULE.
fn parse_rrule_until(rrule: &mut RRule, value: &str, line: usize, col: usize) -> ParseResult<()> {
    if matches!(rrule.termination, Termination::Count(_)) {
        return Err(ParseError::new(
            ParseErrorKind::UntilCountConflict,
            line,
            col,
        ));
    }
    // UNTIL can be DATE or DATE-TIME
    rrule.termination = Termination::Until(parse_date_or_datetime(value, line, col)?.value);
    Ok(())
}

/// Parses a comma-separated list of signed integers.
fn parse_int_list(s: &str, line: usize, col: usize) -> ParseResult<Vec<i32>> {
    s.split(',')
        .map(|v| {
            let v = v.trim();
            v.strip_prefix('+')
                .unwrap_or(v)
                .parse()
                .map_err(|_| ParseError::new(ParseErrorKind::InvalidRRule, line, col))
        })
        .collect()
}

/// Parses a BYDAY value (weekdays with optional ordinals).
fn parse_byday(s: &str, line: usize, col: usize) -> ParseResult<Vec<WeekdayNum>> {
    s.split(',')
        .map(|v| parse_weekday_num(v.trim(), line, col))
        .collect()
}

/// Parses a single weekday with optional ordinal (e.g., "MO", "1MO", "-1FR").
fn parse_weekday_num(s: &str, line: usize, col: usize) -> ParseResult<WeekdayNum> {
    // The last two characters are the weekday
    if s.len() < 2 || !s.is_char_boundary(s.len() - 2) {
        return Err(ParseError::new(ParseErrorKind::InvalidWeekday, line, col));
    }

    let weekday_str = &s[s.len() - 2..];
    let ordinal_str = &s[..s.len() - 2];

    let weekday = Weekday::parse(weekday_str)
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidWeekday, line, col))?;

    let ordinal = if ordinal_str.is_empty() {
        0
    } else {
        ordinal_str
            .strip_prefix('+')
            .unwrap_or(ordinal_str)
            .parse()
            .map_err(|_| ParseError::new(ParseErrorKind::InvalidRRule, line, col))?
    };

    Ok(WeekdayNum { ordinal, weekday })
}
