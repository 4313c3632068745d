//! Content line lexer for recurrence text (RFC 5545 §3.1).
//!
//! Handles line unfolding and splitting `NAME;PARAM=VALUE:VALUE` lines.

use super::error::{ParseError, ParseErrorKind, ParseResult};

/// A property parameter (`TZID=Europe/Berlin`, `VALUE=DATE`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Uppercased parameter name.
    pub name: String,
    pub value: String,
}

/// A single unfolded content line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    /// Uppercased property name.
    pub name: String,
    pub params: Vec<Parameter>,
    pub value: String,
}

impl ContentLine {
    /// Returns the value of the named parameter, if present.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.value.as_str())
    }
}

/// Splits input into content lines, merging folded continuations.
///
/// Handles both CRLF and bare LF line endings. Lines starting with SP/HTAB are
/// continuations of the previous line; unfolding removes the line break and
/// the single whitespace character. Blank lines are dropped.
#[must_use]
pub fn split_lines(input: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();

    for (i, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        if let Some(continuation) = line.strip_prefix([' ', '\t']) {
            if let Some((_, prev)) = lines.last_mut() {
                prev.push_str(continuation);
                continue;
            }
        }
        lines.push((i + 1, line.trim().to_string()));
    }

    lines
}

/// Parses a single content line.
///
/// Format: `name *(";" param) ":" value`
///
/// ## Errors
/// Returns an error if the name is empty or malformed, a parameter is
/// malformed, or the line has no value separator.
pub fn parse_content_line(line: &str, line_num: usize) -> ParseResult<ContentLine> {
    let name_end = line.find([';', ':']).ok_or_else(|| {
        ParseError::new(ParseErrorKind::MissingColon, line_num, line.len())
    })?;

    let name = &line[..name_end];
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ParseError::new(
            ParseErrorKind::InvalidPropertyName,
            line_num,
            1,
        ));
    }

    let mut params = Vec::new();
    let mut pos = name_end;
    while line[pos..].starts_with(';') {
        let (param, next) = parse_parameter(line, pos + 1, line_num)?;
        params.push(param);
        pos = next;
    }

    if !line[pos..].starts_with(':') {
        return Err(ParseError::new(
            ParseErrorKind::MissingColon,
            line_num,
            pos + 1,
        ));
    }

    Ok(ContentLine {
        name: name.to_ascii_uppercase(),
        params,
        value: line[pos + 1..].to_string(),
    })
}

/// Parses one `NAME=value` parameter starting at byte `start`.
///
/// Returns the parameter and the byte offset of the `;` or `:` following it.
fn parse_parameter(line: &str, start: usize, line_num: usize) -> ParseResult<(Parameter, usize)> {
    let eq = line[start..]
        .find('=')
        .map(|i| start + i)
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidParameter, line_num, start + 1))?;

    let name = &line[start..eq];
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ParseError::new(
            ParseErrorKind::InvalidParameter,
            line_num,
            start + 1,
        ));
    }

    let value_start = eq + 1;
    let (value, end) = if line[value_start..].starts_with('"') {
        let close = line[value_start + 1..]
            .find('"')
            .map(|i| value_start + 1 + i)
            .ok_or_else(|| {
                ParseError::new(ParseErrorKind::UnclosedQuote, line_num, value_start + 1)
            })?;
        (&line[value_start + 1..close], close + 1)
    } else {
        let end = line[value_start..]
            .find([';', ':'])
            .map_or(line.len(), |i| value_start + i);
        (&line[value_start..end], end)
    };

    if end >= line.len() {
        return Err(ParseError::new(
            ParseErrorKind::MissingColon,
            line_num,
            line.len(),
        ));
    }

    Ok((
        Parameter {
            name: name.to_ascii_uppercase(),
            value: value.to_string(),
        },
        end,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_lines_unfolds_continuations() {
        let input = "RRULE:FREQ=WEEKLY;\r\n BYDAY=MO\r\nRDATE:20060607\r\n";
        let lines = split_lines(input);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], (1, "RRULE:FREQ=WEEKLY;BYDAY=MO".to_string()));
        assert_eq!(lines[1].1, "RDATE:20060607");
    }

    #[test]
    fn split_lines_skips_blank_lines() {
        let lines = split_lines("\nEXDATE:20060607\n\n");
        assert_eq!(lines, vec![(2, "EXDATE:20060607".to_string())]);
    }

    #[test]
    fn parse_simple_line() {
        let result = parse_content_line("rrule:FREQ=DAILY", 1).unwrap();
        assert_eq!(result.name, "RRULE");
        assert!(result.params.is_empty());
        assert_eq!(result.value, "FREQ=DAILY");
    }

    #[test]
    fn parse_line_with_params() {
        let line = "RDATE;VALUE=DATE-TIME;TZID=America/New_York:20260123T120000";
        let result = parse_content_line(line, 1).unwrap();
        assert_eq!(result.name, "RDATE");
        assert_eq!(result.params.len(), 2);
        assert_eq!(result.param("tzid"), Some("America/New_York"));
        assert_eq!(result.value, "20260123T120000");
    }

    #[test]
    fn parse_line_with_quoted_param() {
        let line = "EXDATE;TZID=\"Europe/Berlin\":20260123T120000";
        let result = parse_content_line(line, 1).unwrap();
        assert_eq!(result.param("TZID"), Some("Europe/Berlin"));
    }

    #[test]
    fn parse_line_unclosed_quote() {
        let err = parse_content_line("EXDATE;TZID=\"Europe/Berlin:2026", 3).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnclosedQuote);
        assert_eq!(err.line, 3);
    }

    #[test]
    fn parse_line_missing_colon() {
        let err = parse_content_line("INVALID", 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingColon);
    }

    #[test]
    fn parse_line_bad_name() {
        let err = parse_content_line("R RULE:FREQ=DAILY", 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidPropertyName);
    }
}
