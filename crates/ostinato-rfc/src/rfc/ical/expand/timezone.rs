//! Timezone resolution and UTC conversion for recurrence instants.
//!
//! Uses ICU4X for Windows timezone ID to IANA mapping and timezone canonicalization.

use chrono::{DateTime, LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use icu::time::zone::WindowsParser;
use icu::time::zone::iana::IanaParserExtended;
use std::collections::HashMap;
use std::str::FromStr;

use crate::rfc::ical::core::DateValue;

/// Error during timezone conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// Unknown or invalid timezone identifier.
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    /// Non-existent time during DST gap.
    #[error("Non-existent time (DST gap): {0}")]
    NonExistentTime(String),
}

/// Resolver for timezone identifiers.
///
/// Maintains a cache of resolved timezones keyed by the TZID as written.
#[derive(Debug, Default)]
pub struct TimeZoneResolver {
    cache: HashMap<String, Tz>,
}

impl TimeZoneResolver {
    /// Creates a new timezone resolver.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// ## Summary
    /// Resolves a timezone identifier to a `chrono_tz::Tz`.
    ///
    /// This function attempts to parse the TZID as an IANA timezone name.
    /// Common CalDAV/iCalendar TZIDs are mapped to their IANA equivalents.
    ///
    /// ## Errors
    ///
    /// Returns `ConversionError::UnknownTimezone` if the TZID cannot be resolved.
    ///
    /// ## Side Effects
    ///
    /// Caches successful resolutions to avoid repeated parsing.
    pub fn resolve(&mut self, tzid: &str) -> Result<Tz, ConversionError> {
        if let Some(tz) = self.cache.get(tzid) {
            return Ok(*tz);
        }

        let normalized = normalize_tzid(tzid);
        let tz = Tz::from_str(&normalized)
            .map_err(|_e| ConversionError::UnknownTimezone(tzid.to_string()))?;

        tracing::trace!(tzid, resolved = %tz, "Resolved timezone");
        self.cache.insert(tzid.to_string(), tz);

        Ok(tz)
    }
}

/// Normalizes common CalDAV/iCalendar timezone identifiers to IANA names.
///
/// Uses ICU4X for Windows timezone ID mapping and IANA canonicalization.
/// Many calendar clients use non-standard TZID values that need to be
/// mapped to standard IANA timezone names.
fn normalize_tzid(tzid: &str) -> String {
    let stripped = tzid
        .strip_prefix("/mozilla.org/")
        .or_else(|| tzid.strip_prefix("/softwarestudio.org/"))
        .unwrap_or(tzid);

    // Windows names first, then IANA aliases (Europe/Kiev -> Europe/Kyiv)
    let windows_parser = WindowsParser::new();
    if let Some(tz) = windows_parser.parse(stripped, None) {
        let iana_parser = IanaParserExtended::new();
        for entry in iana_parser.iter() {
            if entry.time_zone == tz {
                return entry.canonical.to_string();
            }
        }
    }

    let iana_parser = IanaParserExtended::new();
    let parsed = iana_parser.parse(stripped);
    if parsed.time_zone != icu::time::TimeZone::UNKNOWN {
        return parsed.canonical.to_string();
    }

    stripped.to_string()
}

/// ## Summary
/// Converts a local datetime in `tz` to UTC.
///
/// Ambiguous times during a DST fold resolve to the earlier instant.
///
/// ## Errors
///
/// Returns `ConversionError::NonExistentTime` if the datetime falls into a
/// DST gap.
pub fn convert_to_utc(
    local_time: NaiveDateTime,
    tz: Tz,
) -> Result<DateTime<Utc>, ConversionError> {
    match tz.from_local_datetime(&local_time) {
        LocalResult::None => Err(ConversionError::NonExistentTime(format!(
            "{local_time} in timezone {tz}"
        ))),
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Ok(dt.with_timezone(&Utc)),
    }
}

/// ## Summary
/// Converts a local datetime in `tz` to UTC, resolving DST gaps.
///
/// A non-existent time is read with the offset in effect before the gap,
/// which lands it as far past the transition as it was past the start of
/// the gap.
#[must_use]
pub fn convert_to_utc_lenient(local_time: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    convert_to_utc(local_time, tz).unwrap_or_else(|_gap| {
        // No zone has two transitions within a day.
        let before = tz
            .offset_from_utc_datetime(&(local_time - TimeDelta::days(1)))
            .fix();
        (local_time - TimeDelta::seconds(i64::from(before.local_minus_utc()))).and_utc()
    })
}

/// ## Summary
/// Converts a wall-clock value in `tz` to UTC.
///
/// Bare dates and values with no zone pass through unchanged. Times in a DST
/// gap move forward by the gap length. Times in a fold use the earlier
/// instant.
#[must_use]
pub fn local_to_utc(value: DateValue, tz: Option<Tz>) -> DateValue {
    let (Some(tz), true) = (tz, value.is_timed()) else {
        return value;
    };
    let Some(local) = value.to_naive_date_time() else {
        return value;
    };
    DateValue::from(convert_to_utc_lenient(local, tz).naive_utc())
}

/// ## Summary
/// Converts a UTC value to wall-clock time in `tz`.
///
/// Bare dates and values with no zone pass through unchanged.
#[must_use]
pub fn utc_to_local(value: DateValue, tz: Option<Tz>) -> DateValue {
    let (Some(tz), true) = (tz, value.is_timed()) else {
        return value;
    };
    let Some(utc) = value.to_naive_date_time() else {
        return value;
    };
    DateValue::from(tz.from_utc_datetime(&utc).naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive(y: i32, m: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[test]
    fn test_resolve_standard_timezone() {
        let mut resolver = TimeZoneResolver::new();

        let tz = resolver
            .resolve("America/New_York")
            .expect("should resolve");
        assert_eq!(tz, Tz::America__New_York);
    }

    #[test]
    fn test_resolve_unknown_timezone() {
        let mut resolver = TimeZoneResolver::new();
        assert!(matches!(
            resolver.resolve("Nowhere/Special"),
            Err(ConversionError::UnknownTimezone(_))
        ));
    }

    #[test]
    fn test_normalize_windows_timezone() {
        assert_eq!(normalize_tzid("Eastern Standard Time"), "America/New_York");
        assert_eq!(
            normalize_tzid("Pacific Standard Time"),
            "America/Los_Angeles"
        );
    }

    #[test]
    fn test_normalize_mozilla_prefix() {
        assert_eq!(
            normalize_tzid("/mozilla.org/America/New_York"),
            "America/New_York"
        );
    }

    #[test]
    fn test_normalize_iana_alias() {
        // Europe/Kiev was renamed to Europe/Kyiv
        assert_eq!(normalize_tzid("Europe/Kiev"), "Europe/Kyiv");
        assert_eq!(normalize_tzid("US/Eastern"), "America/New_York");
    }

    #[test]
    fn test_convert_to_utc_basic() {
        let utc = convert_to_utc(naive(2026, 1, 15, 10, 0), Tz::America__New_York)
            .expect("conversion should succeed");

        // In January, EST is UTC-5
        let expected = Utc.with_ymd_and_hms(2026, 1, 15, 15, 0, 0).unwrap();
        assert_eq!(utc, expected);
    }

    #[test]
    fn test_convert_to_utc_gap() {
        let local = naive(2021, 3, 14, 2, 30);

        assert!(matches!(
            convert_to_utc(local, Tz::America__New_York),
            Err(ConversionError::NonExistentTime(_))
        ));

        // 02:30 EST is 03:30 EDT.
        assert_eq!(
            convert_to_utc_lenient(local, Tz::America__New_York),
            Utc.with_ymd_and_hms(2021, 3, 14, 7, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_convert_to_utc_gap_east_of_utc() {
        // 02:30 CET is 03:30 CEST, after the spring-forward at 01:00Z.
        assert_eq!(
            convert_to_utc_lenient(naive(2021, 3, 28, 2, 30), Tz::Europe__Berlin),
            Utc.with_ymd_and_hms(2021, 3, 28, 1, 30, 0).unwrap()
        );
        // Lord Howe springs forward by half an hour.
        assert_eq!(
            convert_to_utc_lenient(naive(2021, 10, 3, 2, 15), Tz::Australia__Lord_Howe),
            Utc.with_ymd_and_hms(2021, 10, 2, 15, 45, 0).unwrap()
        );
    }

    #[test]
    fn test_timezone_caching() {
        let mut resolver = TimeZoneResolver::new();

        resolver
            .resolve("America/New_York")
            .expect("should resolve");
        assert!(resolver.cache.contains_key("America/New_York"));
    }

    #[test]
    fn test_local_to_utc_values() {
        let tz = Some(Tz::America__New_York);

        let date = DateValue::date(2021, 3, 14);
        assert_eq!(local_to_utc(date, tz), date);

        let summer = DateValue::date_time(2021, 7, 1, 9, 0, 0);
        assert_eq!(
            local_to_utc(summer, tz),
            DateValue::date_time(2021, 7, 1, 13, 0, 0)
        );
        assert_eq!(local_to_utc(summer, None), summer);
    }

    #[test]
    fn test_local_to_utc_gap_and_fold() {
        let tz = Some(Tz::America__New_York);

        // 02:30 does not exist on 2021-03-14; it lands on 03:30 EDT.
        let gap = DateValue::date_time(2021, 3, 14, 2, 30, 0);
        assert_eq!(
            local_to_utc(gap, tz),
            DateValue::date_time(2021, 3, 14, 7, 30, 0)
        );

        // 01:30 happens twice on 2021-11-07; the EDT instant comes first.
        let fold = DateValue::date_time(2021, 11, 7, 1, 30, 0);
        assert_eq!(
            local_to_utc(fold, tz),
            DateValue::date_time(2021, 11, 7, 5, 30, 0)
        );
    }

    #[test]
    fn test_local_to_utc_gap_east_of_utc() {
        let tz = Some(Tz::Europe__Berlin);
        let before_gap = DateValue::date_time(2021, 3, 28, 1, 59, 0);
        let in_gap = DateValue::date_time(2021, 3, 28, 2, 30, 0);
        let after_gap = DateValue::date_time(2021, 3, 28, 3, 0, 0);

        assert_eq!(
            local_to_utc(before_gap, tz),
            DateValue::date_time(2021, 3, 28, 0, 59, 0)
        );
        assert_eq!(
            local_to_utc(in_gap, tz),
            DateValue::date_time(2021, 3, 28, 1, 30, 0)
        );
        assert_eq!(
            local_to_utc(after_gap, tz),
            DateValue::date_time(2021, 3, 28, 1, 0, 0)
        );
    }

    #[test]
    fn test_utc_to_local_round_trip() {
        let tz = Some(Tz::Europe__Berlin);
        let utc = DateValue::date_time(2021, 1, 10, 8, 0, 0);
        let local = utc_to_local(utc, tz);
        assert_eq!(local, DateValue::date_time(2021, 1, 10, 9, 0, 0));
        assert_eq!(local_to_utc(local, tz), utc);
    }
}
