use chrono::{NaiveDateTime, TimeZone};
use ostinato_rfc::rfc::ical::core::DateValue;
use ostinato_rfc::rfc::ical::expand::{RecurrenceIterator, parse_recurrence};
use ostinato_rfc::rfc::ical::parse::parse_date_or_datetime;

pub struct RuleCase {
    pub name: &'static str,
    /// `YYYYMMDD` or `YYYYMMDDTHHMMSS`, local to `tzid`.
    pub dt_start: &'static str,
    pub tzid: Option<&'static str>,
    pub lines: &'static str,
    /// Local values in the same form as `dt_start`.
    pub expected: Option<&'static [&'static str]>,
    pub expected_len: Option<usize>,
    pub limit: usize,
    pub advance_to: Option<&'static str>,
}

const NEW_YORK: Option<&str> = Some("America/New_York");

#[expect(clippy::too_many_lines)]
pub fn rule_cases() -> Vec<RuleCase> {
    vec![
        RuleCase {
            name: "daily_count",
            dt_start: "19970902T090000",
            tzid: NEW_YORK,
            lines: "RRULE:FREQ=DAILY;COUNT=3",
            expected: Some(&["19970902T090000", "19970903T090000", "19970904T090000"]),
            expected_len: None,
            limit: 100,
            advance_to: None,
        },
        RuleCase {
            name: "every_ten_days_across_months",
            dt_start: "19970902T090000",
            tzid: NEW_YORK,
            lines: "RRULE:FREQ=DAILY;INTERVAL=10;COUNT=5",
            expected: Some(&[
                "19970902T090000",
                "19970912T090000",
                "19970922T090000",
                "19971002T090000",
                "19971012T090000",
            ]),
            expected_len: None,
            limit: 100,
            advance_to: None,
        },
        RuleCase {
            name: "daily_across_dst_end",
            dt_start: "19971025T090000",
            tzid: NEW_YORK,
            lines: "RRULE:FREQ=DAILY;COUNT=3",
            expected: Some(&["19971025T090000", "19971026T090000", "19971027T090000"]),
            expected_len: None,
            limit: 100,
            advance_to: None,
        },
        RuleCase {
            name: "every_day_in_january",
            dt_start: "19980101T090000",
            tzid: NEW_YORK,
            lines: "RRULE:FREQ=DAILY;UNTIL=20000131T140000Z;BYMONTH=1",
            expected: None,
            expected_len: Some(93),
            limit: 200,
            advance_to: None,
        },
        RuleCase {
            name: "weekly_tuesday_thursday",
            dt_start: "19970902T090000",
            tzid: NEW_YORK,
            lines: "RRULE:FREQ=WEEKLY;UNTIL=19971007T000000Z;WKST=SU;BYDAY=TU,TH",
            expected: Some(&[
                "19970902T090000",
                "19970904T090000",
                "19970909T090000",
                "19970911T090000",
                "19970916T090000",
                "19970918T090000",
                "19970923T090000",
                "19970925T090000",
                "19970930T090000",
                "19971002T090000",
            ]),
            expected_len: None,
            limit: 100,
            advance_to: None,
        },
        RuleCase {
            name: "week_start_monday",
            dt_start: "19970805T090000",
            tzid: NEW_YORK,
            lines: "RRULE:FREQ=WEEKLY;INTERVAL=2;COUNT=4;BYDAY=TU,SU;WKST=MO",
            expected: Some(&[
                "19970805T090000",
                "19970810T090000",
                "19970819T090000",
                "19970824T090000",
            ]),
            expected_len: None,
            limit: 100,
            advance_to: None,
        },
        RuleCase {
            name: "week_start_sunday",
            dt_start: "19970805T090000",
            tzid: NEW_YORK,
            lines: "RRULE:FREQ=WEEKLY;INTERVAL=2;COUNT=4;BYDAY=TU,SU;WKST=SU",
            expected: Some(&[
                "19970805T090000",
                "19970817T090000",
                "19970819T090000",
                "19970831T090000",
            ]),
            expected_len: None,
            limit: 100,
            advance_to: None,
        },
        RuleCase {
            name: "monthly_first_friday",
            dt_start: "19970905T090000",
            tzid: NEW_YORK,
            lines: "RRULE:FREQ=MONTHLY;COUNT=6;BYDAY=1FR",
            expected: Some(&[
                "19970905T090000",
                "19971003T090000",
                "19971107T090000",
                "19971205T090000",
                "19980102T090000",
                "19980206T090000",
            ]),
            expected_len: None,
            limit: 100,
            advance_to: None,
        },
        RuleCase {
            name: "monthly_third_to_last_day",
            dt_start: "19970928T090000",
            tzid: NEW_YORK,
            lines: "RRULE:FREQ=MONTHLY;COUNT=6;BYMONTHDAY=-3",
            expected: Some(&[
                "19970928T090000",
                "19971029T090000",
                "19971128T090000",
                "19971229T090000",
                "19980129T090000",
                "19980226T090000",
            ]),
            expected_len: None,
            limit: 100,
            advance_to: None,
        },
        RuleCase {
            name: "friday_the_thirteenth",
            dt_start: "19970902T090000",
            tzid: NEW_YORK,
            lines: "EXDATE;TZID=America/New_York:19970902T090000\n\
                    RRULE:FREQ=MONTHLY;BYDAY=FR;BYMONTHDAY=13",
            expected: Some(&[
                "19980213T090000",
                "19980313T090000",
                "19981113T090000",
                "19990813T090000",
                "20001013T090000",
            ]),
            expected_len: None,
            limit: 5,
            advance_to: None,
        },
        RuleCase {
            name: "last_work_day_of_month",
            dt_start: "19970930T090000",
            tzid: NEW_YORK,
            lines: "RRULE:FREQ=MONTHLY;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1",
            expected: Some(&[
                "19970930T090000",
                "19971031T090000",
                "19971128T090000",
                "19971231T090000",
                "19980130T090000",
                "19980227T090000",
                "19980331T090000",
            ]),
            expected_len: None,
            limit: 7,
            advance_to: None,
        },
        RuleCase {
            name: "third_tue_wed_thu",
            dt_start: "19970904T090000",
            tzid: NEW_YORK,
            lines: "RRULE:FREQ=MONTHLY;COUNT=3;BYDAY=TU,WE,TH;BYSETPOS=3",
            expected: Some(&["19970904T090000", "19971007T090000", "19971106T090000"]),
            expected_len: None,
            limit: 100,
            advance_to: None,
        },
        RuleCase {
            name: "yearly_every_other_year_in_q1",
            dt_start: "19970310T090000",
            tzid: NEW_YORK,
            lines: "RRULE:FREQ=YEARLY;INTERVAL=2;COUNT=10;BYMONTH=1,2,3",
            expected: Some(&[
                "19970310T090000",
                "19990110T090000",
                "19990210T090000",
                "19990310T090000",
                "20010110T090000",
                "20010210T090000",
                "20010310T090000",
                "20030110T090000",
                "20030210T090000",
                "20030310T090000",
            ]),
            expected_len: None,
            limit: 100,
            advance_to: None,
        },
        RuleCase {
            name: "twentieth_monday",
            dt_start: "19970519T090000",
            tzid: NEW_YORK,
            lines: "RRULE:FREQ=YEARLY;BYDAY=20MO",
            expected: Some(&["19970519T090000", "19980518T090000", "19990517T090000"]),
            expected_len: None,
            limit: 3,
            advance_to: None,
        },
        RuleCase {
            name: "election_day",
            dt_start: "19961105T090000",
            tzid: NEW_YORK,
            lines: "RRULE:FREQ=YEARLY;INTERVAL=4;BYMONTH=11;BYDAY=TU;BYMONTHDAY=2,3,4,5,6,7,8",
            expected: Some(&["19961105T090000", "20001107T090000", "20041102T090000"]),
            expected_len: None,
            limit: 3,
            advance_to: None,
        },
        RuleCase {
            name: "every_fifteen_minutes",
            dt_start: "19970902T090000",
            tzid: NEW_YORK,
            lines: "RRULE:FREQ=MINUTELY;INTERVAL=15;COUNT=6",
            expected: Some(&[
                "19970902T090000",
                "19970902T091500",
                "19970902T093000",
                "19970902T094500",
                "19970902T100000",
                "19970902T101500",
            ]),
            expected_len: None,
            limit: 100,
            advance_to: None,
        },
        RuleCase {
            name: "leap_day_all_day",
            dt_start: "20200229",
            tzid: None,
            lines: "RRULE:FREQ=YEARLY;COUNT=3",
            expected: Some(&["20200229", "20240229", "20280229"]),
            expected_len: None,
            limit: 100,
            advance_to: None,
        },
        RuleCase {
            name: "all_day_with_rdate_and_exdate",
            dt_start: "20210104",
            tzid: None,
            lines: "RRULE:FREQ=WEEKLY;BYDAY=MO,WE;COUNT=4\n\
                    RDATE:20210102\n\
                    EXDATE:20210106",
            expected: Some(&["20210102", "20210104", "20210111", "20210113"]),
            expected_len: None,
            limit: 100,
            advance_to: None,
        },
        RuleCase {
            name: "advance_far_ahead",
            dt_start: "20210101T080000",
            tzid: Some("Europe/Berlin"),
            lines: "RRULE:FREQ=DAILY",
            expected: Some(&["20300615T080000", "20300616T080000"]),
            expected_len: None,
            limit: 2,
            advance_to: Some("20300615T000000"),
        },
    ]
}

/// Parses a local value and converts it to UTC when a zone is given.
pub fn instant(value: &str, tzid: Option<&str>) -> DateValue {
    let local = parse_date_or_datetime(value, 1, 1)
        .unwrap_or_else(|err| panic!("Failed to parse {value}: {err}"))
        .value;
    let (Some(tzid), true) = (tzid, local.is_timed()) else {
        return local;
    };
    let tz: chrono_tz::Tz = tzid.parse().expect("known timezone");
    let naive: NaiveDateTime = local.to_naive_date_time().expect("valid local time");
    let utc = tz
        .from_local_datetime(&naive)
        .earliest()
        .expect("local time exists")
        .naive_utc();
    DateValue::from(utc)
}

pub fn assert_case(case: &RuleCase) {
    let dt_start = parse_date_or_datetime(case.dt_start, 1, 1)
        .unwrap_or_else(|err| panic!("Failed to parse start of {}: {err}", case.name))
        .value;
    let mut iter = parse_recurrence(case.lines, dt_start, case.tzid)
        .unwrap_or_else(|err| panic!("Failed to build {}: {err}", case.name));

    if let Some(target) = case.advance_to {
        iter.advance_to(instant(target, case.tzid));
    }
    let actual: Vec<DateValue> = iter.take(case.limit).collect();

    if let Some(expected) = case.expected {
        let expected: Vec<DateValue> = expected
            .iter()
            .map(|value| instant(value, case.tzid))
            .collect();
        assert_eq!(actual, expected, "Case {} did not match", case.name);
    }

    if let Some(expected_len) = case.expected_len {
        assert_eq!(
            actual.len(),
            expected_len,
            "Case {} expected {} occurrences",
            case.name,
            expected_len
        );
    }
}
