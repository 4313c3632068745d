//! Builds iterators from rule parameters, literal dates and recurrence text.
//!
//! A rule becomes six field generators (one per field, year first), a list
//! of filters and a condition. By-parts that would generate far more
//! candidates than they keep are applied as filters instead.

use chrono_tz::Tz;
use ostinato_core::config::Limits;
use ostinato_core::constants::MAX_YEAR;

use crate::error::RfcResult;
use crate::rfc::ical::core::calendar::{
    date_from_day_number, day_number, offset_in_week, weekday_of,
};
use crate::rfc::ical::core::{DateValue, Frequency, RRule, Termination, Weekday, WeekdayNum};
use crate::rfc::ical::parse::{
    ParseError, ParseErrorKind, parse_content_line, parse_date_list, parse_rrule, split_lines,
};

use super::builder::DateBuilder;
use super::compound::CompoundIterator;
use super::conditions::Condition;
use super::error::{RecurrenceError, RecurrenceResult};
use super::filters::Filter;
use super::generators::{Field, FieldGenerator};
use super::instances::{Cascade, InstanceGenerator, SetPosGenerator};
use super::int_set::uniquify;
use super::iterator::BoxedRecurrenceIterator;
use super::rdate_iter::RDateIterator;
use super::rrule_iter::RRuleIterator;
use super::timezone::{TimeZoneResolver, local_to_utc};

/// ## Summary
/// Builds an iterator over the instances of `rrule` starting at `dt_start`,
/// with the default [`Limits`].
///
/// `dt_start` is wall-clock time in `tz`; timed instances are returned in
/// UTC. A bare-date start makes every instance a bare date.
///
/// ## Errors
/// Returns a `RecurrenceError` if the interval is zero, `dt_start` is not a
/// real date or a by-part value is out of range.
pub fn create_recurrence_iterator(
    rrule: &RRule,
    dt_start: DateValue,
    tz: Option<Tz>,
) -> RecurrenceResult<RRuleIterator> {
    create_recurrence_iterator_with_limits(rrule, dt_start, tz, &Limits::default())
}

/// ## Summary
/// Like [`create_recurrence_iterator`], with explicit safety ceilings.
///
/// ## Errors
/// Returns a `RecurrenceError` if either limit is zero, the interval is
/// zero, `dt_start` is not a real date or a by-part value is out of range.
#[tracing::instrument(skip(rrule, limits), fields(rule = %rrule))]
pub fn create_recurrence_iterator_with_limits(
    rrule: &RRule,
    dt_start: DateValue,
    tz: Option<Tz>,
    limits: &Limits,
) -> RecurrenceResult<RRuleIterator> {
    limits.validate()?;
    validate(rrule, dt_start)?;
    let mut parts = RuleParts::from(rrule);
    parts.reduce_sub_daily_set_pos();

    // BYSETPOS windows are resolved whole, so generation starts at the
    // beginning of the window holding the start.
    let origin = if parts.by_set_pos.is_empty() {
        dt_start
    } else {
        window_start(parts.freq, parts.wkst, dt_start)
    };

    let condition = condition_for(rrule, dt_start, tz);
    let can_shortcut = !condition.counts_instances() && parts.by_set_pos.is_empty();

    let (generators, filters) = parts.generators(dt_start, origin, limits);
    let cascade = Cascade::new(generators, filters, dt_start.is_timed());
    let instances = if parts.by_set_pos.is_empty() {
        InstanceGenerator::Serial(cascade)
    } else {
        InstanceGenerator::SetPos(SetPosGenerator::new(
            cascade,
            &parts.by_set_pos,
            parts.freq,
            parts.wkst,
            limits.max_priming_steps,
        ))
    };

    Ok(RRuleIterator::new(
        dt_start,
        tz,
        condition,
        instances,
        DateBuilder::new(origin),
        can_shortcut,
        limits,
    ))
}

/// ## Summary
/// Builds an iterator over literal instants.
///
/// ## Errors
/// Returns `RecurrenceError::InvalidDate` for a value that is not a real
/// calendar date or time.
pub fn create_rdate_iterator(dates: &[DateValue]) -> RecurrenceResult<RDateIterator> {
    RDateIterator::new(dates)
}

/// Merges iterators into one ascending sequence without duplicates.
#[must_use]
pub fn join(iterators: Vec<BoxedRecurrenceIterator>) -> CompoundIterator {
    CompoundIterator::new(iterators, Vec::new())
}

/// Yields the instants of `included` that `excluded` does not produce.
#[must_use]
pub fn except(
    included: BoxedRecurrenceIterator,
    excluded: BoxedRecurrenceIterator,
) -> CompoundIterator {
    CompoundIterator::new(vec![included], vec![excluded])
}

/// ## Summary
/// Builds the full recurrence set described by `RRULE`, `EXRULE`, `RDATE`
/// and `EXDATE` content lines.
///
/// The start itself is always part of the set. Values ending in `Z` are
/// UTC; values with a `TZID` parameter are local to that zone; any other
/// timed value is local to `tzid`.
///
/// ## Errors
/// Returns `RfcError` if a line cannot be parsed, names another property,
/// refers to an unknown timezone or describes an invalid rule.
#[tracing::instrument(skip(text))]
pub fn parse_recurrence(
    text: &str,
    dt_start: DateValue,
    tzid: Option<&str>,
) -> RfcResult<CompoundIterator> {
    let mut resolver = TimeZoneResolver::new();
    let tz = tzid.map(|id| resolver.resolve(id)).transpose()?;

    let start: BoxedRecurrenceIterator =
        Box::new(create_rdate_iterator(&[local_to_utc(dt_start, tz)])?);
    let mut included = vec![start];
    let mut excluded: Vec<BoxedRecurrenceIterator> = Vec::new();

    for (line_num, line) in split_lines(text) {
        let content = parse_content_line(&line, line_num)?;
        let col = line.find(':').map_or(1, |colon| colon + 2);
        let is_exclusion = content.name.starts_with("EX");
        let iter: BoxedRecurrenceIterator = match content.name.as_str() {
            "RRULE" | "EXRULE" => {
                let rrule = parse_rrule(&content.value, line_num, col)?;
                Box::new(create_recurrence_iterator(&rrule, dt_start, tz)?)
            }
            "RDATE" | "EXDATE" => {
                let zone = match content.param("TZID") {
                    Some(id) => Some(resolver.resolve(id)?),
                    None => tz,
                };
                let dates: Vec<DateValue> = parse_date_list(&content.value, line_num, col)?
                    .into_iter()
                    .map(|date| {
                        if date.is_utc {
                            date.value
                        } else {
                            local_to_utc(date.value, zone)
                        }
                    })
                    .collect();
                Box::new(create_rdate_iterator(&dates)?)
            }
            _ => {
                return Err(ParseError::new(ParseErrorKind::UnknownProperty, line_num, 1)
                    .with_context(content.name.clone())
                    .into());
            }
        };
        if is_exclusion {
            excluded.push(iter);
        } else {
            included.push(iter);
        }
    }

    tracing::debug!(
        included = included.len(),
        excluded = excluded.len(),
        "Parsed recurrence set"
    );
    Ok(CompoundIterator::new(included, excluded))
}

fn validate(rrule: &RRule, dt_start: DateValue) -> RecurrenceResult<()> {
    fn check(
        part: &'static str,
        values: &[i32],
        valid: impl Fn(i32) -> bool,
    ) -> RecurrenceResult<()> {
        match values.iter().find(|&&value| !valid(value)) {
            Some(&value) => Err(RecurrenceError::InvalidByPart { part, value }),
            None => Ok(()),
        }
    }
    let signed = |max: i32| move |value: i32| value != 0 && (-max..=max).contains(&value);

    if rrule.interval == 0 {
        return Err(RecurrenceError::InvalidInterval);
    }
    if !dt_start.is_valid() {
        return Err(RecurrenceError::InvalidDate(dt_start));
    }
    if let Termination::Until(until) = rrule.termination {
        if !until.is_valid() {
            return Err(RecurrenceError::InvalidDate(until));
        }
    }

    check("BYYEAR", &rrule.by_year, |v| (1..=MAX_YEAR).contains(&v))?;
    check("BYMONTH", &rrule.by_month, |v| (1..=12).contains(&v))?;
    check("BYWEEKNO", &rrule.by_week_no, signed(53))?;
    check("BYYEARDAY", &rrule.by_year_day, signed(366))?;
    check("BYMONTHDAY", &rrule.by_month_day, signed(31))?;
    check("BYHOUR", &rrule.by_hour, |v| (0..24).contains(&v))?;
    check("BYMINUTE", &rrule.by_minute, |v| (0..60).contains(&v))?;
    check("BYSECOND", &rrule.by_second, |v| (0..60).contains(&v))?;
    check("BYSETPOS", &rrule.by_set_pos, signed(366))?;
    let ordinals: Vec<i32> = rrule.by_day.iter().map(|day| day.ordinal).collect();
    check("BYDAY", &ordinals, |v| (-53..=53).contains(&v))
}

/// Maps the termination to a condition over UTC instants.
///
/// A bare-date UNTIL on a timed rule admits the whole of that day in local
/// time. A timed UNTIL on a bare-date rule is truncated to its date.
fn condition_for(rrule: &RRule, dt_start: DateValue, tz: Option<Tz>) -> Condition {
    match rrule.termination {
        Termination::Never => Condition::Unbounded,
        Termination::Count(count) => Condition::count(count),
        Termination::Until(until) => {
            let bound = match (dt_start.is_timed(), until.is_timed()) {
                (true, false) => local_to_utc(
                    DateValue::date_time(until.year(), until.month(), until.day(), 23, 59, 59),
                    tz,
                ),
                (false, true) => until.to_date(),
                _ => until,
            };
            Condition::until(bound)
        }
    }
}

/// First day of the year, month or week holding `dt_start`, keeping its
/// time of day.
fn window_start(freq: Frequency, wkst: Weekday, dt_start: DateValue) -> DateValue {
    let (year, month, day) = (dt_start.year(), dt_start.month(), dt_start.day());
    let (year, month, day) = match freq {
        Frequency::Yearly => (year, 1, 1),
        Frequency::Monthly => (year, month, 1),
        Frequency::Weekly => {
            let offset = offset_in_week(weekday_of(year, month, day), wkst);
            date_from_day_number(day_number(year, month, day) - i64::from(offset))
        }
        _ => (year, month, day),
    };
    match dt_start.time() {
        Some(time) => DateValue::date_time(year, month, day, time.hour, time.minute, time.second),
        None => DateValue::date(year, month, day),
    }
}

/// Working copy of the by-parts. Parts are cleared as they are consumed
/// by a generator; whatever is left becomes a filter.
struct RuleParts {
    freq: Frequency,
    interval: u32,
    wkst: Weekday,
    by_year: Vec<i32>,
    by_month: Vec<i32>,
    by_week_no: Vec<i32>,
    by_year_day: Vec<i32>,
    by_month_day: Vec<i32>,
    by_day: Vec<WeekdayNum>,
    by_hour: Vec<i32>,
    by_minute: Vec<i32>,
    by_second: Vec<i32>,
    by_set_pos: Vec<i32>,
}

impl From<&RRule> for RuleParts {
    fn from(rrule: &RRule) -> Self {
        Self {
            freq: rrule.freq,
            interval: rrule.interval,
            wkst: rrule.wkst,
            by_year: rrule.by_year.clone(),
            by_month: rrule.by_month.clone(),
            by_week_no: rrule.by_week_no.clone(),
            by_year_day: rrule.by_year_day.clone(),
            by_month_day: rrule.by_month_day.clone(),
            by_day: rrule.by_day.clone(),
            by_hour: rrule.by_hour.clone(),
            by_minute: rrule.by_minute.clone(),
            by_second: rrule.by_second.clone(),
            by_set_pos: rrule.by_set_pos.clone(),
        }
    }
}

impl RuleParts {
    /// ## Summary
    /// Drops BYSETPOS from sub-daily rules.
    ///
    /// When the frequency field is the only one enumerating several values,
    /// the positions are applied to its list up front. Otherwise they are
    /// ignored: windows of an hour or less combined with set positions
    /// generate an unbounded amount of work before any ceiling applies.
    fn reduce_sub_daily_set_pos(&mut self) {
        if self.by_set_pos.is_empty() {
            return;
        }
        let (own, others) = match self.freq {
            Frequency::Hourly => (&mut self.by_hour, [&self.by_minute, &self.by_second]),
            Frequency::Minutely => (&mut self.by_minute, [&self.by_hour, &self.by_second]),
            Frequency::Secondly => (&mut self.by_second, [&self.by_hour, &self.by_minute]),
            _ => return,
        };
        if !own.is_empty() && others.iter().all(|list| list.len() <= 1) {
            *own = select_positions(own, &self.by_set_pos);
        } else {
            tracing::trace!(freq = %self.freq, "Ignoring BYSETPOS on a sub-daily rule");
        }
        self.by_set_pos.clear();
    }

    /// ## Summary
    /// Chooses a generator for every field and turns the remaining parts
    /// into filters.
    ///
    /// `dt_start` supplies the phase of the frequency field and the default
    /// values of fields the rule leaves open; `origin` seeds the interval-one
    /// generators.
    fn generators(
        &mut self,
        dt_start: DateValue,
        origin: DateValue,
        limits: &Limits,
    ) -> ([FieldGenerator; 6], Vec<Filter>) {
        let freq = self.freq;
        let interval = self.interval;
        let mut filters = Vec::new();

        let mut month = None;
        let mut day = None;
        let mut second = None;
        let mut minute = None;
        let mut hour = None;

        match freq {
            Frequency::Secondly => {
                second = self.freq_level(Field::Second, dt_start, &mut filters);
            }
            Frequency::Minutely => {
                minute = self.freq_level(Field::Minute, dt_start, &mut filters);
            }
            Frequency::Hourly => {
                hour = self.freq_level(Field::Hour, dt_start, &mut filters);
            }
            Frequency::Daily => {
                day = Some(FieldGenerator::serial(Field::Day, interval, dt_start));
            }
            Frequency::Weekly => {
                if self.by_day.is_empty() {
                    day = Some(FieldGenerator::serial(
                        Field::Day,
                        interval.saturating_mul(7),
                        dt_start,
                    ));
                } else {
                    day = Some(FieldGenerator::weekdays(&self.by_day, false));
                    self.by_day.clear();
                    if interval > 1 {
                        filters.push(Filter::week_interval(interval, self.wkst, dt_start));
                    }
                }
            }
            Frequency::Monthly | Frequency::Yearly => {
                if freq == Frequency::Yearly && !self.by_year_day.is_empty() {
                    day = Some(FieldGenerator::year_days(&self.by_year_day));
                    self.by_year_day.clear();
                } else if !self.by_month_day.is_empty() {
                    day = Some(FieldGenerator::month_days(&self.by_month_day));
                    self.by_month_day.clear();
                } else if freq == Frequency::Yearly && !self.by_week_no.is_empty() {
                    day = Some(FieldGenerator::week_numbers(&self.by_week_no, self.wkst));
                    self.by_week_no.clear();
                } else if !self.by_day.is_empty() {
                    let in_year = freq == Frequency::Yearly && self.by_month.is_empty();
                    day = Some(FieldGenerator::weekdays(&self.by_day, in_year));
                    self.by_day.clear();
                } else {
                    if freq == Frequency::Yearly && self.by_month.is_empty() {
                        month = Some(FieldGenerator::by_values(
                            Field::Month,
                            &[i32::from(dt_start.month())],
                        ));
                    }
                    day = Some(FieldGenerator::month_days(&[i32::from(dt_start.day())]));
                }
            }
        }

        let second = second.unwrap_or_else(|| {
            let seconds = or_start(&self.by_second, dt_start.second());
            FieldGenerator::by_values(Field::Second, &seconds)
        });
        let minute = minute.unwrap_or_else(|| {
            if self.by_minute.is_empty() && freq < Frequency::Minutely {
                FieldGenerator::serial(Field::Minute, 1, origin)
            } else {
                let minutes = or_start(&self.by_minute, dt_start.minute());
                FieldGenerator::by_values(Field::Minute, &minutes)
            }
        });
        let hour = hour.unwrap_or_else(|| {
            if self.by_hour.is_empty() && freq < Frequency::Hourly {
                FieldGenerator::serial(Field::Hour, 1, origin)
            } else {
                let hours = or_start(&self.by_hour, dt_start.hour());
                FieldGenerator::by_values(Field::Hour, &hours)
            }
        });
        let day = day.unwrap_or_else(|| self.sub_daily_days(origin));

        if !self.by_day.is_empty() {
            let in_year = freq == Frequency::Yearly && self.by_month.is_empty();
            filters.push(Filter::by_day(&self.by_day, in_year));
        }
        if !self.by_month_day.is_empty() {
            filters.push(Filter::by_month_day(&self.by_month_day));
        }
        if !self.by_year_day.is_empty() {
            filters.push(Filter::by_year_day(&self.by_year_day));
        }
        if !self.by_week_no.is_empty() {
            filters.push(Filter::by_week_no(&self.by_week_no, self.wkst));
        }

        let month = if self.by_month.is_empty() {
            month.unwrap_or_else(|| {
                let step = if freq == Frequency::Monthly { interval } else { 1 };
                FieldGenerator::serial(Field::Month, step, origin)
            })
        } else {
            FieldGenerator::by_values(Field::Month, &self.by_month)
        };

        let year = if self.by_year.is_empty() {
            let step = if freq == Frequency::Yearly { interval } else { 1 };
            FieldGenerator::serial(Field::Year, step, origin)
        } else {
            let years: Vec<i32> = uniquify(&self.by_year)
                .into_iter()
                .filter(|&year| year >= origin.year())
                .collect();
            FieldGenerator::by_values(Field::Year, &years)
        }
        .with_throttle(limits.max_unproductive_years);

        ([year, month, day, hour, minute, second], filters)
    }

    /// The generator for the field matching a sub-daily frequency. An
    /// interval of one with an explicit list enumerates the list; otherwise
    /// the field steps by the interval and the list becomes a filter.
    fn freq_level(
        &self,
        field: Field,
        dt_start: DateValue,
        filters: &mut Vec<Filter>,
    ) -> Option<FieldGenerator> {
        let (values, filter): (&[i32], fn(&[i32]) -> Option<Filter>) = match field {
            Field::Hour => (&self.by_hour, Filter::by_hour),
            Field::Minute => (&self.by_minute, Filter::by_minute),
            _ => (&self.by_second, Filter::by_second),
        };
        if !values.is_empty() && self.interval == 1 {
            return None;
        }
        if !values.is_empty() {
            filters.extend(filter(values));
        }
        Some(FieldGenerator::serial(field, self.interval, dt_start))
    }

    /// Day generator for sub-daily rules: the first of BYMONTHDAY or BYDAY
    /// that is present, or every day.
    fn sub_daily_days(&mut self, origin: DateValue) -> FieldGenerator {
        if !self.by_month_day.is_empty() {
            let days = FieldGenerator::month_days(&self.by_month_day);
            self.by_month_day.clear();
            days
        } else if !self.by_day.is_empty() {
            let days = FieldGenerator::weekdays(&self.by_day, false);
            self.by_day.clear();
            days
        } else {
            FieldGenerator::serial(Field::Day, 1, origin)
        }
    }
}

fn or_start(values: &[i32], start: u8) -> Vec<i32> {
    if values.is_empty() {
        vec![i32::from(start)]
    } else {
        values.to_vec()
    }
}

/// Applies set positions to a list of values.
fn select_positions(values: &[i32], positions: &[i32]) -> Vec<i32> {
    let values = uniquify(values);
    let len = i32::try_from(values.len()).unwrap_or(i32::MAX);
    let selected: Vec<i32> = positions
        .iter()
        .map(|&p| if p < 0 { len + p } else { p - 1 })
        .filter_map(|index| usize::try_from(index).ok())
        .filter_map(|index| values.get(index).copied())
        .collect();
    uniquify(&selected)
}
