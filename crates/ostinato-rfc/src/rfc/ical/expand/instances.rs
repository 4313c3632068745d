//! Instance generators.
//!
//! [`Cascade`] composes the field generators and filters into a source of
//! raw candidate instants. [`SetPosGenerator`] wraps it to select BYSETPOS
//! positions out of each year, month or week.

use crate::rfc::ical::core::calendar::{day_number, offset_in_week, weekday_of};
use crate::rfc::ical::core::{DateValue, Frequency, Weekday};

use super::builder::DateBuilder;
use super::filters::Filter;
use super::generators::{Field, FieldGenerator, Step};
use super::int_set::{IntSet, uniquify};

const DAY: usize = Field::Day as usize;
const HOUR: usize = Field::Hour as usize;
const SECOND: usize = Field::Second as usize;

/// Field generators from year down to second, plus the filters every
/// candidate has to pass.
#[derive(Debug, Clone)]
pub struct Cascade {
    generators: [FieldGenerator; 6],
    filters: Vec<Filter>,
    timed: bool,
    /// Hour, minute and second each emit a single value, so they are written
    /// once while priming and never driven again.
    skip_sub_day: bool,
}

impl Cascade {
    /// `generators` are indexed by [`Field`], year first.
    #[must_use]
    pub fn new(generators: [FieldGenerator; 6], filters: Vec<Filter>, timed: bool) -> Self {
        let skip_sub_day = generators[HOUR..]
            .iter()
            .all(FieldGenerator::emits_at_most_one_per_cycle);
        Self {
            generators,
            filters,
            timed,
            skip_sub_day,
        }
    }

    #[must_use]
    pub const fn skips_sub_day(&self) -> bool {
        self.skip_sub_day
    }

    /// The level each call to [`Cascade::generate`] starts from.
    const fn smallest(&self) -> usize {
        if self.skip_sub_day { DAY } else { SECOND }
    }

    /// Tells the year generator an instance was emitted.
    pub const fn work_done(&mut self) {
        self.generators[0].work_done();
    }

    /// ## Summary
    /// Runs the generators from `from` down to, but not including, the
    /// smallest driven level so that the builder holds the first context
    /// at or after its current position.
    ///
    /// A level that is exhausted hands control back to the next larger one.
    /// In the sub-day fast path the hour, minute and second fields are set
    /// from their single values instead.
    ///
    /// Short-circuits after `max_steps` generator calls.
    pub fn prime(&mut self, builder: &mut DateBuilder, from: Field, max_steps: u32) -> Step<()> {
        let smallest = self.smallest();
        let mut level = from as usize;
        let mut steps = 0_u32;
        while level < smallest {
            steps += 1;
            if steps > max_steps {
                tracing::warn!(max_steps, "Priming did not settle, short-circuiting");
                return Step::ShortCircuited;
            }
            match self.generators[level].generate(builder) {
                Step::Produced(_) => level += 1,
                Step::Exhausted if level == 0 => return Step::Exhausted,
                Step::Exhausted => level -= 1,
                Step::ShortCircuited => return Step::ShortCircuited,
            }
        }
        if self.skip_sub_day {
            for field in [Field::Hour, Field::Minute, Field::Second] {
                if let Some(value) = self.generators[field as usize].single_value() {
                    field.set(builder, value);
                }
            }
        }
        Step::Produced(())
    }

    /// ## Summary
    /// Moves `field` to its next value, advancing larger fields as long as
    /// it is exhausted, then primes the smaller levels.
    pub fn jump(&mut self, builder: &mut DateBuilder, field: Field, max_steps: u32) -> Step<()> {
        match self.advance(field as usize, builder) {
            Step::Produced(_) => {}
            Step::Exhausted => return Step::Exhausted,
            Step::ShortCircuited => return Step::ShortCircuited,
        }
        match Field::ALL.get(field as usize + 1) {
            Some(&smaller) => self.prime(builder, smaller, max_steps),
            None => Step::Produced(()),
        }
    }

    /// ## Summary
    /// Moves the year and month generators directly to the year and month
    /// of `target`, skipping every candidate in between.
    ///
    /// Only valid when no condition needs to see the skipped instances.
    /// Years passed over count as work so the throttle does not fire.
    pub fn skip_to(
        &mut self,
        builder: &mut DateBuilder,
        target: &DateValue,
        max_steps: u32,
    ) -> Step<()> {
        let year = target.year();
        let month = i32::from(target.month());

        if builder.year < year {
            loop {
                match self.generators[0].generate(builder) {
                    Step::Produced(value) => {
                        self.work_done();
                        if value >= year {
                            break;
                        }
                    }
                    Step::Exhausted => return Step::Exhausted,
                    Step::ShortCircuited => return Step::ShortCircuited,
                }
            }
            if let step @ (Step::Exhausted | Step::ShortCircuited) =
                self.prime(builder, Field::Month, max_steps)
            {
                return step;
            }
        }

        if builder.year == year && builder.month < month {
            loop {
                match self.generators[1].generate(builder) {
                    Step::Produced(value) if value < month => {}
                    Step::Produced(_) => return self.prime(builder, Field::Day, max_steps),
                    Step::Exhausted => return self.jump(builder, Field::Year, max_steps),
                    Step::ShortCircuited => return Step::ShortCircuited,
                }
            }
        }
        Step::Produced(())
    }

    fn advance(&mut self, level: usize, builder: &mut DateBuilder) -> Step<i32> {
        loop {
            match self.generators[level].generate(builder) {
                Step::Exhausted if level > 0 => match self.advance(level - 1, builder) {
                    Step::Produced(_) => {}
                    other => return other,
                },
                step => return step,
            }
        }
    }

    /// ## Summary
    /// Produces the next candidate that passes every filter.
    ///
    /// Requires the builder to have been primed.
    pub fn generate(&mut self, builder: &mut DateBuilder) -> Step<DateValue> {
        let smallest = self.smallest();
        loop {
            match self.advance(smallest, builder) {
                Step::Produced(_) => {}
                Step::Exhausted => return Step::Exhausted,
                Step::ShortCircuited => return Step::ShortCircuited,
            }
            let candidate = builder.to_value(self.timed);
            if self.filters.iter().all(|filter| filter.matches(&candidate)) {
                return Step::Produced(candidate);
            }
        }
    }
}

/// Selects BYSETPOS positions out of each window of candidates.
#[derive(Debug, Clone)]
pub struct SetPosGenerator {
    cascade: Cascade,
    freq: Frequency,
    wkst: Weekday,
    positions: Vec<i32>,
    /// Largest position when all are positive; accumulation stops there.
    limit: Option<usize>,
    max_priming_steps: u32,
    /// First candidate of the next window, produced while filling this one.
    pushback: Option<DateValue>,
    /// Builder state at the end of the last fill. Emitting a selection moves
    /// the builder back into the window, so generation resumes from here.
    resume: Option<DateBuilder>,
    first: bool,
    done: bool,
    selected: Vec<DateValue>,
    cursor: usize,
}

impl SetPosGenerator {
    #[must_use]
    pub fn new(
        cascade: Cascade,
        positions: &[i32],
        freq: Frequency,
        wkst: Weekday,
        max_priming_steps: u32,
    ) -> Self {
        let positions: Vec<i32> = uniquify(positions)
            .into_iter()
            .filter(|&p| p != 0)
            .collect();
        let limit = match positions.first() {
            Some(&lowest) if lowest > 0 => positions
                .last()
                .and_then(|&highest| usize::try_from(highest).ok()),
            _ => None,
        };
        Self {
            cascade,
            freq,
            wkst,
            positions,
            limit,
            max_priming_steps,
            pushback: None,
            resume: None,
            first: true,
            done: false,
            selected: Vec::new(),
            cursor: 0,
        }
    }

    pub const fn cascade_mut(&mut self) -> &mut Cascade {
        &mut self.cascade
    }

    /// ## Summary
    /// Emits the next selected instance, filling and resolving a new window
    /// whenever the current one is used up.
    ///
    /// Exhaustion of the cascade closes the last window normally. A
    /// short-circuit aborts at once, since a truncated window would resolve
    /// negative positions against the wrong count.
    pub fn generate(&mut self, builder: &mut DateBuilder) -> Step<DateValue> {
        loop {
            if let Some(&next) = self.selected.get(self.cursor) {
                self.cursor += 1;
                builder.set(next);
                return Step::Produced(next);
            }
            if self.done {
                return Step::Exhausted;
            }

            if let Some(resume) = self.resume.take() {
                *builder = resume;
            }
            let mut window = Vec::new();
            if let Some(pushed) = self.pushback.take() {
                window.push(pushed);
            } else if self.first {
                self.first = false;
            } else {
                match self.skip_rest_of_window(builder) {
                    Step::Produced(Some(start)) => window.push(start),
                    Step::Produced(None) => {}
                    Step::Exhausted => return Step::Exhausted,
                    Step::ShortCircuited => return Step::ShortCircuited,
                }
            }

            if let Step::ShortCircuited = self.fill(&mut window, builder) {
                return Step::ShortCircuited;
            }
            self.resume = Some(*builder);
            self.select(&window);
        }
    }

    /// Moves past the remainder of a window that was cut short at the
    /// position limit. Returns the first candidate of the next window when
    /// finding it meant generating it.
    fn skip_rest_of_window(&mut self, builder: &mut DateBuilder) -> Step<Option<DateValue>> {
        let field = match self.freq {
            Frequency::Yearly => Some(Field::Year),
            Frequency::Monthly => Some(Field::Month),
            _ => None,
        };
        match field {
            Some(field) => match self.cascade.jump(builder, field, self.max_priming_steps) {
                Step::Produced(()) => Step::Produced(None),
                Step::Exhausted => Step::Exhausted,
                Step::ShortCircuited => Step::ShortCircuited,
            },
            None => {
                let current = self.window_key(&builder.to_value(false));
                loop {
                    match self.cascade.generate(builder) {
                        Step::Produced(candidate) if self.window_key(&candidate) != current => {
                            return Step::Produced(Some(candidate));
                        }
                        Step::Produced(_) => {}
                        Step::Exhausted => return Step::Exhausted,
                        Step::ShortCircuited => return Step::ShortCircuited,
                    }
                }
            }
        }
    }

    /// Accumulates candidates of the window opened by `window[0]`.
    fn fill(&mut self, window: &mut Vec<DateValue>, builder: &mut DateBuilder) -> Step<()> {
        while self.limit.is_none_or(|limit| window.len() < limit) {
            match self.cascade.generate(builder) {
                Step::Produced(candidate) => match window.first() {
                    Some(start) if self.window_key(start) != self.window_key(&candidate) => {
                        self.pushback = Some(candidate);
                        break;
                    }
                    _ => window.push(candidate),
                },
                Step::Exhausted => {
                    self.done = true;
                    break;
                }
                Step::ShortCircuited => return Step::ShortCircuited,
            }
        }
        Step::Produced(())
    }

    /// Resolves the positions against the window.
    fn select(&mut self, window: &[DateValue]) {
        let len = i32::try_from(window.len()).unwrap_or(i32::MAX);
        let absolute: IntSet = self
            .positions
            .iter()
            .map(|&p| if p < 0 { len + p + 1 } else { p })
            .filter(|p| (1..=len).contains(p))
            .collect();
        self.selected = absolute
            .iter()
            .filter_map(|p| usize::try_from(p - 1).ok())
            .filter_map(|index| window.get(index).copied())
            .collect();
        self.cursor = 0;
    }

    /// Identifies the window holding `value`: its year, month or week (by
    /// the day number of the week's first day).
    fn window_key(&self, value: &DateValue) -> i64 {
        match self.freq {
            Frequency::Yearly => Field::Year.absolute(*value),
            Frequency::Monthly => Field::Month.absolute(*value),
            Frequency::Weekly => {
                let (year, month, day) = (value.year(), value.month(), value.day());
                let offset = offset_in_week(weekday_of(year, month, day), self.wkst);
                day_number(year, month, day) - i64::from(offset)
            }
            Frequency::Daily => Field::Day.absolute(*value),
            Frequency::Hourly => Field::Hour.absolute(*value),
            Frequency::Minutely => Field::Minute.absolute(*value),
            Frequency::Secondly => Field::Second.absolute(*value),
        }
    }
}

/// The instance source of an RRULE iterator.
#[derive(Debug, Clone)]
pub enum InstanceGenerator {
    Serial(Cascade),
    SetPos(SetPosGenerator),
}

impl InstanceGenerator {
    pub fn generate(&mut self, builder: &mut DateBuilder) -> Step<DateValue> {
        match self {
            Self::Serial(cascade) => cascade.generate(builder),
            Self::SetPos(set_pos) => set_pos.generate(builder),
        }
    }

    pub const fn cascade_mut(&mut self) -> &mut Cascade {
        match self {
            Self::Serial(cascade) => cascade,
            Self::SetPos(set_pos) => set_pos.cascade_mut(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::ical::core::WeekdayNum;

    const STEPS: u32 = 1000;

    fn weekdays() -> Vec<WeekdayNum> {
        [
            Weekday::Monday,
            Weekday::Tuesday,
            Weekday::Wednesday,
            Weekday::Thursday,
            Weekday::Friday,
        ]
        .into_iter()
        .map(WeekdayNum::every)
        .collect()
    }

    fn monthly_weekdays(start: DateValue) -> Cascade {
        Cascade::new(
            [
                FieldGenerator::serial(Field::Year, 1, start).with_throttle(100),
                FieldGenerator::serial(Field::Month, 1, start),
                FieldGenerator::weekdays(&weekdays(), false),
                FieldGenerator::by_values(Field::Hour, &[0]),
                FieldGenerator::by_values(Field::Minute, &[0]),
                FieldGenerator::by_values(Field::Second, &[0]),
            ],
            Vec::new(),
            false,
        )
    }

    fn take(
        mut next: impl FnMut(&mut DateBuilder) -> Step<DateValue>,
        builder: &mut DateBuilder,
        n: usize,
    ) -> Vec<DateValue> {
        let mut values = Vec::new();
        while values.len() < n {
            match next(builder) {
                Step::Produced(value) => values.push(value),
                _ => break,
            }
        }
        values
    }

    #[test]
    fn cascade_fast_path_walks_days() {
        let start = DateValue::date(2021, 1, 28);
        let mut cascade = monthly_weekdays(start);
        assert!(cascade.skips_sub_day());

        let mut builder = DateBuilder::new(start);
        assert_eq!(cascade.prime(&mut builder, Field::Year, STEPS), Step::Produced(()));

        let values = take(|b| cascade.generate(b), &mut builder, 25);
        assert_eq!(values[0], DateValue::date(2021, 1, 1));
        assert!(values.contains(&DateValue::date(2021, 1, 29)));
        assert_eq!(values[21], DateValue::date(2021, 2, 1));
        assert!(values.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn cascade_filters_candidates() {
        let start = DateValue::date(2021, 1, 1);
        let mut cascade = Cascade::new(
            [
                FieldGenerator::serial(Field::Year, 1, start),
                FieldGenerator::serial(Field::Month, 1, start),
                FieldGenerator::month_days(&[13]),
                FieldGenerator::by_values(Field::Hour, &[0]),
                FieldGenerator::by_values(Field::Minute, &[0]),
                FieldGenerator::by_values(Field::Second, &[0]),
            ],
            vec![Filter::by_day(&[WeekdayNum::every(Weekday::Friday)], false)],
            false,
        );
        let mut builder = DateBuilder::new(start);
        cascade.prime(&mut builder, Field::Year, STEPS);

        let values = take(|b| cascade.generate(b), &mut builder, 2);
        assert_eq!(
            values,
            vec![DateValue::date(2021, 8, 13), DateValue::date(2022, 5, 13)]
        );
    }

    #[test]
    fn cascade_sub_day_levels() {
        let start = DateValue::date_time(2021, 1, 1, 22, 0, 0);
        let mut cascade = Cascade::new(
            [
                FieldGenerator::serial(Field::Year, 1, start),
                FieldGenerator::serial(Field::Month, 1, start),
                FieldGenerator::serial(Field::Day, 1, start),
                FieldGenerator::serial(Field::Hour, 1, start),
                FieldGenerator::by_values(Field::Minute, &[0, 30]),
                FieldGenerator::by_values(Field::Second, &[0]),
            ],
            Vec::new(),
            true,
        );
        assert!(!cascade.skips_sub_day());

        let mut builder = DateBuilder::new(start);
        cascade.prime(&mut builder, Field::Year, STEPS);
        let values = take(|b| cascade.generate(b), &mut builder, 5);
        assert_eq!(
            values,
            vec![
                DateValue::date_time(2021, 1, 1, 22, 0, 0),
                DateValue::date_time(2021, 1, 1, 22, 30, 0),
                DateValue::date_time(2021, 1, 1, 23, 0, 0),
                DateValue::date_time(2021, 1, 1, 23, 30, 0),
                DateValue::date_time(2021, 1, 2, 0, 0, 0),
            ]
        );
    }

    #[test]
    fn set_pos_selects_last_weekday_of_month() {
        let start = DateValue::date(2021, 1, 1);
        let mut cascade = monthly_weekdays(start);
        let mut builder = DateBuilder::new(start);
        cascade.prime(&mut builder, Field::Year, STEPS);

        let mut set_pos =
            SetPosGenerator::new(cascade, &[-1], Frequency::Monthly, Weekday::Monday, STEPS);
        let values = take(|b| set_pos.generate(b), &mut builder, 3);
        assert_eq!(
            values,
            vec![
                DateValue::date(2021, 1, 29),
                DateValue::date(2021, 2, 26),
                DateValue::date(2021, 3, 31),
            ]
        );
    }

    #[test]
    fn set_pos_positive_positions_stop_early() {
        let start = DateValue::date(2021, 1, 1);
        let mut cascade = monthly_weekdays(start);
        let mut builder = DateBuilder::new(start);
        cascade.prime(&mut builder, Field::Year, STEPS);

        let mut set_pos =
            SetPosGenerator::new(cascade, &[2, 1], Frequency::Monthly, Weekday::Monday, STEPS);
        let values = take(|b| set_pos.generate(b), &mut builder, 4);
        assert_eq!(
            values,
            vec![
                DateValue::date(2021, 1, 1),
                DateValue::date(2021, 1, 4),
                DateValue::date(2021, 2, 1),
                DateValue::date(2021, 2, 2),
            ]
        );
    }

    #[test]
    fn set_pos_short_circuit_is_not_exhaustion() {
        let start = DateValue::date(2021, 1, 1);
        // February 30th never exists.
        let cascade = Cascade::new(
            [
                FieldGenerator::serial(Field::Year, 1, start).with_throttle(10),
                FieldGenerator::by_values(Field::Month, &[2]),
                FieldGenerator::month_days(&[30]),
                FieldGenerator::by_values(Field::Hour, &[0]),
                FieldGenerator::by_values(Field::Minute, &[0]),
                FieldGenerator::by_values(Field::Second, &[0]),
            ],
            Vec::new(),
            false,
        );
        let mut builder = DateBuilder::new(start);
        let mut set_pos =
            SetPosGenerator::new(cascade, &[-1], Frequency::Yearly, Weekday::Monday, STEPS);
        set_pos.cascade_mut().prime(&mut builder, Field::Year, STEPS);
        assert_eq!(set_pos.generate(&mut builder), Step::ShortCircuited);
    }
}
