//! The RRULE pull-iterator.

use chrono_tz::Tz;
use ostinato_core::config::Limits;

use crate::rfc::ical::core::DateValue;

use super::builder::DateBuilder;
use super::conditions::Condition;
use super::generators::{Field, Step};
use super::instances::InstanceGenerator;
use super::iterator::RecurrenceIterator;
use super::timezone::{local_to_utc, utc_to_local};

/// Expands one recurrence rule.
///
/// Generation runs in the rule's local time; every returned instant of a
/// timed rule is converted to UTC. Once exhausted, or stopped by a safety
/// ceiling, the iterator stays empty.
#[derive(Debug, Clone)]
pub struct RRuleIterator {
    dt_start_utc: DateValue,
    tz: Option<Tz>,
    condition: Condition,
    instances: InstanceGenerator,
    builder: DateBuilder,
    /// Year and month may be skipped directly in `advance_to`.
    can_shortcut: bool,
    max_priming_steps: u32,
    pending: Option<DateValue>,
    /// Last instant produced in UTC. Instants that do not move past it are
    /// dropped, which keeps output ascending across DST transitions.
    last_utc: Option<DateValue>,
    done: bool,
}

impl RRuleIterator {
    /// ## Summary
    /// Primes the generators and buffers the first instant at or after
    /// `dt_start`.
    ///
    /// `builder` must be seeded at, or at the start of the BYSETPOS window
    /// holding, `dt_start`. Candidates before `dt_start` are discarded
    /// without being counted by the condition.
    #[must_use]
    pub(crate) fn new(
        dt_start: DateValue,
        tz: Option<Tz>,
        condition: Condition,
        instances: InstanceGenerator,
        builder: DateBuilder,
        can_shortcut: bool,
        limits: &Limits,
    ) -> Self {
        let mut iter = Self {
            dt_start_utc: local_to_utc(dt_start, tz),
            tz,
            condition,
            instances,
            builder,
            can_shortcut,
            max_priming_steps: limits.max_priming_steps,
            pending: None,
            last_utc: None,
            done: false,
        };

        let primed = iter.instances.cascade_mut().prime(
            &mut iter.builder,
            Field::Year,
            limits.max_priming_steps,
        );
        if primed == Step::Produced(()) {
            iter.buffer_first();
        } else {
            iter.done = true;
        }

        tracing::debug!(
            dt_start = %dt_start,
            tz = ?tz,
            first = ?iter.pending,
            can_shortcut,
            skips_sub_day = iter.instances.cascade_mut().skips_sub_day(),
            "Created recurrence iterator"
        );
        iter
    }

    fn buffer_first(&mut self) {
        while let Some(instance) = self.generate_instance() {
            if instance < self.dt_start_utc {
                continue;
            }
            if self.condition.apply(&instance) {
                self.pending = Some(instance);
            } else {
                self.done = true;
            }
            return;
        }
        self.done = true;
    }

    /// Next instant in UTC that passed the DST watermark, before the
    /// condition is applied.
    fn generate_instance(&mut self) -> Option<DateValue> {
        loop {
            match self.instances.generate(&mut self.builder) {
                Step::Produced(local) => {
                    self.instances.cascade_mut().work_done();
                    let utc = local_to_utc(local, self.tz);
                    if self.last_utc.is_some_and(|last| utc <= last) {
                        tracing::trace!(
                            local = %local,
                            utc = %utc,
                            "Dropped non-advancing instant"
                        );
                        continue;
                    }
                    self.last_utc = Some(utc);
                    return Some(utc);
                }
                Step::Exhausted => {
                    tracing::trace!("Recurrence exhausted");
                    return None;
                }
                Step::ShortCircuited => return None,
            }
        }
    }

    /// Next instant that passes the condition.
    fn fetch(&mut self) -> Option<DateValue> {
        if self.done {
            return None;
        }
        let instance = self.generate_instance().filter(|i| self.condition.apply(i));
        if instance.is_none() {
            self.done = true;
        }
        instance
    }
}

impl Iterator for RRuleIterator {
    type Item = DateValue;

    fn next(&mut self) -> Option<DateValue> {
        self.pending.take().or_else(|| self.fetch())
    }
}

impl RecurrenceIterator for RRuleIterator {
    fn has_next(&mut self) -> bool {
        if self.pending.is_none() {
            self.pending = self.fetch();
        }
        self.pending.is_some()
    }

    fn advance_to(&mut self, target: DateValue) {
        if let Some(pending) = self.pending {
            if target <= pending {
                return;
            }
            self.pending = None;
        }
        if self.done {
            return;
        }

        let local_target = utc_to_local(target, self.tz);
        if self.can_shortcut && self.builder.compare_to(&local_target).is_lt() {
            tracing::trace!(target = %target, "Skipping ahead to target");
            let skipped = self.instances.cascade_mut().skip_to(
                &mut self.builder,
                &local_target,
                self.max_priming_steps,
            );
            if skipped != Step::Produced(()) {
                self.done = true;
                return;
            }
        }

        while let Some(instance) = self.fetch() {
            if instance >= target {
                self.pending = Some(instance);
                return;
            }
        }
    }
}
