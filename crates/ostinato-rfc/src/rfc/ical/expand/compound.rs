//! Merging and exclusion across recurrence sources.

use crate::rfc::ical::core::DateValue;

use super::iterator::{BoxedRecurrenceIterator, RecurrenceIterator};

/// One source with a one-element lookahead.
struct Source {
    iter: BoxedRecurrenceIterator,
    head: Option<DateValue>,
}

impl Source {
    const fn new(iter: BoxedRecurrenceIterator) -> Self {
        Self { iter, head: None }
    }

    fn peek(&mut self) -> Option<DateValue> {
        if self.head.is_none() {
            self.head = self.iter.next();
        }
        self.head
    }

    fn skip_before(&mut self, target: DateValue) {
        if self.head.is_some_and(|head| head >= target) {
            return;
        }
        self.head = None;
        self.iter.advance_to(target);
    }
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source").field("head", &self.head).finish_non_exhaustive()
    }
}

/// The ascending union of the included sources, minus every instant equal
/// to one produced by an excluded source.
///
/// Equality follows the total order of [`DateValue`], so a bare date never
/// excludes a timed instant on the same day or the other way around.
#[derive(Debug)]
pub struct CompoundIterator {
    included: Vec<Source>,
    excluded: Vec<Source>,
    pending: Option<DateValue>,
}

impl CompoundIterator {
    #[must_use]
    pub fn new(
        included: Vec<BoxedRecurrenceIterator>,
        excluded: Vec<BoxedRecurrenceIterator>,
    ) -> Self {
        Self {
            included: included.into_iter().map(Source::new).collect(),
            excluded: excluded.into_iter().map(Source::new).collect(),
            pending: None,
        }
    }

    fn fetch(&mut self) -> Option<DateValue> {
        loop {
            let candidate = self.included.iter_mut().filter_map(Source::peek).min()?;
            for source in &mut self.included {
                if source.head == Some(candidate) {
                    source.head = None;
                }
            }
            if !self.is_excluded(candidate) {
                return Some(candidate);
            }
            tracing::trace!(excluded = %candidate, "Dropped excluded instant");
        }
    }

    fn is_excluded(&mut self, candidate: DateValue) -> bool {
        self.excluded.iter_mut().any(|source| {
            source.skip_before(candidate);
            source.peek() == Some(candidate)
        })
    }
}

impl Iterator for CompoundIterator {
    type Item = DateValue;

    fn next(&mut self) -> Option<DateValue> {
        self.pending.take().or_else(|| self.fetch())
    }
}

impl RecurrenceIterator for CompoundIterator {
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
        for source in &mut self.included {
            source.skip_before(target);
        }
    }
}
