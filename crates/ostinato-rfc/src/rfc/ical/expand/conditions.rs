//! Termination conditions (COUNT and UNTIL).

use crate::rfc::ical::core::DateValue;

/// Decides whether an instance may still be emitted.
///
/// Applied only to instances at or after the start of the series, in the
/// order they are produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Unbounded,
    /// Admits the next `remaining` instances.
    Count { remaining: i64 },
    /// Admits instances up to and including the bound.
    Until(DateValue),
}

impl Condition {
    #[must_use]
    pub fn count(count: u32) -> Self {
        Self::Count {
            remaining: i64::from(count),
        }
    }

    #[must_use]
    pub const fn until(bound: DateValue) -> Self {
        Self::Until(bound)
    }

    /// Whether the condition has to observe every instance in order.
    #[must_use]
    pub const fn counts_instances(&self) -> bool {
        matches!(self, Self::Count { .. })
    }

    /// Returns `false` once `candidate` is past the end of the series.
    pub fn apply(&mut self, candidate: &DateValue) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Count { remaining } => {
                *remaining -= 1;
                *remaining >= 0
            }
            Self::Until(bound) => candidate <= bound,
        }
    }
}
