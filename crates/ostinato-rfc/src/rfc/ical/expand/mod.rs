//! Recurrence expansion (RFC 5545 RRULE / RDATE / EXDATE).
//!
//! This module turns rule parameters into ordered instants:
//! - Field generators and filters compose candidate dates field by field
//! - Instance generators apply BYSETPOS and termination conditions
//! - Pull iterators expose the result with a forward-only `advance_to`

mod builder;
mod compound;
mod conditions;
mod error;
mod factory;
mod filters;
mod generators;
mod instances;
mod int_set;
mod iterator;
mod rdate_iter;
mod rrule_iter;
mod timezone;

pub use compound::CompoundIterator;
pub use error::{RecurrenceError, RecurrenceResult};
pub use factory::{
    create_rdate_iterator, create_recurrence_iterator, create_recurrence_iterator_with_limits,
    except, join, parse_recurrence,
};
pub use int_set::IntSet;
pub use iterator::{BoxedRecurrenceIterator, RecurrenceIterator};
pub use rdate_iter::RDateIterator;
pub use rrule_iter::RRuleIterator;
pub use timezone::{
    ConversionError, TimeZoneResolver, convert_to_utc, convert_to_utc_lenient, local_to_utc,
    utc_to_local,
};
