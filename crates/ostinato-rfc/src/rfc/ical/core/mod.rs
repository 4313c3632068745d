//! iCalendar value models used by recurrence expansion (RFC 5545).
//!
//! These types are the structured form a rule takes after parsing:
//! - Date and date-time values with a total order
//! - Calendar arithmetic shared by generators and filters
//! - Rule parameters (frequency, interval, by-parts, termination)

pub mod calendar;
mod datetime;
mod rrule;

pub use datetime::{DateValue, TimeOfDay};
pub use rrule::{Frequency, RRule, Termination, Weekday, WeekdayNum};
