//! Recurrence rule expansion for iCalendar (RFC 5545).
//!
//! `rfc::ical::core` holds the value types, `rfc::ical::parse` turns rule
//! text into them and `rfc::ical::expand` expands rules into ordered
//! instances.

pub mod error;
pub mod rfc;
