//! Shared building blocks for the ostinato workspace: error types,
//! engine limits configuration and constants.

pub mod config;
pub mod constants;
pub mod error;
