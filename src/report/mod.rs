//! Reporting utilities: text tables for the `summary` command.

pub mod format;

pub use format::{TrendSize, format_summary};
