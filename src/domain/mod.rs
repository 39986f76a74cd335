//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - inspection summary payloads (`Summary`, `Feature`, `MeasurementPoint`)
//! - the summary request body (`SummaryRequest`)
//! - text-diff payloads (`TextDiff`, `DiffBox`)

pub mod types;

pub use types::*;
