//! `cmm-compare` library crate.
//!
//! The binary (`cmmv`) is a thin wrapper around this library so that:
//!
//! - tolerance, sparkline and overlay math is testable without a terminal
//! - the backend sits behind traits and can be faked in tests
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod compare;
pub mod data;
pub mod domain;
pub mod error;
pub mod logging;
pub mod plot;
pub mod present;
pub mod report;
pub mod tolerance;
pub mod trend;
pub mod tui;
