//! Tracing setup.
//!
//! Filter comes from `CMMV_LOG` (e.g. `CMMV_LOG=cmm_compare=debug`), default
//! `warn`. The TUIs own the terminal, so they log to a file instead of stderr.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "CMMV_LOG";
pub const LOG_FILE: &str = "cmmv.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File,
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(target: LogTarget) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    match target {
        LogTarget::Stderr => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init();
        }
        LogTarget::File => {
            match OpenOptions::new().create(true).append(true).open(LOG_FILE) {
                Ok(file) => {
                    let _ = tracing_subscriber::fmt()
                        .with_env_filter(filter)
                        .with_ansi(false)
                        .with_writer(Mutex::new(file))
                        .try_init();
                }
                // No writable cwd: drop logs rather than corrupt the screen.
                Err(_) => {
                    let _ = tracing_subscriber::fmt()
                        .with_env_filter(filter)
                        .with_writer(std::io::sink)
                        .try_init();
                }
            }
        }
    }
}
