//! Command-line parsing for the inspection dashboard and comparison viewer.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! presentation code. Every subcommand accepts `--server` to point at a
//! backend other than the one in `CMMV_BACKEND_URL`.

use clap::{Args, Parser, Subcommand};

use crate::present::SummaryForm;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "cmmv", version, about = "CMM inspection dashboard and PDF comparison viewer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch an inspection summary once and print it as a table.
    Summary(SummaryArgs),
    /// Launch the interactive inspection dashboard.
    Dashboard(DashboardArgs),
    /// Compare two PDF documents page by page with text-diff overlays.
    Compare(CompareArgs),
}

/// Backend selection shared by all subcommands.
#[derive(Debug, Args, Clone)]
pub struct ServerArgs {
    /// Backend base URL (overrides CMMV_BACKEND_URL).
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,
}

/// Filter form fields. Blank values are sent as null.
#[derive(Debug, Args, Clone, Default)]
pub struct FilterArgs {
    /// Folder containing CMM report PDFs (on the backend host).
    #[arg(short = 'f', long, default_value = "")]
    pub folder: String,

    /// Only reports modified on or after this date (YYYY-MM-DD).
    #[arg(long, default_value = "")]
    pub start_date: String,

    /// Only reports modified on or before this date (YYYY-MM-DD).
    #[arg(long, default_value = "")]
    pub end_date: String,

    /// Part type filter (e.g. 675, 50TT, 50TL).
    #[arg(long, default_value = "")]
    pub part_type: String,

    /// Die number filter.
    #[arg(long, default_value = "")]
    pub die_number: String,
}

impl FilterArgs {
    pub fn to_form(&self) -> SummaryForm {
        SummaryForm {
            folder: self.folder.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            part_type: self.part_type.clone(),
            die_number: self.die_number.clone(),
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    #[command(flatten)]
    pub server: ServerArgs,

    /// Sparkline width (columns).
    #[arg(long, default_value_t = 28)]
    pub width: usize,

    /// Sparkline height (rows).
    #[arg(long, default_value_t = 3)]
    pub height: usize,

    /// Print the raw summary JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct DashboardArgs {
    /// Initial form values.
    #[command(flatten)]
    pub filters: FilterArgs,

    #[command(flatten)]
    pub server: ServerArgs,

    /// Submit the prefilled form on startup.
    #[arg(long)]
    pub submit: bool,
}

#[derive(Debug, Args, Clone)]
pub struct CompareArgs {
    /// Left document (path or http(s) URL).
    #[arg(long, value_name = "PDF")]
    pub left: String,

    /// Right document (path or http(s) URL).
    #[arg(long, value_name = "PDF")]
    pub right: String,

    /// Initial page (clamped to the longer document).
    #[arg(long, default_value_t = 1)]
    pub page: i64,

    /// Initial zoom scale.
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,

    /// Start with text-diff overlays on.
    #[arg(long)]
    pub diff: bool,

    #[command(flatten)]
    pub server: ServerArgs,
}
