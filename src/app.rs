//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging for the chosen front-end
//! - dispatches to the summary table, the dashboard or the comparison viewer

use clap::Parser;

use crate::cli::{Command, CompareArgs, DashboardArgs, SummaryArgs};
use crate::compare::{DocumentLocation, DualPageComparator, PdfDocument};
use crate::data::{BackendClient, SummarySource};
use crate::error::AppError;
use crate::logging::{self, LogTarget};
use crate::present::{Outcome, SummaryTablePresenter};
use crate::report::{TrendSize, format_summary};
use crate::trend::SparklineOptions;

/// Entry point for the `cmmv` binary.
pub fn run() -> Result<(), AppError> {
    // `cmmv` alone (or with only flags) opens the dashboard.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Summary(args) => {
            logging::init(LogTarget::Stderr);
            handle_summary(args)
        }
        Command::Dashboard(args) => {
            logging::init(LogTarget::File);
            handle_dashboard(args)
        }
        Command::Compare(args) => {
            logging::init(LogTarget::File);
            handle_compare(args)
        }
    }
}

fn handle_summary(args: SummaryArgs) -> Result<(), AppError> {
    let client = BackendClient::from_env(args.server.server.as_deref());
    let form = args.filters.to_form();

    if args.json {
        let request = form.to_request().map_err(|msg| AppError::new(2, msg))?;
        let summary = client.fetch_summary(&request)?;
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| AppError::new(3, format!("Failed to encode summary: {e}")))?;
        println!("{json}");
        return Ok(());
    }

    if form.to_request().is_ok() {
        eprintln!("{}", SummaryTablePresenter::pending_status().message);
    }
    let view = SummaryTablePresenter::new(SparklineOptions::default()).submit(&form, &client);

    let table = format_summary(&view, TrendSize { cols: args.width, rows: args.height });
    if !table.is_empty() {
        print!("{table}");
    }

    match view.outcome {
        Outcome::Invalid => Err(AppError::new(2, view.status.message)),
        Outcome::Rejected | Outcome::Failed => Err(AppError::new(3, view.status.message)),
        Outcome::Empty | Outcome::Complete => {
            eprintln!("{}", view.status.message);
            Ok(())
        }
    }
}

fn handle_dashboard(args: DashboardArgs) -> Result<(), AppError> {
    let client = BackendClient::from_env(args.server.server.as_deref());
    crate::tui::run_dashboard(client, args.filters.to_form(), args.submit)
}

fn handle_compare(args: CompareArgs) -> Result<(), AppError> {
    let client = BackendClient::from_env(args.server.server.as_deref());

    let left = DocumentLocation::parse(&args.left);
    let right = DocumentLocation::parse(&args.right);
    let load = |loc: &DocumentLocation| {
        PdfDocument::open(loc, &client)
            .map_err(|e| AppError::new(e.exit_code(), format!("Error loading PDFs: {}", e.message())))
    };
    let left_doc = load(&left)?;
    let right_doc = load(&right)?;

    let mut comparator = DualPageComparator::new(Box::new(left_doc), Box::new(right_doc));
    comparator.set_scale(args.scale);
    comparator.go_to(args.page, &client);
    if args.diff {
        comparator.toggle_overlay(&client);
    }

    crate::tui::viewer::run(comparator, client)
}

/// Rewrite argv so `cmmv` defaults to `cmmv dashboard`.
///
/// Rules:
/// - `cmmv`                        -> `cmmv dashboard`
/// - `cmmv --folder /data ...`     -> `cmmv dashboard --folder /data ...`
/// - `cmmv --help/--version/-h`    -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("dashboard".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "summary" | "dashboard" | "compare");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "dashboard".to_string());
        return argv;
    }

    argv
}
