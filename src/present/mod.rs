//! Inspection summary presentation.
//!
//! Takes the dashboard's filter form, talks to a [`SummarySource`] and turns the
//! response into a [`SummaryView`]: a status line plus (maybe) a results table.
//! Front-ends (CLI table, TUI) only decide how the view looks.
//!
//! The view reports what should happen to the results section rather than
//! always replacing it: a local validation error leaves the previous table in
//! place, while backend failures hide it.

use chrono::NaiveDate;

use crate::data::SummarySource;
use crate::domain::{Feature, Summary, SummaryRequest, to_fixed};
use crate::tolerance::is_out_of_tolerance;
use crate::trend::{self, SparklineLayout, SparklineOptions};

pub const MSG_MISSING_FOLDER: &str = "Please enter a folder path.";
pub const MSG_SCANNING: &str = "Scanning reports...";
pub const MSG_NO_ROWS: &str = "No feature rows were found with the current filters.";
pub const MSG_COMPLETE: &str = "Complete.";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw form input, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryForm {
    pub folder: String,
    pub start_date: String,
    pub end_date: String,
    pub part_type: String,
    pub die_number: String,
}

impl SummaryForm {
    /// Validate and build the request body. Blank optional fields become `null`.
    pub fn to_request(&self) -> Result<SummaryRequest, String> {
        let folder = self.folder.trim();
        if folder.is_empty() {
            return Err(MSG_MISSING_FOLDER.to_string());
        }

        Ok(SummaryRequest {
            folder: folder.to_string(),
            start_date: date_field("start", &self.start_date)?,
            end_date: date_field("end", &self.end_date)?,
            part_type: optional(&self.part_type),
            die_number: optional(&self.die_number),
        })
    }
}

fn optional(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn date_field(label: &str, raw: &str) -> Result<Option<String>, String> {
    let Some(value) = optional(raw) else {
        return Ok(None);
    };
    match NaiveDate::parse_from_str(&value, DATE_FORMAT) {
        Ok(_) => Ok(Some(value)),
        Err(e) => Err(format!("Invalid {label} date '{value}' (expected YYYY-MM-DD): {e}")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub message: String,
    pub tone: StatusTone,
}

impl Status {
    pub fn info(message: impl Into<String>) -> Self {
        Self { message: message.into(), tone: StatusTone::Info }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { message: message.into(), tone: StatusTone::Error }
    }

    pub fn is_error(&self) -> bool {
        self.tone == StatusTone::Error
    }
}

/// How a submission ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Form failed local validation; nothing was sent.
    Invalid,
    /// Backend answered non-2xx.
    Rejected,
    /// Transport or decode failure.
    Failed,
    /// Backend answered but returned no feature rows.
    Empty,
    Complete,
}

/// Sign class of the latest deviation (drives cell coloring).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviationClass {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LatestCell {
    /// Four decimals, or `—` when the backend sent no usable value.
    pub text: String,
    pub class: Option<DeviationClass>,
}

impl LatestCell {
    pub fn new(latest: Option<f64>) -> Self {
        match latest {
            Some(v) => {
                // no "-0.0000"
                let v = if v == 0.0 { 0.0 } else { v };
                let class = if v > 0.0 {
                    DeviationClass::Positive
                } else if v < 0.0 {
                    DeviationClass::Negative
                } else {
                    DeviationClass::Neutral
                };
                Self { text: to_fixed(v, 4), class: Some(class) }
            }
            None => Self { text: "—".to_string(), class: None },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrendCell {
    Plot(SparklineLayout),
    /// Points exist but none has a finite deviation.
    Blank,
    NoData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub name: String,
    pub latest: LatestCell,
    pub trend: TrendCell,
    pub out_of_tolerance: bool,
    /// Source feature, kept for re-rendering at other resolutions.
    pub feature: Feature,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultsTable {
    pub rows: Vec<FeatureRow>,
    /// `Features: N • Reports analyzed: M • K files skipped`
    pub summary_line: String,
}

/// What happens to the results section.
#[derive(Debug, Clone, PartialEq)]
pub enum Results {
    Unchanged,
    Hidden,
    Shown(ResultsTable),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryView {
    pub status: Status,
    pub results: Results,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryTablePresenter {
    options: SparklineOptions,
}

impl SummaryTablePresenter {
    pub fn new(options: SparklineOptions) -> Self {
        Self { options }
    }

    /// Status to show while a request is in flight.
    pub fn pending_status() -> Status {
        Status::info(MSG_SCANNING)
    }

    /// Handle a form submission end to end.
    pub fn submit<S: SummarySource + ?Sized>(&self, form: &SummaryForm, source: &S) -> SummaryView {
        let request = match form.to_request() {
            Ok(req) => req,
            Err(message) => {
                return SummaryView {
                    status: Status::error(message),
                    results: Results::Unchanged,
                    outcome: Outcome::Invalid,
                };
            }
        };

        match source.fetch_summary(&request) {
            Ok(summary) => self.present(&summary),
            Err(crate::data::ClientError::Rejected { body, .. }) => SummaryView {
                status: Status::error(format!("Error: {body}")),
                results: Results::Hidden,
                outcome: Outcome::Rejected,
            },
            Err(err) => SummaryView {
                status: Status::error(format!("Request failed: {err}")),
                results: Results::Hidden,
                outcome: Outcome::Failed,
            },
        }
    }

    /// Build the view for a successful response.
    pub fn present(&self, summary: &Summary) -> SummaryView {
        let skipped = summary.errors.len();

        let (mut status, results, outcome) = if summary.features.is_empty() {
            (Status::info(MSG_NO_ROWS), Results::Hidden, Outcome::Empty)
        } else {
            let rows = summary.features.iter().map(|f| self.row(f)).collect();
            let table = ResultsTable { rows, summary_line: summary_line(summary) };
            (Status::info(MSG_COMPLETE), Results::Shown(table), Outcome::Complete)
        };

        // Skipped files win over both the "no rows" and "complete" messages.
        if skipped > 0 {
            status = Status::info(format!("Completed with {skipped} skipped file(s)."));
        }

        SummaryView { status, results, outcome }
    }

    fn row(&self, feature: &Feature) -> FeatureRow {
        let trend = if feature.points.is_empty() {
            TrendCell::NoData
        } else {
            match trend::layout(&feature.points, self.options) {
                Some(layout) => TrendCell::Plot(layout),
                None => TrendCell::Blank,
            }
        };

        FeatureRow {
            name: feature.name.clone(),
            latest: LatestCell::new(feature.latest),
            trend,
            out_of_tolerance: is_out_of_tolerance(&feature.points),
            feature: feature.clone(),
        }
    }
}

fn summary_line(summary: &Summary) -> String {
    let mut line = format!("Features: {}", summary.features.len());
    if let Some(n) = summary.reports_analyzed {
        line.push_str(&format!(" • Reports analyzed: {}", fmt_count(n)));
    }
    if !summary.errors.is_empty() {
        line.push_str(&format!(" • {} files skipped", summary.errors.len()));
    }
    line
}

fn fmt_count(n: f64) -> String {
    if n.fract() == 0.0 { format!("{n:.0}") } else { n.to_string() }
}
