//! Plain-text rendering of a summary view.
//!
//! We keep formatting code in one place so:
//! - the presenter stays free of layout concerns
//! - output changes are localized (important for snapshot tests)

use crate::plot::render_sparkline;
use crate::present::{FeatureRow, Results, SummaryView, TrendCell};

/// Sparkline size in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendSize {
    pub cols: usize,
    pub rows: usize,
}

impl Default for TrendSize {
    fn default() -> Self {
        Self { cols: 28, rows: 3 }
    }
}

const MARK_ALERT: &str = "!";
const MARK_OK: &str = " ";

/// Format a view for stdout: summary line, then a table.
///
/// Rows breaching tolerance are prefixed with `!`.
pub fn format_summary(view: &SummaryView, trend: TrendSize) -> String {
    let mut out = String::new();

    let Results::Shown(table) = &view.results else {
        return out;
    };

    out.push_str(&table.summary_line);
    out.push('\n');

    let name_w = table
        .rows
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Feature".len());
    let latest_w = table
        .rows
        .iter()
        .map(|r| r.latest.text.chars().count())
        .max()
        .unwrap_or(0)
        .max("Latest".len());

    out.push_str(&format!("  {:<name_w$}  {:>latest_w$}  Trend\n", "Feature", "Latest"));
    out.push_str(&format!("  {}  {}  {}\n", "-".repeat(name_w), "-".repeat(latest_w), "-".repeat(trend.cols)));

    for row in &table.rows {
        let trend_lines = trend_lines(row, trend);
        let mark = if row.out_of_tolerance { MARK_ALERT } else { MARK_OK };

        for (i, line) in trend_lines.iter().enumerate() {
            let line = line.trim_end();
            if i == 0 {
                out.push_str(
                    format!("{mark} {:<name_w$}  {:>latest_w$}  {line}", row.name, row.latest.text)
                        .trim_end(),
                );
            } else {
                out.push_str(format!("  {:<name_w$}  {:>latest_w$}  {line}", "", "").trim_end());
            }
            out.push('\n');
        }
    }

    out
}

fn trend_lines(row: &FeatureRow, size: TrendSize) -> Vec<String> {
    match &row.trend {
        TrendCell::NoData => vec!["No data".to_string()],
        TrendCell::Blank => vec![String::new()],
        TrendCell::Plot(_) => {
            let lines = render_sparkline(&row.feature.points, size.cols, size.rows);
            if lines.is_empty() { vec![String::new()] } else { lines }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Feature, MeasurementPoint, Summary};
    use crate::present::SummaryTablePresenter;

    #[test]
    fn table_layout_golden() {
        let summary = Summary {
            features: vec![
                Feature {
                    name: "BORE_A".into(),
                    latest: Some(0.2),
                    points: vec![MeasurementPoint { deviation: Some(0.2), upper_tol: Some(0.1), ..MeasurementPoint::default() }],
                },
                Feature { name: "X".into(), latest: None, points: vec![] },
            ],
            reports_analyzed: Some(2.0),
            errors: vec![],
        };
        let view = SummaryTablePresenter::default().present(&summary);
        let txt = format_summary(&view, TrendSize { cols: 5, rows: 1 });

        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[0], "Features: 2 • Reports analyzed: 2");
        assert_eq!(lines[1], "  Feature  Latest  Trend");
        assert_eq!(lines[2], "  -------  ------  -----");
        assert!(lines[3].starts_with("! BORE_A   0.2000  "));
        assert_eq!(lines[4], "  X             —  No data");
    }

    #[test]
    fn hidden_results_format_to_nothing() {
        let view = SummaryTablePresenter::default().present(&Summary::default());
        assert!(format_summary(&view, TrendSize::default()).is_empty());
    }
}
