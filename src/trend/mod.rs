//! Deviation trend sparklines.
//!
//! A sparkline is a fixed 140×36 plot of a feature's deviations, oldest on the
//! left. The vertical range always covers the tolerance bounds so the guide
//! lines stay visible even when every point is well inside the band.
//!
//! Layout ([`SparklineLayout`]) is computed once and then drawn onto any
//! [`Surface`]; hover hit-testing works on the same layout.

pub mod surface;

use crate::domain::{MeasurementPoint, to_fixed};
use crate::tolerance::{ToleranceBand, is_out_of_tolerance};

pub use surface::{Dash, DrawOp, RecordingSurface, Rgb, Stroke, Surface};

pub const WIDTH: f64 = 140.0;
pub const HEIGHT: f64 = 36.0;
pub const MARGIN: f64 = 3.0;
/// Max distance (logical px) between cursor and point for a hover hit.
pub const HIT_RADIUS: f64 = 6.0;
/// Tooltip sits this far above the cursor.
pub const TOOLTIP_OFFSET: f64 = 10.0;

pub const LINE_COLOR: Rgb = Rgb::hex(0x1e88e5);
pub const ALERT_COLOR: Rgb = Rgb::hex(0xfdecea);
pub const BASELINE_COLOR: Rgb = Rgb::hex(0x9e9e9e);
pub const UPPER_COLOR: Rgb = Rgb::hex(0xc62828);
pub const LOWER_COLOR: Rgb = Rgb::hex(0x2e7d32);

const BASELINE_DASH: Dash = [3.0, 3.0];
const TOLERANCE_DASH: Dash = [2.0, 3.0];
const MARKER_RADIUS: f64 = 1.5;

/// Optional sparkline features.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SparklineOptions {
    /// Record per-point hit targets for hover tooltips.
    pub hover_labels: bool,
    /// Draw a dot at each point.
    pub point_markers: bool,
}

impl SparklineOptions {
    pub fn interactive() -> Self {
        Self { hover_labels: true, point_markers: true }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HitTarget {
    pub x: f64,
    pub y: f64,
    pub label: String,
}

/// Tooltip to show for a hover position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tooltip<'a> {
    pub label: &'a str,
    /// Anchor, horizontally at the cursor and [`TOOLTIP_OFFSET`] above it.
    pub x: f64,
    pub y: f64,
}

/// Precomputed sparkline geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct SparklineLayout {
    pub min: f64,
    pub max: f64,
    /// `max - min`, or `1` for a flat range.
    pub span: f64,
    /// Series breaches its tolerance band.
    pub alert: bool,
    /// Screen coordinates of each deviation, left to right.
    pub points: Vec<(f64, f64)>,
    pub baseline_y: Option<f64>,
    pub upper_y: Option<f64>,
    pub lower_y: Option<f64>,
    pub hits: Vec<HitTarget>,
    pub options: SparklineOptions,
}

/// Compute the sparkline for a series, or `None` when it has no finite deviation.
pub fn layout(points: &[MeasurementPoint], options: SparklineOptions) -> Option<SparklineLayout> {
    let series: Vec<(f64, &MeasurementPoint)> = points
        .iter()
        .filter_map(|p| p.deviation.filter(|d| d.is_finite()).map(|d| (d, p)))
        .collect();
    if series.is_empty() {
        return None;
    }

    let band = ToleranceBand::from_points(points);
    let (min, max) = series
        .iter()
        .map(|&(v, _)| v)
        .chain(band.bounds())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let span = if max - min == 0.0 { 1.0 } else { max - min };

    let y_of = |v: f64| map_y(v, min, span);
    let n = series.len();
    let mapped: Vec<(f64, f64)> = series
        .iter()
        .enumerate()
        .map(|(idx, &(v, _))| (map_x(idx, n), y_of(v)))
        .collect();

    let hits = if options.hover_labels {
        series
            .iter()
            .zip(&mapped)
            .enumerate()
            .map(|(idx, (&(v, p), &(x, y)))| HitTarget { x, y, label: hover_label(idx, v, p) })
            .collect()
    } else {
        Vec::new()
    };

    Some(SparklineLayout {
        min,
        max,
        span,
        alert: is_out_of_tolerance(points),
        points: mapped,
        baseline_y: (min <= 0.0 && max >= 0.0).then(|| y_of(0.0)),
        upper_y: band.upper.map(y_of),
        lower_y: band.lower.map(y_of),
        hits,
        options,
    })
}

/// Lay out and draw in one step. Draws nothing when there is nothing to plot.
pub fn render<S: Surface + ?Sized>(
    points: &[MeasurementPoint],
    surface: &mut S,
    options: SparklineOptions,
) -> Option<SparklineLayout> {
    let layout = layout(points, options)?;
    layout.draw(surface);
    Some(layout)
}

impl SparklineLayout {
    /// Screen y for a value in this layout's range.
    pub fn y_for(&self, value: f64) -> f64 {
        map_y(value, self.min, self.span)
    }

    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S) {
        surface.clear();

        if self.alert {
            surface.fill_rect(0.0, 0.0, WIDTH, HEIGHT, ALERT_COLOR);
        }

        surface.polyline(&self.points, Stroke { color: LINE_COLOR, width: 2.0 });

        if self.options.point_markers {
            for &p in &self.points {
                surface.dot(p, MARKER_RADIUS, LINE_COLOR);
            }
        }

        if let Some(y) = self.baseline_y {
            surface.line((0.0, y), (WIDTH, y), Stroke { color: BASELINE_COLOR, width: 1.0 }, Some(BASELINE_DASH));
        }

        for (y, color) in [(self.upper_y, UPPER_COLOR), (self.lower_y, LOWER_COLOR)] {
            if let Some(y) = y {
                surface.line((0.0, y), (WIDTH, y), Stroke { color, width: 1.0 }, Some(TOLERANCE_DASH));
            }
        }
    }

    /// Tooltip for the point nearest to `(x, y)` within [`HIT_RADIUS`].
    pub fn hit_test(&self, x: f64, y: f64) -> Option<Tooltip<'_>> {
        self.nearest_within(x, y, HIT_RADIUS)
    }

    /// Like [`hit_test`](Self::hit_test) with a caller-chosen radius (coarse
    /// displays such as terminal cells need a wider one).
    pub fn nearest_within(&self, x: f64, y: f64, radius: f64) -> Option<Tooltip<'_>> {
        let mut best: Option<(&HitTarget, f64)> = None;
        for hit in &self.hits {
            let d = ((hit.x - x).powi(2) + (hit.y - y).powi(2)).sqrt();
            if d > radius {
                continue;
            }
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((hit, d));
            }
        }
        best.map(|(hit, _)| Tooltip { label: &hit.label, x, y: y - TOOLTIP_OFFSET })
    }
}

fn map_x(idx: usize, n: usize) -> f64 {
    if n == 1 {
        WIDTH / 2.0
    } else {
        idx as f64 / (n as f64 - 1.0) * (WIDTH - 2.0 * MARGIN) + MARGIN
    }
}

fn map_y(v: f64, min: f64, span: f64) -> f64 {
    HEIGHT - (v - min) / span * (HEIGHT - 2.0 * MARGIN) - MARGIN
}

fn hover_label(idx: usize, value: f64, point: &MeasurementPoint) -> String {
    match point.report.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        Some(report) => format!("{report}: {}", to_fixed(value, 4)),
        None => format!("#{}: {}", idx + 1, to_fixed(value, 4)),
    }
}
