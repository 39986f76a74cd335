//! ASCII sparklines for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual checks in a terminal or a log
//! - deterministic output (helpful for golden tests)
//!
//! Glyphs:
//! - trend line: `*`
//! - zero baseline: `-`
//! - upper / lower tolerance: `^` / `v`
//! - alert background: `.`

use crate::trend::{self, Dash, Rgb, Stroke, Surface};

const EMPTY: char = ' ';
const TINT: char = '.';

/// Character grid that maps the 140×36 sparkline canvas onto `cols × rows`.
#[derive(Debug, Clone)]
pub struct AsciiSurface {
    grid: Vec<Vec<char>>,
}

impl AsciiSurface {
    pub fn new(cols: usize, rows: usize) -> Self {
        let cols = cols.max(2);
        let rows = rows.max(1);
        Self {
            grid: vec![vec![EMPTY; cols]; rows],
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.grid.iter().map(|row| row.iter().collect()).collect()
    }

    fn cols(&self) -> usize {
        self.grid[0].len()
    }

    fn rows(&self) -> usize {
        self.grid.len()
    }

    fn cell(&self, x: f64, y: f64) -> (usize, usize) {
        (map_axis(x, trend::WIDTH, self.cols()), map_axis(y, trend::HEIGHT, self.rows()))
    }

    fn is_free(&self, col: usize, row: usize) -> bool {
        matches!(self.grid[row][col], EMPTY | TINT)
    }

    /// Plot a glyph; guide lines never cover the trend line.
    fn put(&mut self, col: usize, row: usize, ch: char, overwrite: bool) {
        if overwrite || self.is_free(col, row) {
            self.grid[row][col] = ch;
        }
    }

    fn draw_segment(&mut self, from: (f64, f64), to: (f64, f64), ch: char) {
        let (x0, y0) = self.cell(from.0, from.1);
        let (x1, y1) = self.cell(to.0, to.1);
        for (c, r) in line_cells(x0, y0, x1, y1) {
            self.put(c, r, ch, true);
        }
    }
}

impl Surface for AsciiSurface {
    fn clear(&mut self) {
        for row in &mut self.grid {
            row.fill(EMPTY);
        }
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, _color: Rgb) {
        let (c0, r0) = self.cell(x, y);
        let (c1, r1) = self.cell(x + w, y + h);
        for row in r0..=r1 {
            for col in c0..=c1 {
                if self.grid[row][col] == EMPTY {
                    self.grid[row][col] = TINT;
                }
            }
        }
    }

    fn polyline(&mut self, points: &[(f64, f64)], _stroke: Stroke) {
        match points {
            [] => {}
            [only] => self.draw_segment(*only, *only, '*'),
            _ => {
                for pair in points.windows(2) {
                    self.draw_segment(pair[0], pair[1], '*');
                }
            }
        }
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), stroke: Stroke, dash: Option<Dash>) {
        let ch = if stroke.color == trend::UPPER_COLOR {
            '^'
        } else if stroke.color == trend::LOWER_COLOR {
            'v'
        } else {
            '-'
        };

        let (x0, y0) = self.cell(from.0, from.1);
        let (x1, y1) = self.cell(to.0, to.1);
        let cell_w = trend::WIDTH / self.cols() as f64;
        for (c, r) in line_cells(x0, y0, x1, y1) {
            // Keep the cell if its left edge falls on an "on" stretch of the dash.
            let on = match dash {
                Some([on, off]) if on + off > 0.0 => (c as f64 * cell_w) % (on + off) < on.max(cell_w / 2.0),
                _ => true,
            };
            if on {
                self.put(c, r, ch, false);
            }
        }
    }

    fn dot(&mut self, at: (f64, f64), _radius: f64, _color: Rgb) {
        let (c, r) = self.cell(at.0, at.1);
        self.put(c, r, 'o', true);
    }
}

fn map_axis(v: f64, extent: f64, cells: usize) -> usize {
    let u = (v / extent).clamp(0.0, 1.0);
    (u * (cells as f64 - 1.0)).round() as usize
}

/// Integer line cells (Bresenham).
fn line_cells(x0: usize, y0: usize, x1: usize, y1: usize) -> Vec<(usize, usize)> {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut out = Vec::new();
    loop {
        out.push((x0 as usize, y0 as usize));
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
    out
}

/// Render a series straight to text lines (empty when nothing is plottable).
pub fn render_sparkline(
    points: &[crate::domain::MeasurementPoint],
    cols: usize,
    rows: usize,
) -> Vec<String> {
    let mut surface = AsciiSurface::new(cols, rows);
    match trend::render(points, &mut surface, trend::SparklineOptions::default()) {
        Some(_) => surface.lines(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MeasurementPoint;

    #[test]
    fn rising_series_golden() {
        let points: Vec<_> = [0.0, 1.0, 2.0].map(MeasurementPoint::with_deviation).to_vec();
        let lines = render_sparkline(&points, 10, 3);
        assert_eq!(
            lines,
            vec![
                "       ***".to_string(),
                "   ****   ".to_string(),
                "***-------".to_string(),
            ]
        );
    }

    #[test]
    fn single_point_lands_mid_row() {
        let lines = render_sparkline(&[MeasurementPoint::with_deviation(1.0)], 11, 3);
        assert_eq!(lines[2].chars().nth(5), Some('*'));
    }

    #[test]
    fn alert_series_is_tinted_and_marks_tolerance() {
        let points = vec![
            MeasurementPoint { deviation: Some(3.0), upper_tol: Some(1.0), ..MeasurementPoint::default() },
            MeasurementPoint::with_deviation(2.0),
        ];
        let lines = render_sparkline(&points, 12, 4);
        let all: String = lines.concat();
        assert!(all.contains('.'));
        assert!(all.contains('^'));
        assert!(all.contains('*'));
    }

    #[test]
    fn nothing_plottable_yields_no_lines() {
        assert!(render_sparkline(&[MeasurementPoint::default()], 10, 3).is_empty());
    }
}
