//! Drawing capability used by the sparkline renderer.
//!
//! The renderer only needs a handful of primitives. Keeping them behind a trait
//! lets the geometry be tested against [`RecordingSurface`] while the CLI and
//! TUI provide real backends (`plot::ascii::AsciiSurface`, the Plotters widget).

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// From a `0xrrggbb` literal.
    pub const fn hex(v: u32) -> Self {
        Rgb(((v >> 16) & 0xff) as u8, ((v >> 8) & 0xff) as u8, (v & 0xff) as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgb,
    pub width: f64,
}

/// Dash pattern `[on, off]` in logical units.
pub type Dash = [f64; 2];

/// Coordinates are logical canvas units, origin top-left, y growing down.
pub trait Surface {
    /// Erase everything previously drawn.
    fn clear(&mut self);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgb);
    fn polyline(&mut self, points: &[(f64, f64)], stroke: Stroke);
    fn line(&mut self, from: (f64, f64), to: (f64, f64), stroke: Stroke, dash: Option<Dash>);
    fn dot(&mut self, at: (f64, f64), radius: f64, color: Rgb);
}

/// A recorded drawing primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear,
    FillRect { x: f64, y: f64, w: f64, h: f64, color: Rgb },
    Polyline { points: Vec<(f64, f64)>, stroke: Stroke },
    Line { from: (f64, f64), to: (f64, f64), stroke: Stroke, dash: Option<Dash> },
    Dot { at: (f64, f64), radius: f64, color: Rgb },
}

/// Surface that just records what was drawn.
///
/// Also used as a display list: the TUI records once and replays into Plotters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingSurface {
    pub ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self) {
        self.ops.clear();
        self.ops.push(DrawOp::Clear);
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgb) {
        self.ops.push(DrawOp::FillRect { x, y, w, h, color });
    }

    fn polyline(&mut self, points: &[(f64, f64)], stroke: Stroke) {
        self.ops.push(DrawOp::Polyline { points: points.to_vec(), stroke });
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), stroke: Stroke, dash: Option<Dash>) {
        self.ops.push(DrawOp::Line { from, to, stroke, dash });
    }

    fn dot(&mut self, at: (f64, f64), radius: f64, color: Rgb) {
        self.ops.push(DrawOp::Dot { at, radius, color });
    }
}

/// Split a horizontal span into the "on" segments of a dash pattern.
pub fn dash_segments(x0: f64, x1: f64, dash: Dash) -> Vec<(f64, f64)> {
    let (lo, hi) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
    let [on, off] = dash;
    if on <= 0.0 {
        return Vec::new();
    }
    let period = on + off.max(0.0);

    let mut out = Vec::new();
    let mut x = lo;
    while x < hi {
        out.push((x, (x + on).min(hi)));
        x += period;
    }
    out
}
