//! Difference-box geometry and coloring.

use crate::domain::DiffBox;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Color with straight alpha in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    /// Composite over an opaque background.
    pub fn over(&self, bg: (u8, u8, u8)) -> (u8, u8, u8) {
        let mix = |fg: u8, bg: u8| js_round(f64::from(bg) + (f64::from(fg) - f64::from(bg)) * self.a) as u8;
        (mix(self.r, bg.0), mix(self.g, bg.1), mix(self.b, bg.2))
    }
}

impl std::fmt::Display for Rgba {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rgba({},{},{}, {})", self.r, self.g, self.b, self.a)
    }
}

const IMPROVED: (u8, u8, u8) = (67, 160, 71);
const IMPROVED_ALPHA: f64 = 0.12;
const NEUTRAL_RIGHT: (u8, u8, u8) = (25, 118, 210);
const LEFT: (u8, u8, u8) = (30, 136, 229);
const FAINT_ALPHA: f64 = 0.08;
const YELLOW: (u8, u8, u8) = (255, 213, 79);
const RED: (u8, u8, u8) = (211, 47, 47);
const MAX_SEVERITY: f64 = 5.0;
/// Smallest on-screen box edge.
const MIN_EDGE_PX: i64 = 2;

/// Fill color for a box.
///
/// Right-side boxes encode severity (`dashCount`, clamped to `0..=5`) as a
/// yellow→red ramp, green when the backend marked the value as improved and a
/// faint blue at zero severity. Left-side boxes are always faint blue.
/// `opacity` is the user's slider value.
pub fn box_color(side: Side, diff: &DiffBox, opacity: f64) -> Rgba {
    let (rgb, base) = match side {
        Side::Left => (LEFT, FAINT_ALPHA),
        Side::Right => {
            let severity = diff.dash_count.unwrap_or(0.0).clamp(0.0, MAX_SEVERITY);
            if diff.improved {
                (IMPROVED, IMPROVED_ALPHA)
            } else if severity == 0.0 {
                (NEUTRAL_RIGHT, FAINT_ALPHA)
            } else {
                let t = (severity / MAX_SEVERITY).min(1.0);
                let rgb = (lerp(YELLOW.0, RED.0, t), lerp(YELLOW.1, RED.1, t), lerp(YELLOW.2, RED.2, t));
                (rgb, FAINT_ALPHA + 0.25 * t)
            }
        }
    };
    Rgba { r: rgb.0, g: rgb.1, b: rgb.2, a: effective_alpha(base, opacity) }
}

/// Blend a box's base alpha toward opaque as the slider rises. A slider of `0`
/// hides boxes entirely.
pub fn effective_alpha(base: f64, slider: f64) -> f64 {
    let slider = slider.clamp(0.0, 1.0);
    if slider == 0.0 {
        0.0
    } else {
        (base + (1.0 - base) * slider).min(1.0)
    }
}

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    js_round(f64::from(a) + (f64::from(b) - f64::from(a)) * t) as u8
}

/// Round half toward +∞, matching how the overlay pixels have always been snapped.
pub(crate) fn js_round(v: f64) -> f64 {
    (v + 0.5).floor()
}

/// Where the rendered page sits inside its pane, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

/// A box ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayBox {
    pub rect: PixelRect,
    pub color: Rgba,
    /// Hover text (the differing word).
    pub title: String,
}

/// Scale a normalized box onto the rendered page.
pub fn place_box(side: Side, diff: &DiffBox, canvas: CanvasRect, opacity: f64) -> OverlayBox {
    let [x0, y0, x1, y1] = diff.rect;
    let left = x0 * canvas.width + canvas.left;
    let top = y0 * canvas.height + canvas.top;
    let w = (x1 - x0) * canvas.width;
    let h = (y1 - y0) * canvas.height;

    OverlayBox {
        rect: PixelRect {
            left: js_round(left) as i64,
            top: js_round(top) as i64,
            width: (js_round(w) as i64).max(MIN_EDGE_PX),
            height: (js_round(h) as i64).max(MIN_EDGE_PX),
        },
        color: box_color(side, diff, opacity),
        title: diff.text.clone().unwrap_or_default(),
    }
}
