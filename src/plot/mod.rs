//! Text plotting for non-interactive output.

pub mod ascii;

pub use ascii::{AsciiSurface, render_sparkline};
