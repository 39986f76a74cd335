//! Plotters-powered sparkline widget for Ratatui.
//!
//! The sparkline is laid out and drawn once into a [`RecordingSurface`]; the
//! recorded ops are then replayed through Plotters, which renders into the
//! Ratatui buffer via `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

use crate::trend::{self, DrawOp, RecordingSurface, Rgb, SparklineLayout, surface::dash_segments};

/// Render-only sparkline for one table cell.
pub struct SparklineChart<'a> {
    pub layout: &'a SparklineLayout,
}

impl<'a> Widget for SparklineChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 4 || area.height < 1 {
            return;
        }

        let mut surface = RecordingSurface::new();
        self.layout.draw(&mut surface);
        let ops = surface.ops;

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(0)
                .build_cartesian_2d(0.0..trend::WIDTH, 0.0..trend::HEIGHT)?;

            for op in &ops {
                match op {
                    DrawOp::Clear => {}
                    DrawOp::FillRect { x, y, w, h, color } => {
                        let c = rgb(*color);
                        chart.draw_series(std::iter::once(Rectangle::new(
                            [(*x, flip(*y)), (x + w, flip(y + h))],
                            c.filled(),
                        )))?;
                    }
                    DrawOp::Polyline { points, stroke } => {
                        let c = rgb(stroke.color);
                        chart.draw_series(LineSeries::new(points.iter().map(|&(x, y)| (x, flip(y))), &c))?;
                    }
                    DrawOp::Line { from, to, stroke, dash } => {
                        let c = rgb(stroke.color);
                        // Guide lines are horizontal; dashes are cut along x.
                        let y = flip(from.1);
                        let segments = match dash {
                            Some(d) => dash_segments(from.0, to.0, *d),
                            None => vec![(from.0, to.0)],
                        };
                        chart.draw_series(
                            segments
                                .into_iter()
                                .map(|(x0, x1)| PathElement::new(vec![(x0, y), (x1, y)], &c)),
                        )?;
                    }
                    DrawOp::Dot { at, color, .. } => {
                        chart.draw_series(std::iter::once(Pixel::new((at.0, flip(at.1)), rgb(*color))))?;
                    }
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// Sparkline y grows downward; chart y grows upward.
fn flip(y: f64) -> f64 {
    trend::HEIGHT - y
}

fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}
