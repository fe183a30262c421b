//! Horizontal bar charts rendered straight to PNG.
//!
//! A deliberately small renderer for the two tissue-expression charts:
//! title, axis labels, category labels, value ticks, one bar per row drawn
//! top to bottom in input order. Callers pass rows already sorted, so the
//! largest value sits at the top of the chart.

mod font;

use crate::error::Result;
use font::{GLYPH_HEIGHT, draw_text, draw_text_rotated, text_width};
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// Bar fill used for the RNA chart.
pub const SKY_BLUE: Rgba<u8> = Rgba([135, 206, 235, 255]);
/// Bar fill used for the protein chart.
pub const SALMON: Rgba<u8> = Rgba([250, 128, 114, 255]);

const TEXT: Rgba<u8> = Rgba([0, 0, 0, 255]);
const AXIS: Rgba<u8> = Rgba([96, 96, 96, 255]);

const TITLE_SCALE: u32 = 2;
const LABEL_SCALE: u32 = 2;

/// Canvas options for rendering.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub background: Rgba<u8>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        // A 10x8 inch figure at 100 dpi
        Self {
            width: 1000,
            height: 800,
            background: Rgba([255, 255, 255, 255]),
        }
    }
}

/// One category and its magnitude.
#[derive(Debug, Clone)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

/// A horizontal bar chart.
#[derive(Debug, Clone)]
pub struct HBarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub color: Rgba<u8>,
    pub bars: Vec<Bar>,
}

impl HBarChart {
    /// Render onto a fresh canvas.
    pub fn render(&self, opts: &RenderOptions) -> RgbaImage {
        let (w, h) = (opts.width as i64, opts.height as i64);
        let mut img = RgbaImage::from_pixel(opts.width, opts.height, opts.background);

        // Left margin holds the rotated axis label plus category labels;
        // cap it so degenerate labels cannot swallow the plot area
        let glyph_h = (GLYPH_HEIGHT * LABEL_SCALE) as i64;
        let max_label_w = self
            .bars
            .iter()
            .map(|bar| text_width(&bar.label, LABEL_SCALE) as i64)
            .max()
            .unwrap_or(0)
            .min(2 * w / 5);

        let plot_left = glyph_h + 20 + max_label_w + 10;
        let plot_right = w - 40;
        let plot_top = 60i64;
        let plot_bottom = h - 80;
        let plot_w = plot_right - plot_left;
        let plot_h = plot_bottom - plot_top;

        // Title, centered
        let title_x = (w - text_width(&self.title, TITLE_SCALE) as i64) / 2;
        draw_text(&mut img, title_x, 20, &self.title, TITLE_SCALE, TEXT);

        // Plot frame
        fill_rect(&mut img, plot_left, plot_top, plot_w, 1, AXIS);
        fill_rect(&mut img, plot_left, plot_bottom, plot_w + 1, 1, AXIS);
        fill_rect(&mut img, plot_left, plot_top, 1, plot_h, AXIS);
        fill_rect(&mut img, plot_right, plot_top, 1, plot_h, AXIS);

        // Value axis
        let ticks = nice_ticks(self.bars.iter().fold(0.0f64, |m, b| m.max(b.value)));
        let tick_max = *ticks.last().unwrap_or(&1.0);
        let to_x = |v: f64| plot_left + (v / tick_max * plot_w as f64) as i64;

        for tick in &ticks {
            let x = to_x(*tick);
            fill_rect(&mut img, x, plot_bottom, 1, 6, AXIS);
            let label = format_tick(*tick);
            let label_w = text_width(&label, LABEL_SCALE) as i64;
            draw_text(&mut img, x - label_w / 2, plot_bottom + 10, &label, LABEL_SCALE, TEXT);
        }

        // Bars, top to bottom, with right-aligned category labels
        if !self.bars.is_empty() {
            let slot_h = plot_h / self.bars.len() as i64;
            let bar_h = (slot_h * 3 / 5).max(1);

            for (i, bar) in self.bars.iter().enumerate() {
                let slot_top = plot_top + i as i64 * slot_h;
                let bar_top = slot_top + (slot_h - bar_h) / 2;
                let bar_w = ((bar.value / tick_max) * plot_w as f64) as i64;
                fill_rect(&mut img, plot_left + 1, bar_top, bar_w, bar_h, self.color);

                let label_w = text_width(&bar.label, LABEL_SCALE) as i64;
                let label_y = slot_top + (slot_h - glyph_h) / 2;
                draw_text(
                    &mut img,
                    plot_left - 10 - label_w,
                    label_y,
                    &bar.label,
                    LABEL_SCALE,
                    TEXT,
                );
            }
        }

        // Axis titles
        let x_label_x = plot_left + (plot_w - text_width(&self.x_label, LABEL_SCALE) as i64) / 2;
        draw_text(
            &mut img,
            x_label_x,
            plot_bottom + 14 + glyph_h,
            &self.x_label,
            LABEL_SCALE,
            TEXT,
        );
        let y_label_y = plot_top + (plot_h + text_width(&self.y_label, LABEL_SCALE) as i64) / 2;
        draw_text_rotated(&mut img, 10, y_label_y, &self.y_label, LABEL_SCALE, TEXT);

        img
    }

    /// Render and encode as PNG bytes.
    pub fn to_png(&self, opts: &RenderOptions) -> Result<Vec<u8>> {
        let img = self.render(opts);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// Render and write a PNG file.
    pub fn save_png<P: AsRef<Path>>(&self, path: P, opts: &RenderOptions) -> Result<()> {
        std::fs::write(path, self.to_png(opts)?)?;
        Ok(())
    }
}

fn fill_rect(img: &mut RgbaImage, x: i64, y: i64, w: i64, h: i64, color: Rgba<u8>) {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + w).min(img.width() as i64);
    let y1 = (y + h).min(img.height() as i64);
    for py in y0..y1 {
        for px in x0..x1 {
            img.put_pixel(px as u32, py as u32, color);
        }
    }
}

/// Ascending ticks from zero through the first "nice" step multiple at or
/// above `max`. Steps are 1, 2, or 5 times a power of ten.
fn nice_ticks(max: f64) -> Vec<f64> {
    if max <= 0.0 || !max.is_finite() {
        return vec![0.0, 1.0];
    }

    let rough = max / 4.0;
    let magnitude = 10f64.powf(rough.log10().floor());
    let fraction = rough / magnitude;
    let step = magnitude
        * if fraction <= 1.0 {
            1.0
        } else if fraction <= 2.0 {
            2.0
        } else if fraction <= 5.0 {
            5.0
        } else {
            10.0
        };

    let mut ticks = vec![0.0];
    let mut tick = 0.0;
    while tick < max {
        tick += step;
        ticks.push(tick);
    }
    ticks
}

fn format_tick(value: f64) -> String {
    if value == value.trunc() {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}
