//! PNG bar charts drawn straight onto an `image::RgbImage`.

pub mod font;

use crate::domain::model::BarChart;
use crate::domain::ports::ChartRenderer;
use crate::utils::error::Result;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// 6.4 x 4.8 inches at 120 dpi.
pub const DEFAULT_WIDTH: u32 = 768;
pub const DEFAULT_HEIGHT: u32 = 576;

const MARGIN_LEFT: u32 = 90;
const MARGIN_RIGHT: u32 = 24;
const MARGIN_TOP: u32 = 48;
const MARGIN_BOTTOM: u32 = 72;
const Y_TICKS: u32 = 5;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([60, 60, 60]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
const BAR: Rgb<u8> = Rgb([31, 119, 180]);
const TREND: Rgb<u8> = Rgb([214, 39, 40]);
const TEXT: Rgb<u8> = Rgb([33, 33, 33]);

#[derive(Debug, Clone, Copy)]
pub struct PngChartRenderer {
    width: u32,
    height: u32,
}

impl PngChartRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn draw(&self, chart: &BarChart) -> RgbImage {
        let mut canvas = Canvas::new(self.width, self.height);
        let plot = PlotArea {
            left: MARGIN_LEFT as i64,
            right: self.width.saturating_sub(MARGIN_RIGHT) as i64,
            top: MARGIN_TOP as i64,
            bottom: self.height.saturating_sub(MARGIN_BOTTOM) as i64,
        };

        let title_x = (self.width as i64 - font::text_width(&chart.title, 2) as i64) / 2;
        canvas.text(title_x, 14, &chart.title, 2, TEXT);

        let x_label_x = (self.width as i64 - font::text_width(&chart.x_label, 1) as i64) / 2;
        canvas.text(x_label_x, self.height as i64 - 20, &chart.x_label, 1, TEXT);

        let y_label_y = (plot.top + plot.bottom + font::text_width(&chart.y_label, 1) as i64) / 2;
        canvas.text_vertical(12, y_label_y, &chart.y_label, 1, TEXT);

        let max_value = chart
            .bars
            .iter()
            .map(|(_, value)| *value)
            .fold(0.0_f64, f64::max);
        let axis_max = nice_ceiling(max_value);

        for tick in 0..=Y_TICKS {
            let value = axis_max * tick as f64 / Y_TICKS as f64;
            let y = plot.y_for(value, axis_max);
            if tick > 0 {
                canvas.hline(plot.left + 1, plot.right, y, GRID);
            }
            let label = format_compact(value);
            let label_x = plot.left - 8 - font::text_width(&label, 1) as i64;
            canvas.text(label_x, y - font::GLYPH_HEIGHT as i64 / 2, &label, 1, TEXT);
        }

        canvas.vline(plot.left, plot.top, plot.bottom, AXIS);
        canvas.hline(plot.left, plot.right, plot.bottom, AXIS);

        if chart.bars.is_empty() {
            return canvas.into_image();
        }

        let slot = (plot.width() / chart.bars.len() as i64).max(1);
        let bar_width = (slot * 7 / 10).max(1);
        let label_step = if chart.trend_line {
            let widest = chart
                .bars
                .iter()
                .map(|(label, _)| font::text_width(label, 1) as i64 + 6)
                .max()
                .unwrap_or(0);
            ((widest + slot - 1) / slot).max(1) as usize
        } else {
            1
        };

        let mut tops = Vec::with_capacity(chart.bars.len());
        for (i, (label, value)) in chart.bars.iter().enumerate() {
            let slot_left = plot.left + i as i64 * slot;
            let center = slot_left + slot / 2;
            let top = plot.y_for(*value, axis_max);
            canvas.fill_rect(center - bar_width / 2, top, bar_width, plot.bottom - top, BAR);
            tops.push((center, top));

            if i % label_step == 0 {
                let text = if chart.trend_line {
                    label.clone()
                } else {
                    font::fit_text(label, (slot - 4).max(0) as u32, 1)
                };
                let x = center - font::text_width(&text, 1) as i64 / 2;
                canvas.text(x, plot.bottom + 8, &text, 1, TEXT);
            }

            if !chart.trend_line {
                let value_label = format_compact(*value);
                let x = center - font::text_width(&value_label, 1) as i64 / 2;
                canvas.text(x, top - 12, &value_label, 1, TEXT);
            }
        }

        if chart.trend_line {
            for pair in tops.windows(2) {
                let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
                canvas.line(x0, y0, x1, y1, TREND);
                canvas.line(x0, y0 - 1, x1, y1 - 1, TREND);
            }
            for (x, y) in &tops {
                canvas.fill_rect(x - 2, y - 3, 5, 5, TREND);
            }
        }

        canvas.into_image()
    }
}

impl Default for PngChartRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl ChartRenderer for PngChartRenderer {
    fn render_bar_chart(&self, chart: &BarChart) -> Result<Vec<u8>> {
        let image = self.draw(chart);
        let mut cursor = Cursor::new(Vec::new());
        image.write_to(&mut cursor, ImageFormat::Png)?;
        Ok(cursor.into_inner())
    }
}

struct PlotArea {
    left: i64,
    right: i64,
    top: i64,
    bottom: i64,
}

impl PlotArea {
    fn width(&self) -> i64 {
        self.right - self.left
    }

    fn y_for(&self, value: f64, axis_max: f64) -> i64 {
        let height = (self.bottom - self.top) as f64;
        self.bottom - (value / axis_max * height).round() as i64
    }
}

/// Clipped drawing primitives over an RGB buffer.
struct Canvas {
    image: RgbImage,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, BACKGROUND),
        }
    }

    fn into_image(self) -> RgbImage {
        self.image
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && (x as u32) < self.image.width() && (y as u32) < self.image.height() {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }

    fn fill_rect(&mut self, x: i64, y: i64, width: i64, height: i64, color: Rgb<u8>) {
        for py in y..y + height {
            for px in x..x + width {
                self.put(px, py, color);
            }
        }
    }

    fn hline(&mut self, x0: i64, x1: i64, y: i64, color: Rgb<u8>) {
        for x in x0..=x1 {
            self.put(x, y, color);
        }
    }

    fn vline(&mut self, x: i64, y0: i64, y1: i64, color: Rgb<u8>) {
        for y in y0..=y1 {
            self.put(x, y, color);
        }
    }

    fn line(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            self.put(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn text(&mut self, x: i64, y: i64, text: &str, scale: u32, color: Rgb<u8>) {
        let scale = scale as i64;
        for (i, c) in text.chars().enumerate() {
            let origin = x + i as i64 * font::ADVANCE as i64 * scale;
            for (row, bits) in font::glyph(c).iter().enumerate() {
                for col in 0..font::GLYPH_WIDTH {
                    if bits & (1 << (font::GLYPH_WIDTH - 1 - col)) != 0 {
                        self.fill_rect(
                            origin + col as i64 * scale,
                            y + row as i64 * scale,
                            scale,
                            scale,
                            color,
                        );
                    }
                }
            }
        }
    }

    /// Text rotated a quarter turn counter-clockwise, starting at `(x, y)` and
    /// running upwards.
    fn text_vertical(&mut self, x: i64, y: i64, text: &str, scale: u32, color: Rgb<u8>) {
        let scale = scale as i64;
        for (i, c) in text.chars().enumerate() {
            let origin = y - i as i64 * font::ADVANCE as i64 * scale;
            for (row, bits) in font::glyph(c).iter().enumerate() {
                for col in 0..font::GLYPH_WIDTH {
                    if bits & (1 << (font::GLYPH_WIDTH - 1 - col)) != 0 {
                        self.fill_rect(
                            x + row as i64 * scale,
                            origin - (col as i64 + 1) * scale,
                            scale,
                            scale,
                            color,
                        );
                    }
                }
            }
        }
    }
}

/// Smallest 1, 2 or 5 times a power of ten that is at least `value`.
pub fn nice_ceiling(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powi(value.log10().floor() as i32);
    let fraction = value / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Short axis label: `1.5K`, `2M`, `750`, `0.25`.
pub fn format_compact(value: f64) -> String {
    let abs = value.abs();
    let text = if abs >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    };
    text.replacen(".0B", "B", 1)
        .replacen(".0M", "M", 1)
        .replacen(".0K", "K", 1)
}
