//! Render PNG payloads into the terminal with half-block characters.
//!
//! Each text cell shows two vertically stacked pixels: the upper one as
//! the foreground of `▀`, the lower one as the background.

use base64::Engine;
use crossterm::style::{Color, Stylize};
use image::imageops::FilterType;
use image::{ImageFormat, RgbImage};

use crate::error::{EdaError, Result};

const MAX_ROWS: u32 = 40;

/// Decode a base64 PNG into an RGB bitmap.
pub fn decode_png(b64_png: &str) -> Result<RgbImage> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64_png.trim())
        .map_err(|e| EdaError::InvalidImage(e.to_string()))?;
    let image = image::load_from_memory_with_format(&bytes, ImageFormat::Png)
        .map_err(|e| EdaError::InvalidImage(e.to_string()))?;
    Ok(image.to_rgb8())
}

/// Scale `image` to `columns` cells wide and render it, one string per row.
pub fn render_half_blocks(image: &RgbImage, columns: u32) -> Vec<String> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 || columns == 0 {
        return Vec::new();
    }
    let columns = columns.min(w);
    let mut pixel_rows = ((h as u64 * columns as u64) / w as u64).max(1) as u32;
    pixel_rows = pixel_rows.min(MAX_ROWS * 2);
    // Round up to an even number of pixel rows.
    pixel_rows += pixel_rows % 2;

    let scaled = image::imageops::resize(image, columns, pixel_rows, FilterType::Triangle);
    (0..pixel_rows / 2)
        .map(|row| {
            (0..columns)
                .map(|x| {
                    let top = scaled.get_pixel(x, row * 2).0;
                    let bottom = scaled.get_pixel(x, row * 2 + 1).0;
                    "▀"
                        .with(rgb(top))
                        .on(rgb(bottom))
                        .to_string()
                })
                .collect::<String>()
        })
        .collect()
}

fn rgb([r, g, b]: [u8; 3]) -> Color {
    Color::Rgb { r, g, b }
}

/// Lay out rendered images `per_row` across, each cell `cell_width` wide.
pub fn grid(rendered: &[Vec<String>], cell_width: usize, per_row: usize, gap: usize) -> Vec<String> {
    let per_row = per_row.max(1);
    let mut lines = Vec::new();
    for (row_index, row) in rendered.chunks(per_row).enumerate() {
        if row_index > 0 {
            lines.push(String::new());
        }
        let height = row.iter().map(Vec::len).max().unwrap_or(0);
        for y in 0..height {
            let cells: Vec<String> = row
                .iter()
                .map(|image| {
                    image
                        .get(y)
                        .cloned()
                        .unwrap_or_else(|| " ".repeat(cell_width))
                })
                .collect();
            lines.push(cells.join(&" ".repeat(gap)));
        }
    }
    lines
}
