//! PNG previews of encoded assets
//!
//! Previews are rendered from the decoded output bytes, so they show exactly
//! what the VIC-II will display.

use anyhow::{Context, Result};
use c64gfx_core::palette::get_vic_color;
use c64gfx_core::{Mode, QuantizedGrid};
use image::{Rgb, RgbImage};
use std::path::Path;

/// Render palette indices to RGB. Multicolor pixels are drawn two screen
/// pixels wide; `scale` enlarges the whole image.
pub fn render_grid(grid: &QuantizedGrid, mode: Mode, scale: u32) -> RgbImage {
    let scale = scale.max(1);
    let x_scale = if mode.is_multicolor() { scale * 2 } else { scale };
    let mut img = RgbImage::new(grid.width() as u32 * x_scale, grid.height() as u32 * scale);

    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let color = Rgb(get_vic_color(grid.get(x, y)));
            for dy in 0..scale {
                for dx in 0..x_scale {
                    img.put_pixel(x as u32 * x_scale + dx, y as u32 * scale + dy, color);
                }
            }
        }
    }
    img
}

pub fn write_preview(grid: &QuantizedGrid, mode: Mode, path: &Path) -> Result<()> {
    render_grid(grid, mode, 1)
        .save(path)
        .with_context(|| format!("cannot write preview {}", path.display()))
}
