//! Fixed-palette quantization with optional error diffusion.

use crate::grid::{PixelGrid, QuantizedGrid};
use crate::palette::{get_vic_color, nearest_index};

// Floyd-Steinberg weights, in sixteenths: right, below-left, below, below-right.
const WEIGHT_RIGHT: i32 = 7;
const WEIGHT_BELOW_LEFT: i32 = 3;
const WEIGHT_BELOW: i32 = 5;
const WEIGHT_BELOW_RIGHT: i32 = 1;

/// Map every pixel of `grid` to its nearest palette index.
///
/// Alpha is ignored. With `dither` set, the quantization error of each pixel
/// is diffused to its unvisited neighbours before they are matched, in
/// row-major order. The result depends only on the inputs.
pub fn quantize(grid: &PixelGrid, dither: bool) -> QuantizedGrid {
    let indices = if dither {
        dither_floyd_steinberg(grid)
    } else {
        grid.pixels()
            .iter()
            .map(|p| nearest_index([p[0], p[1], p[2]]))
            .collect()
    };
    log::debug!(
        "quantized {}x{} image (dither: {})",
        grid.width(),
        grid.height(),
        dither
    );
    QuantizedGrid::from_parts(grid.width(), grid.height(), indices)
}

fn dither_floyd_steinberg(grid: &PixelGrid) -> Vec<u8> {
    let (width, height) = (grid.width(), grid.height());

    // Accumulated error per pixel and channel, in sixteenths.
    let mut error: Vec<[i32; 3]> = vec![[0; 3]; width * height];
    let mut indices = vec![0u8; width * height];

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let src = grid.rgb_at(x, y);
            let acc = error[idx];
            let adjusted = [
                apply_error(src[0], acc[0]),
                apply_error(src[1], acc[1]),
                apply_error(src[2], acc[2]),
            ];

            let chosen = nearest_index(adjusted);
            indices[idx] = chosen;

            let pal = get_vic_color(chosen);
            let err = [
                adjusted[0] as i32 - pal[0] as i32,
                adjusted[1] as i32 - pal[1] as i32,
                adjusted[2] as i32 - pal[2] as i32,
            ];

            if x + 1 < width {
                spread(&mut error[idx + 1], err, WEIGHT_RIGHT);
            }
            if y + 1 < height {
                let below = idx + width;
                if x > 0 {
                    spread(&mut error[below - 1], err, WEIGHT_BELOW_LEFT);
                }
                spread(&mut error[below], err, WEIGHT_BELOW);
                if x + 1 < width {
                    spread(&mut error[below + 1], err, WEIGHT_BELOW_RIGHT);
                }
            }
        }
    }

    indices
}

#[inline]
fn apply_error(value: u8, acc_sixteenths: i32) -> u8 {
    (value as i32 + acc_sixteenths / 16).clamp(0, 255) as u8
}

#[inline]
fn spread(target: &mut [i32; 3], err: [i32; 3], weight: i32) {
    for (t, e) in target.iter_mut().zip(err) {
        *t += e * weight;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::VIC_II_PALETTE;

    fn grid_from_rgb(width: usize, height: usize, rgb: &[[u8; 3]]) -> PixelGrid {
        PixelGrid::new(
            width,
            height,
            rgb.iter().map(|c| [c[0], c[1], c[2], 0xFF]).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_exact_palette_image_maps_directly() {
        let rgb: Vec<[u8; 3]> = VIC_II_PALETTE.iter().map(|e| e.rgb).collect();
        let grid = grid_from_rgb(16, 1, &rgb);
        let q = quantize(&grid, false);
        let expected: Vec<u8> = (0..16).collect();
        assert_eq!(q.indices(), expected.as_slice());
    }

    #[test]
    fn test_alpha_is_ignored() {
        let grid = PixelGrid::new(2, 1, vec![[255, 255, 255, 0], [255, 255, 255, 255]]).unwrap();
        assert_eq!(quantize(&grid, false).indices(), &[1, 1]);
    }

    #[test]
    fn test_dither_keeps_exact_colors() {
        // Zero error everywhere: dithering must not change anything.
        let rgb = vec![[0, 0, 170]; 16];
        let grid = grid_from_rgb(4, 4, &rgb);
        assert_eq!(quantize(&grid, true).indices(), &[6u8; 16]);
    }

    #[test]
    fn test_dither_mixes_mid_gray() {
        // Flat gray between gray (119) and light gray (187).
        let rgb = vec![[150, 150, 150]; 64];
        let grid = grid_from_rgb(8, 8, &rgb);
        let plain = quantize(&grid, false);
        let dithered = quantize(&grid, true);
        assert_eq!(plain.palette_used().len(), 1);
        assert!(dithered.palette_used().len() > 1);
    }

    #[test]
    fn test_dither_spreads_error_by_fixed_weights() {
        // 150 sits between gray (119) and light gray (187). Worked by hand:
        // (0,0) -> 12, err 31; (1,0) gets 217/16 -> 163 -> 15, err -24;
        // (2,0) gets -168/16 -> 140 -> 12; (0,1) gets (155 - 72)/16 -> 155 -> 15;
        // (1,1) gets -250/16 -> 135 -> 12; (2,1) gets 193/16 -> 162 -> 15.
        let grid = grid_from_rgb(3, 2, &[[150, 150, 150]; 6]);
        assert_eq!(quantize(&grid, true).indices(), &[12, 15, 12, 15, 12, 15]);
    }

    #[test]
    fn test_dither_is_deterministic() {
        let rgb: Vec<[u8; 3]> = (0..64u8).map(|i| [i * 3, 255 - i * 2, i]).collect();
        let grid = grid_from_rgb(8, 8, &rgb);
        assert_eq!(quantize(&grid, true), quantize(&grid, true));
    }
}
