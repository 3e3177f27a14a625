//! Decoding of encoded memory back into palette indices
//!
//! Reads bitmap planes and sprite blocks the way the VIC-II does. Used to
//! verify encoder output and to render previews from the encoded bytes.

use crate::bitmap::{BYTES_PER_CELL, CELL_COUNT, COLOR_SIZE, PLANE_SIZE, SCREEN_SIZE};
use crate::error::{GfxError, Result};
use crate::grid::QuantizedGrid;
use crate::mode::{Mode, SCREEN_CELLS_X, SharedColors};
use crate::sprite::{SPRITE_BYTES_PER_ROW, SPRITE_DATA_SIZE};

/// Extract 8 single-bit pixel values from a byte, left to right (MSB first).
#[inline]
pub fn extract_hires_pixels(byte: u8) -> [u8; 8] {
    [
        (byte >> 7) & 1,
        (byte >> 6) & 1,
        (byte >> 5) & 1,
        (byte >> 4) & 1,
        (byte >> 3) & 1,
        (byte >> 2) & 1,
        (byte >> 1) & 1,
        byte & 1,
    ]
}

/// Extract 4 two-bit pixel values from a byte, left to right (MSB first).
#[inline]
pub fn extract_multicolor_pixels(byte: u8) -> [u8; 4] {
    [
        (byte >> 6) & 0b11,
        (byte >> 4) & 0b11,
        (byte >> 2) & 0b11,
        byte & 0b11,
    ]
}

/// Decode a 2-bit multicolor bitmap pixel to a color index
///
/// - 00: background (`$D021`)
/// - 01: upper nibble of the screen byte
/// - 10: lower nibble of the screen byte
/// - 11: lower nibble of the color RAM byte
#[inline]
pub fn decode_multicolor_pixel(bits: u8, screen_byte: u8, color_byte: u8, bg_color: u8) -> u8 {
    match bits & 0b11 {
        0b00 => bg_color,
        0b01 => (screen_byte >> 4) & 0x0F,
        0b10 => screen_byte & 0x0F,
        _ => color_byte & 0x0F,
    }
}

/// Decode a hi-res bitmap pixel: set bits take the upper screen nibble.
#[inline]
pub fn decode_hires_pixel(bit: u8, screen_byte: u8) -> u8 {
    if bit & 1 == 1 {
        (screen_byte >> 4) & 0x0F
    } else {
        screen_byte & 0x0F
    }
}

fn expect_len(what: &'static str, data: &[u8], expected: usize) -> Result<()> {
    if data.len() != expected {
        return Err(GfxError::SizeMismatch {
            what,
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Rebuild the logical-resolution image from bitmap, screen and color memory.
pub fn decode_bitmap(
    mode: Mode,
    plane: &[u8],
    screen: &[u8],
    color: &[u8],
    background: u8,
) -> Result<QuantizedGrid> {
    if !mode.is_bitmap() {
        return Err(GfxError::Config(format!("{} is not a bitmap mode", mode)));
    }
    expect_len("bitmap", plane, PLANE_SIZE)?;
    expect_len("screen", screen, SCREEN_SIZE)?;
    expect_len("color", color, COLOR_SIZE)?;

    let (width, height) = mode.resolution();
    let (cell_w, _) = mode.cell_size();
    let mut indices = vec![0u8; width * height];

    for cell in 0..CELL_COUNT {
        let base_x = (cell % SCREEN_CELLS_X) * cell_w;
        let base_y = (cell / SCREEN_CELLS_X) * BYTES_PER_CELL;
        let screen_byte = screen[cell];
        let color_byte = color[cell];

        for row in 0..BYTES_PER_CELL {
            let byte = plane[cell * BYTES_PER_CELL + row];
            let start = (base_y + row) * width + base_x;
            let out = &mut indices[start..start + cell_w];
            match mode {
                Mode::BitmapMulticolor => {
                    for (px, bits) in out.iter_mut().zip(extract_multicolor_pixels(byte)) {
                        *px = decode_multicolor_pixel(bits, screen_byte, color_byte, background);
                    }
                }
                _ => {
                    for (px, bit) in out.iter_mut().zip(extract_hires_pixels(byte)) {
                        *px = decode_hires_pixel(bit, screen_byte);
                    }
                }
            }
        }
    }

    QuantizedGrid::new(width, height, indices)
}

/// Rebuild a sprite from its block and color registers.
///
/// `shared.slot(0)` is the transparent background; multicolor sprites read
/// `$D025`/`$D026` from slots 1 and 2. `individual` is the sprite's own color.
pub fn decode_sprite(
    mode: Mode,
    block: &[u8],
    shared: &SharedColors,
    individual: u8,
) -> Result<QuantizedGrid> {
    if !mode.is_sprite() {
        return Err(GfxError::Config(format!("{} is not a sprite mode", mode)));
    }
    if block.len() < SPRITE_DATA_SIZE {
        return Err(GfxError::SizeMismatch {
            what: "sprite",
            expected: SPRITE_DATA_SIZE,
            actual: block.len(),
        });
    }

    let (width, height) = mode.resolution();
    let mut indices = Vec::with_capacity(width * height);
    for row in block[..SPRITE_DATA_SIZE].chunks_exact(SPRITE_BYTES_PER_ROW) {
        for &byte in row {
            if mode.is_multicolor() {
                for bits in extract_multicolor_pixels(byte) {
                    let color = match bits {
                        0b00 => shared.slot(0),
                        0b01 => shared.slot(1),
                        0b10 => individual,
                        _ => shared.slot(2),
                    };
                    indices.push(color);
                }
            } else {
                for bit in extract_hires_pixels(byte) {
                    indices.push(if bit == 1 { individual } else { shared.slot(0) });
                }
            }
        }
    }

    QuantizedGrid::new(width, height, indices)
}
