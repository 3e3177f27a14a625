use crate::error::{GfxError, Result};
use crate::mode::{ModeConfig, SCREEN_CELLS_X, SCREEN_CELLS_Y, SharedColors};
use crate::pack::SlotMap;
use crate::resolve::CellResolution;

pub const CELL_COUNT: usize = SCREEN_CELLS_X * SCREEN_CELLS_Y;
/// Bytes per cell in the bitmap plane (one per pixel row).
pub const BYTES_PER_CELL: usize = 8;
pub const PLANE_SIZE: usize = CELL_COUNT * BYTES_PER_CELL;
pub const SCREEN_SIZE: usize = CELL_COUNT;
pub const COLOR_SIZE: usize = CELL_COUNT;

/// The three memory regions of a bitmap screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapAsset {
    /// 8000 bytes, cell-interleaved: cell `n` row `r` lives at `n * 8 + r`.
    pub plane: Vec<u8>,
    /// 1000 bytes of screen RAM: high nibble rank-0 color, low nibble rank-1.
    pub screen: Vec<u8>,
    /// 1000 bytes of color RAM: low nibble rank-2 color (multicolor only).
    pub color: Vec<u8>,
}

/// Serialize resolved cells into bitmap, screen and color memory.
///
/// `resolutions` must cover the 40×25 screen in raster order.
pub fn encode_bitmap(
    resolutions: &[CellResolution],
    config: &ModeConfig,
    shared: &SharedColors,
) -> Result<BitmapAsset> {
    if !config.mode.is_bitmap() {
        return Err(GfxError::Config(format!(
            "{} is not a bitmap mode",
            config.mode
        )));
    }
    config.validate_for_encoding()?;

    if resolutions.len() != CELL_COUNT {
        return Err(GfxError::SizeMismatch {
            what: "screen",
            expected: SCREEN_SIZE,
            actual: resolutions.len(),
        });
    }
    let (cell_w, cell_h) = config.mode.cell_size();
    if let Some(bad) = resolutions
        .iter()
        .find(|r| r.pixels.len() != cell_w * cell_h)
    {
        return Err(GfxError::SizeMismatch {
            what: "cell",
            expected: cell_w * cell_h,
            actual: bad.pixels.len(),
        });
    }

    // Pre-sized buffers; every cell writes only its own slice.
    let mut plane = vec![0u8; PLANE_SIZE];
    let mut screen = vec![0u8; SCREEN_SIZE];
    let mut color = vec![0u8; COLOR_SIZE];

    let multicolor = config.mode.is_multicolor();
    for (((res, cell_plane), screen_byte), color_byte) in resolutions
        .iter()
        .zip(plane.chunks_exact_mut(BYTES_PER_CELL))
        .zip(screen.iter_mut())
        .zip(color.iter_mut())
    {
        let slots = SlotMap::new(config.mode, &res.kept, shared);
        for (row, out) in res.pixels.chunks_exact(cell_w).zip(cell_plane.iter_mut()) {
            slots.pack_row(row, std::slice::from_mut(out));
        }

        let nibble = |n: usize| res.kept.get(n).copied().unwrap_or(0) & 0x0F;
        *screen_byte = (nibble(0) << 4) | nibble(1);
        if multicolor {
            *color_byte = nibble(2);
        }
    }

    log::debug!(
        "encoded {} bitmap: {} plane, {} screen, {} color bytes",
        config.mode,
        plane.len(),
        screen.len(),
        color.len()
    );

    Ok(BitmapAsset {
        plane,
        screen,
        color,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::partition;
    use crate::grid::QuantizedGrid;
    use crate::mode::Mode;
    use crate::resolve::resolve_cells;

    fn resolve(mode: Mode, indices: Vec<u8>) -> (Vec<CellResolution>, ModeConfig, SharedColors) {
        let (w, h) = mode.resolution();
        let grid = QuantizedGrid::new(w, h, indices).unwrap();
        let config = ModeConfig::for_mode(mode);
        let shared = SharedColors::select(&grid.histogram(), &config);
        let (cw, ch) = mode.cell_size();
        let cells = partition(&grid, cw, ch).unwrap();
        (resolve_cells(&cells, &config, &shared), config, shared)
    }

    #[test]
    fn test_hires_sizes_and_interleave() {
        let mut indices = vec![0u8; 320 * 200];
        // Second cell (x 8..16), first row: white.
        indices[8..16].fill(1);
        let (res, config, shared) = resolve(Mode::BitmapHires, indices);
        let asset = encode_bitmap(&res, &config, &shared).unwrap();
        assert_eq!(asset.plane.len(), 8000);
        assert_eq!(asset.screen.len(), 1000);
        assert_eq!(asset.color.len(), 1000);

        // Cell 1: black ranks first (56 px) so it is the 1-bit color.
        assert_eq!(asset.screen[1], 0x01);
        assert_eq!(asset.plane[8], 0x00);
        assert_eq!(asset.plane[9], 0xFF);
        // Cell 0 is solid black: every bit set, no secondary color.
        assert_eq!(asset.plane[0], 0xFF);
        assert_eq!(asset.screen[0], 0x00);
        assert!(asset.color.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_multicolor_nibbles() {
        let mut indices = vec![0u8; 160 * 200];
        // First cell, 4x8: rows of 2, 5, 7 over a black background.
        indices[..4].fill(2);
        indices[160..164].fill(2);
        indices[320..324].fill(5);
        indices[480..484].fill(7);
        let (res, config, shared) = resolve(Mode::BitmapMulticolor, indices);
        let asset = encode_bitmap(&res, &config, &shared).unwrap();
        assert_eq!(shared.background, 0);
        assert_eq!(asset.screen[0], 0x25);
        assert_eq!(asset.color[0], 0x07);
        assert_eq!(asset.plane[0], 0b01_01_01_01);
        assert_eq!(asset.plane[2], 0b10_10_10_10);
        assert_eq!(asset.plane[3], 0b11_11_11_11);
        assert_eq!(asset.plane[4], 0);
    }

    #[test]
    fn test_rejects_wrong_cell_count() {
        let (mut res, config, shared) = resolve(Mode::BitmapHires, vec![0u8; 320 * 200]);
        res.pop();
        assert!(matches!(
            encode_bitmap(&res, &config, &shared),
            Err(GfxError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_sprite_mode() {
        let (res, _, shared) = resolve(Mode::BitmapHires, vec![0u8; 320 * 200]);
        let config = ModeConfig::for_mode(Mode::SpriteHires);
        assert!(matches!(
            encode_bitmap(&res, &config, &shared),
            Err(GfxError::Config(_))
        ));
    }
}
