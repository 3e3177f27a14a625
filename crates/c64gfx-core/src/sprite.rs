use crate::cells::Region;
use crate::error::{GfxError, Result};
use crate::mode::{Mode, ModeConfig, SharedColors};
use crate::pack::SlotMap;
use crate::resolve::CellResolution;

/// Size of one sprite in memory: 21 rows of 3 bytes plus one pad byte.
pub const SPRITE_BLOCK_SIZE: usize = 64;
pub const SPRITE_DATA_SIZE: usize = 63;
pub const SPRITE_BYTES_PER_ROW: usize = 3;

pub type SpriteBlock = [u8; SPRITE_BLOCK_SIZE];

/// Raster-order sprite regions of a `width`×`height` sheet.
///
/// `count` limits the result to the first N sprites; `None` takes all.
pub fn tile_regions(
    mode: Mode,
    width: usize,
    height: usize,
    count: Option<usize>,
) -> Result<Vec<Region>> {
    if !mode.is_sprite() {
        return Err(GfxError::Config(format!("{} is not a sprite mode", mode)));
    }
    let (sw, sh) = mode.resolution();
    if width == 0 || height == 0 || !width.is_multiple_of(sw) || !height.is_multiple_of(sh) {
        return Err(GfxError::Dimension(format!(
            "{}x{} image does not align to the {}x{} sprite grid",
            width, height, sw, sh
        )));
    }

    let cols = width / sw;
    let rows = height / sh;
    let available = cols * rows;
    let take = match count {
        None => available,
        Some(0) => {
            return Err(GfxError::Dimension(
                "sprite count must be at least 1".to_string(),
            ));
        }
        Some(n) if n > available => {
            return Err(GfxError::Dimension(format!(
                "requested {} sprites but the image holds {}",
                n, available
            )));
        }
        Some(n) => n,
    };

    Ok((0..take)
        .map(|i| Region::new((i % cols) * sw, (i / cols) * sh, sw, sh))
        .collect())
}

/// Check that explicit regions are sprite sized.
pub fn check_regions(mode: Mode, regions: &[Region]) -> Result<()> {
    let (sw, sh) = mode.resolution();
    if regions.is_empty() {
        return Err(GfxError::Dimension("no sprite regions given".to_string()));
    }
    if let Some(r) = regions.iter().find(|r| r.width != sw || r.height != sh) {
        return Err(GfxError::Dimension(format!(
            "region ({},{} {}x{}) is not a {}x{} sprite",
            r.x, r.y, r.width, r.height, sw, sh
        )));
    }
    Ok(())
}

/// Encode one resolved sprite into a 64-byte block.
///
/// The block is always full length; the pad byte stays zero.
pub fn encode_sprite(
    resolution: &CellResolution,
    config: &ModeConfig,
    shared: &SharedColors,
) -> Result<SpriteBlock> {
    if !config.mode.is_sprite() {
        return Err(GfxError::Config(format!(
            "{} is not a sprite mode",
            config.mode
        )));
    }
    config.validate_for_encoding()?;

    let (w, h) = config.mode.resolution();
    if resolution.pixels.len() != w * h {
        return Err(GfxError::SizeMismatch {
            what: "sprite",
            expected: w * h,
            actual: resolution.pixels.len(),
        });
    }

    let slots = SlotMap::new(config.mode, &resolution.kept, shared);
    let mut block = [0u8; SPRITE_BLOCK_SIZE];
    let (data, _padding) = block.split_at_mut(SPRITE_DATA_SIZE);
    let rows = data.chunks_exact_mut(SPRITE_BYTES_PER_ROW);
    for (row, out) in resolution.pixels.chunks_exact(w).zip(rows) {
        slots.pack_row(row, out);
    }
    Ok(block)
}

/// The sprite's own color register value (`$D027+n`).
///
/// Sprites with nothing to draw in their own color report the background.
pub fn individual_color(resolution: &CellResolution, shared: &SharedColors) -> u8 {
    resolution.kept.first().copied().unwrap_or(shared.background)
}

/// Encoded sprite set: one block and one individual color per sprite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteAsset {
    pub blocks: Vec<SpriteBlock>,
    pub colors: Vec<u8>,
}

impl SpriteAsset {
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// All blocks back to back, ready to load at the sprite base address.
    pub fn concat(&self) -> Vec<u8> {
        self.blocks.iter().flatten().copied().collect()
    }
}

/// Encode every resolved sprite. Nothing is returned if any sprite fails.
pub fn encode_sprites(
    resolutions: &[CellResolution],
    config: &ModeConfig,
    shared: &SharedColors,
) -> Result<SpriteAsset> {
    let blocks = resolutions
        .iter()
        .map(|res| encode_sprite(res, config, shared))
        .collect::<Result<Vec<_>>>()?;
    let colors = resolutions
        .iter()
        .map(|res| individual_color(res, shared))
        .collect();
    log::debug!("encoded {} {} sprites", blocks.len(), config.mode);
    Ok(SpriteAsset { blocks, colors })
}
