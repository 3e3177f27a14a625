//! Conversion entry points
//!
//! Each call runs the whole chain once: quantize, partition, pick the shared
//! colors, resolve, encode, summarize. Configuration and geometry are checked
//! before any work starts, and a failed call returns no assets.

use crate::bitmap::{BitmapAsset, encode_bitmap};
use crate::cells::{Cell, Region, partition};
use crate::error::{GfxError, Result};
use crate::grid::PixelGrid;
use crate::mode::{ModeConfig, SharedColors};
use crate::palette::is_valid_index;
use crate::quantize::quantize;
use crate::report::{AnalysisReport, Manifest, MemoryLayout};
use crate::resolve::{CellResolution, resolve_cells};
use crate::sprite::{SpriteAsset, check_regions, encode_sprites, tile_regions};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    pub dither: bool,
    pub layout: MemoryLayout,
    pub border_color: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct BitmapConversion {
    pub asset: BitmapAsset,
    pub shared: SharedColors,
    pub report: AnalysisReport,
    pub manifest: Manifest,
}

#[derive(Debug, Clone)]
pub struct SpriteConversion {
    pub asset: SpriteAsset,
    pub shared: SharedColors,
    pub report: AnalysisReport,
    pub manifest: Manifest,
}

fn check_bitmap_size(pixels: &PixelGrid, config: &ModeConfig) -> Result<()> {
    let (width, height) = config.mode.resolution();
    if pixels.width() != width || pixels.height() != height {
        return Err(GfxError::Dimension(format!(
            "{} needs a {}x{} image, got {}x{}",
            config.mode,
            width,
            height,
            pixels.width(),
            pixels.height()
        )));
    }
    Ok(())
}

fn check_strict(config: &ModeConfig, resolutions: &[CellResolution]) -> Result<()> {
    if !config.strict {
        return Ok(());
    }
    match resolutions.iter().find(|r| r.conflict) {
        Some(res) => Err(GfxError::Conflict {
            cell_x: res.cell_x,
            cell_y: res.cell_y,
            colors: res.natural.clone(),
        }),
        None => Ok(()),
    }
}

/// Convert a full-screen image into bitmap, screen and color memory.
pub fn convert_bitmap(
    pixels: &PixelGrid,
    config: &ModeConfig,
    options: &ConvertOptions,
) -> Result<BitmapConversion> {
    if !config.mode.is_bitmap() {
        return Err(GfxError::Config(format!(
            "{} is not a bitmap mode",
            config.mode
        )));
    }
    config.validate_for_encoding()?;
    if let Some(border) = options.border_color
        && !is_valid_index(border)
    {
        return Err(GfxError::Config(format!(
            "border color {} is not a palette index",
            border
        )));
    }
    options.layout.check_vic_bank()?;
    check_bitmap_size(pixels, config)?;

    let grid = quantize(pixels, options.dither);
    let (cell_w, cell_h) = config.mode.cell_size();
    let cells = partition(&grid, cell_w, cell_h)?;
    let shared = SharedColors::select(&grid.histogram(), config);
    let resolutions = resolve_cells(&cells, config, &shared);
    check_strict(config, &resolutions)?;

    let asset = encode_bitmap(&resolutions, config, &shared)?;
    let manifest = Manifest::for_bitmap(
        config,
        &resolutions,
        &shared,
        &asset,
        &options.layout,
        options.border_color,
    );
    let report = AnalysisReport::build(
        config,
        (grid.width(), grid.height()),
        &resolutions,
        &shared,
        false,
    );

    log::info!(
        "converted {}x{} image to {}: {} colors, {} conflicts",
        grid.width(),
        grid.height(),
        config.mode,
        manifest.palette.used.len(),
        manifest.conflict_count
    );

    Ok(BitmapConversion {
        asset,
        shared,
        report,
        manifest,
    })
}

/// Convert the first `count` sprites of a sprite sheet (all when `None`).
pub fn convert_sprites(
    pixels: &PixelGrid,
    config: &ModeConfig,
    count: Option<usize>,
    options: &ConvertOptions,
) -> Result<SpriteConversion> {
    let regions = tile_regions(config.mode, pixels.width(), pixels.height(), count)?;
    convert_sprite_regions(pixels, config, &regions, options)
}

/// Convert explicit sprite-sized regions of an image.
///
/// All sprites share one set of shared colors, picked from the combined
/// histogram of the regions. Sprite `n` is reported as cell `(n, 0)`.
pub fn convert_sprite_regions(
    pixels: &PixelGrid,
    config: &ModeConfig,
    regions: &[Region],
    options: &ConvertOptions,
) -> Result<SpriteConversion> {
    if !config.mode.is_sprite() {
        return Err(GfxError::Config(format!(
            "{} is not a sprite mode",
            config.mode
        )));
    }
    config.validate_for_encoding()?;
    check_regions(config.mode, regions)?;

    let grid = quantize(pixels, options.dither);
    let cells = regions
        .iter()
        .enumerate()
        .map(|(i, region)| Cell::from_region(&grid, i, i, 0, *region))
        .collect::<Result<Vec<_>>>()?;
    let shared = SharedColors::select(&combined_histogram(&cells), config);
    let resolutions = resolve_cells(&cells, config, &shared);
    check_strict(config, &resolutions)?;

    let asset = encode_sprites(&resolutions, config, &shared)?;
    let manifest = Manifest::for_sprites(config, &resolutions, &shared, &asset, &options.layout);
    let report = AnalysisReport::build(
        config,
        (grid.width(), grid.height()),
        &resolutions,
        &shared,
        false,
    );

    log::info!(
        "converted {} {} sprites: {} conflicts",
        asset.len(),
        config.mode,
        manifest.conflict_count
    );

    Ok(SpriteConversion {
        asset,
        shared,
        report,
        manifest,
    })
}

fn combined_histogram(cells: &[Cell]) -> [u32; 16] {
    let mut counts = [0u32; 16];
    for cell in cells {
        for (total, n) in counts.iter_mut().zip(cell.histogram()) {
            *total += n;
        }
    }
    counts
}

/// Resolve without encoding, for palette feedback before a conversion.
///
/// Bitmap modes need the exact screen resolution; sprite modes analyze
/// every sprite of the sheet.
pub fn analyze(
    pixels: &PixelGrid,
    config: &ModeConfig,
    dither: bool,
    constraints_only: bool,
) -> Result<AnalysisReport> {
    config.validate()?;

    let grid = quantize(pixels, dither);
    let cells = if config.mode.is_bitmap() {
        check_bitmap_size(pixels, config)?;
        let (cell_w, cell_h) = config.mode.cell_size();
        partition(&grid, cell_w, cell_h)?
    } else {
        tile_regions(config.mode, grid.width(), grid.height(), None)?
            .into_iter()
            .enumerate()
            .map(|(i, region)| Cell::from_region(&grid, i, i, 0, region))
            .collect::<Result<Vec<_>>>()?
    };

    let histogram = if config.mode.is_bitmap() {
        grid.histogram()
    } else {
        combined_histogram(&cells)
    };
    let shared = SharedColors::select(&histogram, config);
    let resolutions = resolve_cells(&cells, config, &shared);

    Ok(AnalysisReport::build(
        config,
        (grid.width(), grid.height()),
        &resolutions,
        &shared,
        constraints_only,
    ))
}
