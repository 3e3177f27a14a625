//! Per-cell color budget enforcement.
//!
//! Greedy and frequency based: reserved colors are always available, the
//! remaining colors are ranked by pixel count (ties toward the lower palette
//! index) and the top `budget - shared` are kept. Pixels of dropped colors
//! move to the nearest available color. The outcome is deterministic so the
//! conflict report stays stable between runs.

use crate::cells::{Cell, Region};
use crate::mode::{ModeConfig, SharedColors};
use crate::palette::{get_vic_color, nearest_in};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellResolution {
    pub index: usize,
    pub cell_x: usize,
    pub cell_y: usize,
    pub region: Region,
    /// All colors the cell had before resolution, ranked.
    pub natural: Vec<u8>,
    /// Local colors kept, in rank order. Reserved colors are not listed.
    pub kept: Vec<u8>,
    pub dropped: BTreeSet<u8>,
    pub conflict: bool,
    /// Final palette index per pixel, row-major within the cell. Every value
    /// is either reserved or in `kept`.
    pub pixels: Vec<u8>,
}

impl CellResolution {
    /// Distinct colors the cell actually shows after resolution.
    pub fn resolved_colors(&self) -> Vec<u8> {
        let set: BTreeSet<u8> = self.pixels.iter().copied().collect();
        set.into_iter().collect()
    }
}

/// Resolve a single cell against the shared colors.
pub fn resolve_cell(cell: &Cell, shared: &SharedColors, local_budget: usize) -> CellResolution {
    let natural = cell.ranked_colors();

    let local: Vec<u8> = natural
        .iter()
        .copied()
        .filter(|c| !shared.is_reserved(*c))
        .collect();

    let kept: Vec<u8> = local.iter().copied().take(local_budget).collect();
    let dropped: BTreeSet<u8> = local.iter().copied().skip(local_budget).collect();
    let conflict = !dropped.is_empty();

    let pixels = if dropped.is_empty() {
        cell.pixels.clone()
    } else {
        let mut available: Vec<u8> = shared.slots.clone();
        available.extend_from_slice(&kept);
        cell.pixels
            .iter()
            .map(|&p| {
                if dropped.contains(&p) {
                    nearest_in(get_vic_color(p), &available).unwrap_or(p)
                } else {
                    p
                }
            })
            .collect()
    };

    CellResolution {
        index: cell.index,
        cell_x: cell.cell_x,
        cell_y: cell.cell_y,
        region: cell.region,
        natural,
        kept,
        dropped,
        conflict,
        pixels,
    }
}

/// Resolve every cell. The config must already be validated; `shared` is
/// computed once by the caller and only read here.
pub fn resolve_cells(
    cells: &[Cell],
    config: &ModeConfig,
    shared: &SharedColors,
) -> Vec<CellResolution> {
    let local_budget = config.local_budget();
    let resolutions: Vec<CellResolution> = cells
        .iter()
        .map(|cell| resolve_cell(cell, shared, local_budget))
        .collect();

    let conflicts = resolutions.iter().filter(|r| r.conflict).count();
    if conflicts > 0 {
        log::warn!(
            "{}: {} of {} cells exceed the {}-color budget",
            config.mode,
            conflicts,
            resolutions.len(),
            config.budget
        );
    }
    resolutions
}
