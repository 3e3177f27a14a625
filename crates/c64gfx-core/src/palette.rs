//! VIC-II color palette and nearest-color matching
//!
//! The sixteen hardware colors are fixed for the lifetime of the process and
//! shared read-only by every quantization call.

use serde::Serialize;

/// Number of hardware colors.
pub const PALETTE_SIZE: usize = 16;

/// A single hardware color with its reference RGB value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaletteEntry {
    pub index: u8,
    pub name: &'static str,
    pub rgb: [u8; 3],
    pub hex: &'static str,
}

/// VIC-II RGB palette (16 colors)
///
/// Each color is represented as [R, G, B] in 0-255 range.
pub const VIC_II_PALETTE: [PaletteEntry; PALETTE_SIZE] = [
    entry(0, "black", [0, 0, 0], "#000000"),
    entry(1, "white", [255, 255, 255], "#ffffff"),
    entry(2, "red", [136, 0, 0], "#880000"),
    entry(3, "cyan", [170, 255, 238], "#aaffee"),
    entry(4, "purple", [204, 68, 204], "#cc44cc"),
    entry(5, "green", [0, 204, 85], "#00cc55"),
    entry(6, "blue", [0, 0, 170], "#0000aa"),
    entry(7, "yellow", [238, 238, 119], "#eeee77"),
    entry(8, "orange", [221, 136, 85], "#dd8855"),
    entry(9, "brown", [102, 68, 0], "#664400"),
    entry(10, "light_red", [255, 119, 119], "#ff7777"),
    entry(11, "dark_gray", [51, 51, 51], "#333333"),
    entry(12, "gray", [119, 119, 119], "#777777"),
    entry(13, "light_green", [170, 255, 102], "#aaff66"),
    entry(14, "light_blue", [0, 136, 255], "#0088ff"),
    entry(15, "light_gray", [187, 187, 187], "#bbbbbb"),
];

const fn entry(index: u8, name: &'static str, rgb: [u8; 3], hex: &'static str) -> PaletteEntry {
    PaletteEntry {
        index,
        name,
        rgb,
        hex,
    }
}

/// Get RGB color from VIC-II palette by index
///
/// Returns black if index is out of range.
#[inline]
pub fn get_vic_color(index: u8) -> [u8; 3] {
    VIC_II_PALETTE
        .get(index as usize)
        .map(|e| e.rgb)
        .unwrap_or([0, 0, 0])
}

/// Squared Euclidean distance between two RGB triples.
#[inline]
pub fn distance_sq(a: [u8; 3], b: [u8; 3]) -> u32 {
    let dr = a[0] as i32 - b[0] as i32;
    let dg = a[1] as i32 - b[1] as i32;
    let db = a[2] as i32 - b[2] as i32;
    (dr * dr + dg * dg + db * db) as u32
}

/// Index of the palette color closest to `rgb`.
///
/// Ties go to the lower palette index.
pub fn nearest_index(rgb: [u8; 3]) -> u8 {
    let mut best_index = 0u8;
    let mut best_dist = u32::MAX;
    for e in &VIC_II_PALETTE {
        let dist = distance_sq(rgb, e.rgb);
        if dist < best_dist {
            best_dist = dist;
            best_index = e.index;
        }
    }
    best_index
}

/// Like [`nearest_index`] but restricted to `candidates`.
///
/// Candidates are compared in ascending index order so ties are stable
/// regardless of the order they are passed in. Returns `None` when
/// `candidates` is empty.
pub fn nearest_in(rgb: [u8; 3], candidates: &[u8]) -> Option<u8> {
    let mut sorted: Vec<u8> = candidates.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut best: Option<(u32, u8)> = None;
    for index in sorted {
        let dist = distance_sq(rgb, get_vic_color(index));
        match best {
            Some((d, _)) if d <= dist => {}
            _ => best = Some((dist, index)),
        }
    }
    best.map(|(_, index)| index)
}

/// Check that a user supplied color index fits the palette.
pub fn is_valid_index(index: u8) -> bool {
    (index as usize) < PALETTE_SIZE
}
