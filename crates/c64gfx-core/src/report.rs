//! Conversion summaries: manifests, conflict lists and text reports
//!
//! Everything here reads encoder outputs and resolutions that already exist;
//! nothing is quantized or resolved again, so reports always match the
//! bytes that were written.

use crate::bitmap::BitmapAsset;
use crate::cells::Region;
use crate::error::{GfxError, Result};
use crate::grid::used_indices;
use crate::mode::{Mode, ModeConfig, SharedColors};
use crate::palette::{PaletteEntry, VIC_II_PALETTE};
use crate::resolve::CellResolution;
use crate::sprite::{SPRITE_BLOCK_SIZE, SpriteAsset};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Text reports list at most this many conflicted cells.
pub const REPORT_CONFLICT_LIMIT: usize = 25;
/// Size of one VIC-II memory bank.
pub const VIC_BANK_SIZE: u16 = 0x4000;

const BITMAP_NOTE: &str = "color.bin uses the low nibble for color RAM values.";

/// Load addresses for every asset kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLayout {
    pub bitmap: u16,
    pub screen: u16,
    pub color: u16,
    pub sprites: u16,
}

impl Default for MemoryLayout {
    fn default() -> Self {
        Self {
            bitmap: 0x2000,
            screen: 0x0400,
            color: 0xD800,
            sprites: 0x3000,
        }
    }
}

/// Parse an address written as decimal, `0x..`, or `$..`.
pub fn parse_address(text: &str) -> Result<u16> {
    let text = text.trim();
    let parsed = if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .or_else(|| text.strip_prefix('$'))
    {
        u16::from_str_radix(hex, 16)
    } else {
        text.parse::<u16>()
    };
    parsed.map_err(|_| GfxError::Config(format!("invalid address '{}'", text)))
}

impl MemoryLayout {
    /// Apply overrides from a JSON object such as
    /// `{"bitmap": "$6000", "screen": 17408}`.
    pub fn with_overrides(
        mut self,
        overrides: &BTreeMap<String, serde_json::Value>,
    ) -> Result<Self> {
        for (key, value) in overrides {
            let address = match value {
                serde_json::Value::String(s) => parse_address(s)?,
                serde_json::Value::Number(n) => n
                    .as_u64()
                    .and_then(|v| u16::try_from(v).ok())
                    .ok_or_else(|| GfxError::Config(format!("address {} out of range", n)))?,
                other => {
                    return Err(GfxError::Config(format!(
                        "address for '{}' must be a number or string, got {}",
                        key, other
                    )));
                }
            };
            match key.as_str() {
                "bitmap" => self.bitmap = address,
                "screen" => self.screen = address,
                "color" => self.color = address,
                "sprites" => self.sprites = address,
                other => {
                    return Err(GfxError::Config(format!(
                        "unknown memory region '{}'",
                        other
                    )));
                }
            }
        }
        Ok(self)
    }

    /// Bank (0..=3) the VIC-II must be switched to for the bitmap.
    pub fn vic_bank(&self) -> u16 {
        self.bitmap / VIC_BANK_SIZE
    }

    /// The VIC-II reads bitmap and screen from the same 16K bank.
    pub fn check_vic_bank(&self) -> Result<()> {
        let screen_bank = self.screen / VIC_BANK_SIZE;
        if screen_bank != self.vic_bank() {
            return Err(GfxError::Config(format!(
                "bitmap ${:04X} (bank {}) and screen ${:04X} (bank {}) must share a VIC bank",
                self.bitmap,
                self.vic_bank(),
                self.screen,
                screen_bank
            )));
        }
        Ok(())
    }
}

fn serialize_hex_byte<S: Serializer>(
    value: &u8,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("${:02X}", value))
}

/// VIC-II register values needed to show a bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VicRegisters {
    #[serde(serialize_with = "serialize_hex_byte")]
    pub d011: u8,
    #[serde(serialize_with = "serialize_hex_byte")]
    pub d016: u8,
    #[serde(serialize_with = "serialize_hex_byte")]
    pub d018: u8,
}

impl VicRegisters {
    pub fn for_bitmap(mode: Mode, layout: &MemoryLayout) -> Self {
        // Screen in 1K units, bitmap in 2K units, both within the VIC bank.
        let screen_base = ((layout.screen / 0x0400) & 0x0F) as u8;
        let bitmap_base = ((layout.bitmap / 0x0800) & 0x07) as u8;
        Self {
            // bitmap mode on, screen on, 25 rows, default y-scroll
            d011: 0x3B,
            d016: if mode.is_multicolor() { 0x18 } else { 0x08 },
            d018: (screen_base << 4) | (bitmap_base << 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetEntry {
    pub name: String,
    pub file: String,
    pub address: u16,
    pub size: usize,
}

/// A cell or sprite that lost colors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictEntry {
    pub cell_x: usize,
    pub cell_y: usize,
    /// Colors the cell had before resolution, ranked.
    pub colors: Vec<u8>,
    pub kept: Vec<u8>,
    pub dropped: Vec<u8>,
}

impl From<&CellResolution> for ConflictEntry {
    fn from(res: &CellResolution) -> Self {
        Self {
            cell_x: res.cell_x,
            cell_y: res.cell_y,
            colors: res.natural.clone(),
            kept: res.kept.clone(),
            dropped: res.dropped.iter().copied().collect(),
        }
    }
}

pub fn conflict_entries(resolutions: &[CellResolution]) -> Vec<ConflictEntry> {
    resolutions
        .iter()
        .filter(|r| r.conflict)
        .map(ConflictEntry::from)
        .collect()
}

/// Pixel count per palette index over the resolved (encoded) pixels.
pub fn palette_usage(resolutions: &[CellResolution]) -> [u32; 16] {
    let mut counts = [0u32; 16];
    for p in resolutions.iter().flat_map(|r| r.pixels.iter()) {
        counts[(p & 0x0F) as usize] += 1;
    }
    counts
}

/// Share of all pixels per palette index, 0.0 to 1.0.
pub fn usage_ratio(usage: &[u32; 16]) -> [f64; 16] {
    let total: u64 = usage.iter().map(|&c| c as u64).sum();
    let mut ratios = [0.0; 16];
    if total > 0 {
        for (ratio, &count) in ratios.iter_mut().zip(usage) {
            *ratio = count as f64 / total as f64;
        }
    }
    ratios
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaletteInfo {
    pub used: Vec<u8>,
    pub entries: Vec<PaletteEntry>,
    pub background: u8,
    pub border: Option<u8>,
    pub shared: Vec<u8>,
    pub color_ram_nibble: &'static str,
}

impl PaletteInfo {
    fn new(usage: &[u32; 16], shared: &SharedColors, border: Option<u8>) -> Self {
        let used = used_indices(usage);
        let entries = VIC_II_PALETTE
            .iter()
            .filter(|e| used.contains(&e.index))
            .copied()
            .collect();
        Self {
            used,
            entries,
            background: shared.background,
            border,
            shared: shared.slots.clone(),
            color_ram_nibble: "low",
        }
    }
}

/// Per-sprite metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpriteEntry {
    pub index: usize,
    pub file: String,
    pub region: Region,
    pub address: u16,
    /// Sprite pointer value: `(address / 64) % 256`.
    pub pointer: u8,
    pub palette_used: Vec<u8>,
    pub individual_color: u8,
    pub conflict: bool,
    pub dropped: Vec<u8>,
}

pub fn sprite_file_name(index: usize) -> String {
    format!("sprite_{:03}.bin", index)
}

/// Summary written next to the binary assets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manifest {
    pub mode: Mode,
    pub width: usize,
    pub height: usize,
    pub addresses: MemoryLayout,
    pub assets: Vec<AssetEntry>,
    pub conflict_count: usize,
    pub conflicts: Vec<ConflictEntry>,
    pub palette_usage: [u32; 16],
    pub palette: PaletteInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vic_registers: Option<VicRegisters>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sprites: Vec<SpriteEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Manifest {
    pub fn for_bitmap(
        config: &ModeConfig,
        resolutions: &[CellResolution],
        shared: &SharedColors,
        asset: &BitmapAsset,
        layout: &MemoryLayout,
        border: Option<u8>,
    ) -> Self {
        let (width, height) = config.mode.resolution();
        let usage = palette_usage(resolutions);
        let conflicts = conflict_entries(resolutions);
        let entry = |name: &str, file: &str, address: u16, size: usize| AssetEntry {
            name: name.to_string(),
            file: file.to_string(),
            address,
            size,
        };
        Self {
            mode: config.mode,
            width,
            height,
            addresses: *layout,
            assets: vec![
                entry("bitmap", "bitmap.bin", layout.bitmap, asset.plane.len()),
                entry("screen", "screen.bin", layout.screen, asset.screen.len()),
                entry("color", "color.bin", layout.color, asset.color.len()),
            ],
            conflict_count: conflicts.len(),
            conflicts,
            palette_usage: usage,
            palette: PaletteInfo::new(&usage, shared, border),
            vic_registers: Some(VicRegisters::for_bitmap(config.mode, layout)),
            sprites: Vec::new(),
            notes: Some(BITMAP_NOTE.to_string()),
        }
    }

    pub fn for_sprites(
        config: &ModeConfig,
        resolutions: &[CellResolution],
        shared: &SharedColors,
        asset: &SpriteAsset,
        layout: &MemoryLayout,
    ) -> Self {
        let (width, height) = config.mode.resolution();
        let usage = palette_usage(resolutions);
        let conflicts = conflict_entries(resolutions);

        let mut assets = Vec::with_capacity(asset.len());
        let mut sprites = Vec::with_capacity(asset.len());
        for (i, (res, &color)) in resolutions.iter().zip(&asset.colors).enumerate() {
            let address = layout.sprites.wrapping_add((i * SPRITE_BLOCK_SIZE) as u16);
            let file = sprite_file_name(i);
            assets.push(AssetEntry {
                name: format!("sprite_{:03}", i),
                file: file.clone(),
                address,
                size: SPRITE_BLOCK_SIZE,
            });
            sprites.push(SpriteEntry {
                index: i,
                file,
                region: res.region,
                address,
                pointer: ((address as usize / SPRITE_BLOCK_SIZE) % 256) as u8,
                palette_used: res.natural.clone(),
                individual_color: color,
                conflict: res.conflict,
                dropped: res.dropped.iter().copied().collect(),
            });
        }

        Self {
            mode: config.mode,
            width,
            height,
            addresses: *layout,
            assets,
            conflict_count: conflicts.len(),
            conflicts,
            palette_usage: usage,
            palette: PaletteInfo::new(&usage, shared, None),
            vic_registers: None,
            sprites,
            notes: None,
        }
    }

    pub fn asset(&self, name: &str) -> Option<&AssetEntry> {
        self.assets.iter().find(|a| a.name == name)
    }

    pub fn usage_ratio(&self) -> [f64; 16] {
        usage_ratio(&self.palette_usage)
    }
}

/// Pre-flight and post-conversion report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub mode: Mode,
    pub image_size: [usize; 2],
    /// Empty when only constraints were requested.
    pub palette_used: Vec<u8>,
    pub background_color: u8,
    pub conflict_count: usize,
    pub conflicts: Vec<ConflictEntry>,
    pub palette_usage: [u32; 16],
}

impl AnalysisReport {
    pub fn build(
        config: &ModeConfig,
        image_size: (usize, usize),
        resolutions: &[CellResolution],
        shared: &SharedColors,
        constraints_only: bool,
    ) -> Self {
        let usage = palette_usage(resolutions);
        let conflicts = conflict_entries(resolutions);
        Self {
            mode: config.mode,
            image_size: [image_size.0, image_size.1],
            palette_used: if constraints_only {
                Vec::new()
            } else {
                used_indices(&usage)
            },
            background_color: shared.background,
            conflict_count: conflicts.len(),
            conflicts,
            palette_usage: usage,
        }
    }

    pub fn to_text(&self) -> String {
        let mut lines = vec![
            format!("mode: {}", self.mode),
            format!("image_size: {}x{}", self.image_size[0], self.image_size[1]),
            format!("palette_used: {} colors", self.palette_used.len()),
            format!("conflicts: {}", self.conflict_count),
        ];
        if !self.conflicts.is_empty() {
            lines.push("conflict_cells:".to_string());
            for c in self.conflicts.iter().take(REPORT_CONFLICT_LIMIT) {
                let (x, y) = (c.cell_x, c.cell_y);
                lines.push(format!("- cell ({},{}): {:?}", x, y, c.colors));
            }
            if self.conflicts.len() > REPORT_CONFLICT_LIMIT {
                lines.push("... more conflicts omitted".to_string());
            }
        }
        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn resolution(cell_x: usize, pixels: Vec<u8>, dropped: &[u8]) -> CellResolution {
        CellResolution {
            index: cell_x,
            cell_x,
            cell_y: 0,
            region: Region::new(cell_x * 4, 0, 4, 1),
            natural: vec![1, 2],
            kept: vec![1],
            dropped: dropped.iter().copied().collect::<BTreeSet<u8>>(),
            conflict: !dropped.is_empty(),
            pixels,
        }
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("$2000").unwrap(), 0x2000);
        assert_eq!(parse_address("0xd800").unwrap(), 0xD800);
        assert_eq!(parse_address("1024").unwrap(), 1024);
        assert!(parse_address("$10000").is_err());
        assert!(parse_address("bitmap").is_err());
    }

    #[test]
    fn test_layout_overrides() {
        let overrides: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(r#"{"bitmap": "$6000", "screen": 17408}"#).unwrap();
        let layout = MemoryLayout::default().with_overrides(&overrides).unwrap();
        assert_eq!(layout.bitmap, 0x6000);
        assert_eq!(layout.screen, 0x4400);
        assert_eq!(layout.color, 0xD800);

        let bad: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(r#"{"charset": "$3000"}"#).unwrap();
        assert!(MemoryLayout::default().with_overrides(&bad).is_err());
    }

    #[test]
    fn test_bitmap_and_screen_share_a_bank() {
        let layout = MemoryLayout {
            bitmap: 0x6000,
            screen: 0x4400,
            ..Default::default()
        };
        assert_eq!(layout.vic_bank(), 1);
        assert!(layout.check_vic_bank().is_ok());
        assert!(MemoryLayout::default().check_vic_bank().is_ok());

        let split = MemoryLayout {
            screen: 0x0400,
            ..layout
        };
        assert!(matches!(split.check_vic_bank(), Err(GfxError::Config(_))));
    }

    #[test]
    fn test_vic_registers() {
        let regs = VicRegisters::for_bitmap(Mode::BitmapMulticolor, &MemoryLayout::default());
        assert_eq!(regs.d011, 0x3B);
        assert_eq!(regs.d016, 0x18);
        assert_eq!(regs.d018, 0x18);
        let json = serde_json::to_value(regs).unwrap();
        assert_eq!(json["d018"], "$18");
        let hires = VicRegisters::for_bitmap(Mode::BitmapHires, &MemoryLayout::default());
        assert_eq!(hires.d016, 0x08);
    }

    #[test]
    fn test_usage_counts_resolved_pixels() {
        let res = vec![
            resolution(0, vec![1, 1, 1, 1], &[2]),
            resolution(1, vec![1, 1, 0, 0], &[]),
        ];
        let usage = palette_usage(&res);
        assert_eq!(usage[1], 6);
        assert_eq!(usage[0], 2);
        assert_eq!(usage[2], 0);
        assert_eq!(usage_ratio(&usage)[1], 0.75);
    }

    #[test]
    fn test_report_text_truncates() {
        let res: Vec<CellResolution> = (0..30).map(|i| resolution(i, vec![1; 4], &[2])).collect();
        let config = ModeConfig::for_mode(Mode::BitmapHires);
        let shared = SharedColors {
            background: 1,
            slots: vec![],
        };
        let report = AnalysisReport::build(&config, (320, 200), &res, &shared, false);
        let text = report.to_text();
        let header = "mode: bitmap_hires\nimage_size: 320x200\n";
        assert!(text.starts_with(header));
        assert!(text.contains("palette_used: 1 colors"));
        assert!(text.contains("conflicts: 30"));
        assert!(text.contains("- cell (24,0): [1, 2]"));
        assert!(!text.contains("- cell (25,0)"));
        assert!(text.ends_with("... more conflicts omitted\n"));

        let report = AnalysisReport::build(&config, (320, 200), &res, &shared, true);
        assert!(report.palette_used.is_empty());
    }
}
