use crate::error::{GfxError, Result};
use crate::grid::rank_by_frequency;
use crate::palette::is_valid_index;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Screen size in cells for both bitmap modes.
pub const SCREEN_CELLS_X: usize = 40;
pub const SCREEN_CELLS_Y: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    BitmapHires,
    BitmapMulticolor,
    SpriteHires,
    SpriteMulticolor,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for Mode {
    type Err = GfxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bitmap_hires" => Ok(Mode::BitmapHires),
            "bitmap_multicolor" => Ok(Mode::BitmapMulticolor),
            "sprite_hires" => Ok(Mode::SpriteHires),
            "sprite_multicolor" => Ok(Mode::SpriteMulticolor),
            other => Err(GfxError::Config(format!("unknown mode tag '{}'", other))),
        }
    }
}

impl Mode {
    pub fn all() -> &'static [Mode] {
        &[
            Mode::BitmapHires,
            Mode::BitmapMulticolor,
            Mode::SpriteHires,
            Mode::SpriteMulticolor,
        ]
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Mode::BitmapHires => "bitmap_hires",
            Mode::BitmapMulticolor => "bitmap_multicolor",
            Mode::SpriteHires => "sprite_hires",
            Mode::SpriteMulticolor => "sprite_multicolor",
        }
    }

    pub fn is_bitmap(&self) -> bool {
        matches!(self, Mode::BitmapHires | Mode::BitmapMulticolor)
    }

    pub fn is_sprite(&self) -> bool {
        !self.is_bitmap()
    }

    pub fn is_multicolor(&self) -> bool {
        matches!(self, Mode::BitmapMulticolor | Mode::SpriteMulticolor)
    }

    pub fn bits_per_pixel(&self) -> usize {
        if self.is_multicolor() { 2 } else { 1 }
    }

    /// Logical resolution the mode converts: the whole screen for bitmaps,
    /// one sprite for sprite modes.
    pub fn resolution(&self) -> (usize, usize) {
        match self {
            Mode::BitmapHires => (320, 200),
            Mode::BitmapMulticolor => (160, 200),
            Mode::SpriteHires => (24, 21),
            Mode::SpriteMulticolor => (12, 21),
        }
    }

    /// Size of the color-constrained cell in logical pixels.
    pub fn cell_size(&self) -> (usize, usize) {
        match self {
            Mode::BitmapHires => (8, 8),
            Mode::BitmapMulticolor => (4, 8),
            Mode::SpriteHires | Mode::SpriteMulticolor => self.resolution(),
        }
    }

    /// Colors a cell may pick for itself in hardware.
    pub fn local_slots(&self) -> u8 {
        match self {
            Mode::BitmapHires => 2,
            Mode::BitmapMulticolor => 3,
            Mode::SpriteHires | Mode::SpriteMulticolor => 1,
        }
    }

    /// Colors shared by every cell (background and sprite multicolor registers).
    pub fn shared_slots(&self) -> u8 {
        match self {
            Mode::BitmapHires => 0,
            Mode::BitmapMulticolor => 1,
            Mode::SpriteHires => 1,
            Mode::SpriteMulticolor => 3,
        }
    }
}

/// How the globally shared colors are picked.
///
/// `None` / missing entries are chosen automatically by frequency over the
/// whole image (or the whole sprite set).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedColorPolicy {
    #[serde(default)]
    pub background: Option<u8>,
    #[serde(default)]
    pub extra: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeConfig {
    pub mode: Mode,
    /// Total colors per cell, shared slots included.
    pub budget: u8,
    /// How many of the budget slots are shared across the whole image.
    pub shared_slots: u8,
    #[serde(default)]
    pub policy: SharedColorPolicy,
    /// Abort on the first conflicted cell instead of reporting it.
    #[serde(default)]
    pub strict: bool,
}

impl ModeConfig {
    pub fn new(mode: Mode, budget: u8, shared_slots: u8) -> Self {
        Self {
            mode,
            budget,
            shared_slots,
            policy: SharedColorPolicy::default(),
            strict: false,
        }
    }

    /// Hardware defaults for `mode`.
    pub fn for_mode(mode: Mode) -> Self {
        Self::new(
            mode,
            mode.local_slots() + mode.shared_slots(),
            mode.shared_slots(),
        )
    }

    pub fn with_background(mut self, background: Option<u8>) -> Self {
        self.policy.background = background;
        self
    }

    pub fn with_extra_shared(mut self, extra: Vec<u8>) -> Self {
        self.policy.extra = extra;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn local_budget(&self) -> usize {
        self.budget.saturating_sub(self.shared_slots) as usize
    }

    /// Checks the invariants every stage relies on.
    pub fn validate(&self) -> Result<()> {
        if !(1..=4).contains(&self.budget) {
            return Err(GfxError::Config(format!(
                "budget must be between 1 and 4, got {}",
                self.budget
            )));
        }
        if self.shared_slots >= self.budget {
            return Err(GfxError::Config(format!(
                "shared slot count ({}) must be lower than the budget ({})",
                self.shared_slots, self.budget
            )));
        }
        let capacity = 1usize << self.mode.bits_per_pixel();
        if self.budget as usize > capacity {
            return Err(GfxError::Config(format!(
                "{} can show at most {} colors per cell, budget is {}",
                self.mode, capacity, self.budget
            )));
        }
        if let Some(bg) = self.policy.background
            && !is_valid_index(bg)
        {
            return Err(GfxError::Config(format!(
                "background color {} is not a palette index",
                bg
            )));
        }
        if let Some(bad) = self.policy.extra.iter().find(|c| !is_valid_index(**c)) {
            return Err(GfxError::Config(format!(
                "shared color {} is not a palette index",
                bad
            )));
        }
        if !self.policy.extra.is_empty()
            && self.policy.extra.len() > self.shared_slots.saturating_sub(1) as usize
        {
            return Err(GfxError::Config(format!(
                "{} extra shared colors given but only {} shared slots besides the background",
                self.policy.extra.len(),
                self.shared_slots.saturating_sub(1)
            )));
        }
        Ok(())
    }

    /// Extra checks for encoders: the resolved colors must fit the hardware
    /// registers of the mode.
    pub fn validate_for_encoding(&self) -> Result<()> {
        self.validate()?;
        if self.local_budget() > self.mode.local_slots() as usize {
            return Err(GfxError::Config(format!(
                "{} cells hold at most {} local colors, config asks for {}",
                self.mode,
                self.mode.local_slots(),
                self.local_budget()
            )));
        }
        if self.shared_slots > self.mode.shared_slots() {
            return Err(GfxError::Config(format!(
                "{} has {} shared color registers, config asks for {}",
                self.mode,
                self.mode.shared_slots(),
                self.shared_slots
            )));
        }
        Ok(())
    }
}

/// Colors fixed across the whole image or sprite set.
///
/// Computed once per conversion, before any per-cell work, and passed by
/// reference into every resolution call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedColors {
    /// Global background (`$D021`). Always set, even when no slot reserves it.
    pub background: u8,
    /// Reserved colors in register order; `slots[0]` is the background when
    /// the mode reserves any slot at all.
    pub slots: Vec<u8>,
}

impl SharedColors {
    /// Pick shared colors from the pixel histogram of everything being
    /// converted.
    pub fn select(histogram: &[u32; 16], config: &ModeConfig) -> Self {
        let ranked = rank_by_frequency(histogram);
        let background = config
            .policy
            .background
            .or_else(|| ranked.first().copied())
            .unwrap_or(0);

        let wanted = config.shared_slots as usize;
        let mut slots = Vec::with_capacity(wanted);
        if wanted > 0 {
            slots.push(background);
        }
        for &c in &config.policy.extra {
            if slots.len() < wanted {
                slots.push(c);
            }
        }
        for &c in &ranked {
            if slots.len() >= wanted {
                break;
            }
            if !slots.contains(&c) {
                slots.push(c);
            }
        }
        while slots.len() < wanted {
            slots.push(background);
        }

        log::debug!("shared colors: background {} slots {:?}", background, slots);
        Self { background, slots }
    }

    pub fn is_reserved(&self, color: u8) -> bool {
        self.slots.contains(&color)
    }

    /// Shared slot `n`, falling back to the background.
    pub fn slot(&self, n: usize) -> u8 {
        self.slots.get(n).copied().unwrap_or(self.background)
    }
}
