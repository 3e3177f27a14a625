use c64gfx_core::emit::Assembler;
use c64gfx_core::{MemoryLayout, Mode};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User defaults, stored as `config.json` in the platform config directory.
///
/// Command-line flags override every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverterConfig {
    #[serde(default)]
    pub addresses: MemoryLayout,
    #[serde(default = "default_bitmap_mode")]
    pub bitmap_mode: Mode,
    #[serde(default = "default_sprite_mode")]
    pub sprite_mode: Mode,
    #[serde(default = "default_false")]
    pub dither: bool,
    #[serde(default)]
    pub assembler: Assembler,
    #[serde(default = "default_true")]
    pub preview: bool,
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

fn default_bitmap_mode() -> Mode {
    Mode::BitmapMulticolor
}

fn default_sprite_mode() -> Mode {
    Mode::SpriteHires
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            addresses: MemoryLayout::default(),
            bitmap_mode: default_bitmap_mode(),
            sprite_mode: default_sprite_mode(),
            dither: false,
            assembler: Assembler::default(),
            preview: true,
        }
    }
}

impl ConverterConfig {
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "c64gfx").map(|dirs| dirs.config_dir().join("config.json"))
    }

    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Read `path`, falling back to defaults when it is missing or invalid.
    pub fn load_from(path: &Path) -> Self {
        if path.exists()
            && let Ok(data) = std::fs::read_to_string(path)
        {
            match serde_json::from_str(&data) {
                Ok(config) => return config,
                Err(e) => log::warn!("ignoring {}: {}", path.display(), e),
            }
        }
        Self::default()
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }
}
