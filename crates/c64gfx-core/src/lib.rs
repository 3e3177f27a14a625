#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod bitmap;
pub mod cells;
pub mod decode;
pub mod emit;
pub mod error;
pub mod grid;
pub mod mode;
mod pack;
pub mod palette;
pub mod pipeline;
pub mod quantize;
pub mod report;
pub mod resolve;
pub mod sprite;

pub use error::{GfxError, Result};
pub use grid::{PixelGrid, QuantizedGrid};
pub use mode::{Mode, ModeConfig, SharedColorPolicy, SharedColors};
pub use pipeline::{
    BitmapConversion, ConvertOptions, SpriteConversion, analyze, convert_bitmap,
    convert_sprite_regions, convert_sprites,
};
pub use report::{AnalysisReport, Manifest, MemoryLayout};
