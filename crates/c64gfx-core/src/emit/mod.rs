//! Text artifacts derived from a [`Manifest`]: assembler includes, BASIC
//! loader listings and PRG packaging.

pub mod basic;
pub mod formatter;

pub use basic::{emit_basic_loader, load_names, to_prg};
pub use formatter::IncludeFormatter;

use crate::error::GfxError;
use crate::report::Manifest;
use formatter::{AcmeFormatter, Ca65Formatter, KickFormatter, TassFormatter};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Assembler {
    #[default]
    Tass64,
    Acme,
    Ca65,
    Kick,
}

impl std::fmt::Display for Assembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Assembler::Tass64 => write!(f, "64tass"),
            Assembler::Acme => write!(f, "ACME"),
            Assembler::Ca65 => write!(f, "ca65"),
            Assembler::Kick => write!(f, "KickAssembler"),
        }
    }
}

impl FromStr for Assembler {
    type Err = GfxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "64tass" | "tass" | "tass64" => Ok(Assembler::Tass64),
            "acme" => Ok(Assembler::Acme),
            "ca65" => Ok(Assembler::Ca65),
            "kick" | "kickass" | "kickassembler" => Ok(Assembler::Kick),
            other => Err(GfxError::Config(format!("unknown assembler '{}'", other))),
        }
    }
}

impl Assembler {
    pub fn all() -> &'static [Assembler] {
        &[
            Assembler::Tass64,
            Assembler::Acme,
            Assembler::Ca65,
            Assembler::Kick,
        ]
    }

    pub fn formatter(&self) -> Box<dyn IncludeFormatter> {
        match self {
            Assembler::Tass64 => Box::new(TassFormatter),
            Assembler::Acme => Box::new(AcmeFormatter),
            Assembler::Ca65 => Box::new(Ca65Formatter),
            Assembler::Kick => Box::new(KickFormatter),
        }
    }
}

/// Default include file name for a manifest.
pub fn include_file_name(manifest: &Manifest) -> &'static str {
    if manifest.mode.is_bitmap() {
        "bitmap.inc"
    } else {
        "sprites.inc"
    }
}

/// Render the memory layout constants of `manifest` as an include file.
pub fn emit_include(manifest: &Manifest, assembler: Assembler) -> String {
    let fmt = assembler.formatter();
    let mut lines: Vec<String> = Vec::new();
    let mut define = |name: &str, value: u16, is_byte: bool| {
        lines.push(fmt.format_definition(name, value, is_byte));
    };

    let title = format!("{} assets, {} syntax", manifest.mode, assembler);
    let mut out = fmt.format_file_header(&title, include_file_name(manifest));
    out.push('\n');

    for asset in &manifest.assets {
        let name = asset.name.to_ascii_uppercase();
        define(&format!("{}_ADDR", name), asset.address, false);
        define(&format!("{}_SIZE", name), asset.size as u16, false);
    }

    define("BACKGROUND_COLOR", manifest.palette.background as u16, true);
    if let Some(border) = manifest.palette.border {
        define("BORDER_COLOR", border as u16, true);
    }

    if let Some(regs) = &manifest.vic_registers {
        define("VIC_D011", regs.d011 as u16, true);
        define("VIC_D016", regs.d016 as u16, true);
        define("VIC_D018", regs.d018 as u16, true);
    }

    if manifest.mode.is_sprite() {
        define("SPRITES_ADDR", manifest.addresses.sprites, false);
        define("SPRITE_COUNT", manifest.sprites.len() as u16, false);
        for sprite in &manifest.sprites {
            define(
                &format!("SPRITE_{:03}_PTR", sprite.index),
                sprite.pointer as u16,
                true,
            );
            define(
                &format!("SPRITE_{:03}_COLOR", sprite.index),
                sprite.individual_color as u16,
                true,
            );
        }
        if manifest.mode.is_multicolor() {
            let shared = &manifest.palette.shared;
            let background = manifest.palette.background;
            let slot = |n: usize| shared.get(n).copied().unwrap_or(background);
            define("SPRITE_MC0", slot(1) as u16, true);
            define("SPRITE_MC1", slot(2) as u16, true);
        }
    }

    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assembler_names() {
        for asm in Assembler::all() {
            assert_eq!(asm.to_string().parse::<Assembler>().unwrap(), *asm);
        }
        assert!("masm".parse::<Assembler>().is_err());
    }
}
