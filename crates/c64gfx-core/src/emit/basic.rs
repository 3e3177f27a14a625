use crate::report::Manifest;

/// VIC-II register base (`$D000`).
const VIC_BASE: u32 = 53248;
/// Offset of the sprite pointers from the screen base.
const SPRITE_POINTER_OFFSET: u32 = 0x03F8;
const MAX_VISIBLE_SPRITES: usize = 8;

/// Prefix `data` with its little-endian load address.
pub fn to_prg(address: u16, data: &[u8]) -> Vec<u8> {
    let mut prg = Vec::with_capacity(data.len() + 2);
    prg.extend_from_slice(&address.to_le_bytes());
    prg.extend_from_slice(data);
    prg
}

/// Program files the loader expects on disk, in load order (lower case,
/// without the `.prg` extension).
pub fn load_names(manifest: &Manifest) -> Vec<String> {
    if manifest.mode.is_bitmap() {
        manifest.assets.iter().map(|a| a.name.clone()).collect()
    } else {
        vec!["sprites".to_string()]
    }
}

struct Listing {
    lines: Vec<String>,
    number: u32,
}

impl Listing {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            number: 10,
        }
    }

    fn push(&mut self, statement: String) -> u32 {
        let number = self.number;
        self.lines.push(format!("{} {}", number, statement));
        self.number += 10;
        number
    }

    fn finish(mut self) -> String {
        let number = self.number;
        self.push(format!("GOTO {}", number));
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

/// A BASIC listing that loads every asset and shows it.
///
/// Each `LOAD"..",8,1` restarts the program with variables intact, so the
/// `A` counter steps through the files.
pub fn emit_basic_loader(manifest: &Manifest) -> String {
    let mut listing = Listing::new();
    let tag = manifest.mode.tag().to_ascii_uppercase();
    listing.push(format!("REM C64GFX {} LOADER", tag));
    for (i, name) in load_names(manifest).iter().enumerate() {
        listing.push(format!(
            "IF A={} THEN A={}:LOAD\"{}\",8,1",
            i,
            i + 1,
            name.to_ascii_uppercase()
        ));
    }

    let palette = &manifest.palette;
    if let Some(border) = palette.border {
        listing.push(format!("POKE {},{}", VIC_BASE + 32, border));
    }
    listing.push(format!("POKE {},{}", VIC_BASE + 33, palette.background));

    if let Some(regs) = &manifest.vic_registers {
        let bank = manifest.addresses.vic_bank();
        if bank != 0 {
            listing.push(format!("POKE 56576,(PEEK(56576)AND252)OR{}", 3 - bank));
        }
        listing.push(format!(
            "POKE {},{}:POKE {},{}:POKE {},{}",
            VIC_BASE + 17,
            regs.d011,
            VIC_BASE + 22,
            regs.d016,
            VIC_BASE + 24,
            regs.d018
        ));
    }

    if manifest.mode.is_sprite() {
        let visible = &manifest.sprites[..manifest.sprites.len().min(MAX_VISIBLE_SPRITES)];
        let pointer_base = manifest.addresses.screen as u32 + SPRITE_POINTER_OFFSET;
        let mut enable = 0u32;
        for (n, sprite) in visible.iter().enumerate() {
            let n32 = n as u32;
            enable |= 1 << n;
            listing.push(format!(
                "POKE {},{}:POKE {},{}",
                pointer_base + n32,
                sprite.pointer,
                VIC_BASE + 39 + n32,
                sprite.individual_color
            ));
            listing.push(format!(
                "POKE {},{}:POKE {},{}",
                VIC_BASE + 2 * n32,
                24 + 32 * n32,
                VIC_BASE + 2 * n32 + 1,
                100
            ));
        }
        if manifest.mode.is_multicolor() {
            let background = palette.background;
            let slot = |n: usize| palette.shared.get(n).copied().unwrap_or(background);
            listing.push(format!(
                "POKE {},{}:POKE {},{}:POKE {},{}",
                VIC_BASE + 28,
                enable,
                VIC_BASE + 37,
                slot(1),
                VIC_BASE + 38,
                slot(2)
            ));
        }
        listing.push(format!("POKE {},{}", VIC_BASE + 21, enable));
    }

    listing.finish()
}
