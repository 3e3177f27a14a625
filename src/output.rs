//! Writing conversion results to an output directory.

use crate::preview::write_preview;
use anyhow::{Context, Result};
use c64gfx_core::decode::decode_bitmap;
use c64gfx_core::emit::{Assembler, emit_basic_loader, emit_include, include_file_name, to_prg};
use c64gfx_core::report::sprite_file_name;
use c64gfx_core::{AnalysisReport, BitmapConversion, Manifest, SpriteConversion};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub emit_asm: bool,
    pub emit_basic: bool,
    pub assembler: Assembler,
    pub preview: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BitmapFiles {
    pub bitmap: PathBuf,
    pub screen: PathBuf,
    pub color: PathBuf,
    pub manifest: PathBuf,
    pub report_json: PathBuf,
    pub report_txt: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asm_include: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic_loader: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prg: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpriteFiles {
    pub sprites: Vec<PathBuf>,
    pub positions: PathBuf,
    pub manifest: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asm_include: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic_loader: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prg: Vec<PathBuf>,
}

/// What the CLI prints after a conversion.
#[derive(Debug, Serialize)]
pub struct ConversionResult<'a, F: Serialize> {
    pub files: F,
    pub report: &'a AnalysisReport,
    pub manifest: &'a Manifest,
}

fn write_bytes(path: &Path, data: &[u8]) -> Result<PathBuf> {
    std::fs::write(path, data).with_context(|| format!("cannot write {}", path.display()))?;
    log::debug!("wrote {} ({} bytes)", path.display(), data.len());
    Ok(path.to_path_buf())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf> {
    let data = serde_json::to_string_pretty(value)?;
    write_bytes(path, data.as_bytes())
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))
}

pub fn write_bitmap(
    dir: &Path,
    conv: &BitmapConversion,
    options: &OutputOptions,
) -> Result<BitmapFiles> {
    ensure_dir(dir)?;
    let manifest = &conv.manifest;

    let bitmap = write_bytes(&dir.join("bitmap.bin"), &conv.asset.plane)?;
    let screen = write_bytes(&dir.join("screen.bin"), &conv.asset.screen)?;
    let color = write_bytes(&dir.join("color.bin"), &conv.asset.color)?;
    let report = conv.report.to_json()?;
    let report_json = write_bytes(&dir.join("report.json"), report.as_bytes())?;
    let report_txt = write_bytes(&dir.join("report.txt"), conv.report.to_text().as_bytes())?;
    let manifest_path = write_json(&dir.join("manifest.json"), manifest)?;

    let asm_include = if options.emit_asm {
        let text = emit_include(manifest, options.assembler);
        let path = dir.join(include_file_name(manifest));
        Some(write_bytes(&path, text.as_bytes())?)
    } else {
        None
    };

    let mut prg = Vec::new();
    let basic_loader = if options.emit_basic {
        let parts: [(&str, &[u8]); 3] = [
            ("bitmap", conv.asset.plane.as_slice()),
            ("screen", conv.asset.screen.as_slice()),
            ("color", conv.asset.color.as_slice()),
        ];
        for (name, data) in parts {
            if let Some(entry) = manifest.asset(name) {
                let path = dir.join(format!("{}.prg", name));
                prg.push(write_bytes(&path, &to_prg(entry.address, data))?);
            }
        }
        let text = emit_basic_loader(manifest);
        Some(write_bytes(&dir.join("loader.bas"), text.as_bytes())?)
    } else {
        None
    };

    let preview = if options.preview {
        let decoded = decode_bitmap(
            manifest.mode,
            &conv.asset.plane,
            &conv.asset.screen,
            &conv.asset.color,
            conv.shared.background,
        )?;
        let path = dir.join("preview.png");
        write_preview(&decoded, manifest.mode, &path)?;
        Some(path)
    } else {
        None
    };

    log::info!("bitmap assets written to {}", dir.display());
    Ok(BitmapFiles {
        bitmap,
        screen,
        color,
        manifest: manifest_path,
        report_json,
        report_txt,
        asm_include,
        basic_loader,
        prg,
        preview,
    })
}

pub fn write_sprites(
    dir: &Path,
    conv: &SpriteConversion,
    options: &OutputOptions,
) -> Result<SpriteFiles> {
    ensure_dir(dir)?;
    let manifest = &conv.manifest;

    let mut sprites = Vec::with_capacity(conv.asset.len());
    for (i, block) in conv.asset.blocks.iter().enumerate() {
        sprites.push(write_bytes(&dir.join(sprite_file_name(i)), block)?);
    }
    let positions = write_json(&dir.join("sprite_positions.json"), &manifest.sprites)?;
    let manifest_path = write_json(&dir.join("sprite_manifest.json"), manifest)?;

    let asm_include = if options.emit_asm {
        let text = emit_include(manifest, options.assembler);
        let path = dir.join(include_file_name(manifest));
        Some(write_bytes(&path, text.as_bytes())?)
    } else {
        None
    };

    let mut prg = Vec::new();
    let basic_loader = if options.emit_basic {
        let data = to_prg(manifest.addresses.sprites, &conv.asset.concat());
        prg.push(write_bytes(&dir.join("sprites.prg"), &data)?);
        let text = emit_basic_loader(manifest);
        Some(write_bytes(&dir.join("sprites.bas"), text.as_bytes())?)
    } else {
        None
    };

    log::info!("{} sprites written to {}", sprites.len(), dir.display());
    Ok(SpriteFiles {
        sprites,
        positions,
        manifest: manifest_path,
        asm_include,
        basic_loader,
        prg,
    })
}
