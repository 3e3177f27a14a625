use c64gfx::loader;
use c64gfx::output::{OutputOptions, write_bitmap, write_sprites};
use c64gfx_core::emit::Assembler;
use c64gfx_core::palette::get_vic_color;
use c64gfx_core::{ConvertOptions, Mode, ModeConfig, PixelGrid, convert_bitmap, convert_sprites};
use image::{Rgba, RgbaImage};
use std::path::PathBuf;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("c64gfx_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn stripes(width: usize, height: usize, colors: &[u8]) -> PixelGrid {
    let mut data = Vec::with_capacity(width * height * 4);
    for _y in 0..height {
        for x in 0..width {
            let [r, g, b] = get_vic_color(colors[(x / 8) % colors.len()]);
            data.extend_from_slice(&[r, g, b, 255]);
        }
    }
    PixelGrid::from_rgba_bytes(width, height, &data).unwrap()
}

fn all_outputs() -> OutputOptions {
    OutputOptions {
        emit_asm: true,
        emit_basic: true,
        assembler: Assembler::Acme,
        preview: true,
    }
}

#[test]
fn test_bitmap_files_are_written() {
    let dir = scratch_dir("bitmap");
    let config = ModeConfig::for_mode(Mode::BitmapMulticolor);
    let pixels = stripes(160, 200, &[0, 1, 2, 5]);
    let conv = convert_bitmap(&pixels, &config, &ConvertOptions::default()).unwrap();
    let files = write_bitmap(&dir, &conv, &all_outputs()).unwrap();

    assert_eq!(std::fs::read(&files.bitmap).unwrap().len(), 8000);
    assert_eq!(std::fs::read(&files.screen).unwrap().len(), 1000);
    assert_eq!(std::fs::read(&files.color).unwrap().len(), 1000);

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&files.manifest).unwrap()).unwrap();
    assert_eq!(manifest["mode"], "bitmap_multicolor");
    assert_eq!(manifest["conflict_count"], 0);

    let report_json = std::fs::read_to_string(&files.report_json).unwrap();
    assert_eq!(report_json, conv.report.to_json().unwrap());
    let parsed: serde_json::Value = serde_json::from_str(&report_json).unwrap();
    assert_eq!(parsed["image_size"], serde_json::json!([160, 200]));

    let report = std::fs::read_to_string(&files.report_txt).unwrap();
    assert!(report.contains("mode: bitmap_multicolor"));
    assert!(report.contains("conflicts: 0"));

    let include = std::fs::read_to_string(files.asm_include.as_ref().unwrap()).unwrap();
    assert!(include.contains("!source"));
    assert!(include.contains("BITMAP_ADDR"));

    // PRG files start with the little-endian load address.
    assert_eq!(files.prg.len(), 3);
    let bitmap_prg = std::fs::read(dir.join("bitmap.prg")).unwrap();
    assert_eq!(&bitmap_prg[..2], &[0x00, 0x20]);
    assert_eq!(bitmap_prg.len(), 8002);
    assert!(files.basic_loader.as_ref().unwrap().exists());

    let preview = image::open(files.preview.as_ref().unwrap()).unwrap();
    assert_eq!((preview.width(), preview.height()), (320, 200));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_optional_bitmap_outputs_are_skipped() {
    let dir = scratch_dir("bitmap_minimal");
    let config = ModeConfig::for_mode(Mode::BitmapHires);
    let pixels = stripes(320, 200, &[0, 1]);
    let conv = convert_bitmap(&pixels, &config, &ConvertOptions::default()).unwrap();
    let files = write_bitmap(&dir, &conv, &OutputOptions::default()).unwrap();

    assert!(files.asm_include.is_none());
    assert!(files.basic_loader.is_none());
    assert!(files.preview.is_none());
    assert!(!dir.join("bitmap.inc").exists());
    assert!(!dir.join("loader.bas").exists());
    assert!(!dir.join("preview.png").exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_sprite_files_are_written() {
    let dir = scratch_dir("sprites");
    let config = ModeConfig::for_mode(Mode::SpriteHires);
    let pixels = stripes(72, 21, &[0, 7, 0]);
    let conv = convert_sprites(&pixels, &config, Some(2), &ConvertOptions::default()).unwrap();
    let files = write_sprites(&dir, &conv, &all_outputs()).unwrap();

    assert_eq!(files.sprites.len(), 2);
    assert_eq!(files.sprites[1], dir.join("sprite_001.bin"));
    for path in &files.sprites {
        assert_eq!(std::fs::read(path).unwrap().len(), 64);
    }

    let positions: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&files.positions).unwrap()).unwrap();
    assert_eq!(positions.as_array().unwrap().len(), 2);
    assert_eq!(positions[1]["region"]["x"], 24);

    let prg = std::fs::read(dir.join("sprites.prg")).unwrap();
    assert_eq!(prg.len(), 2 + 128);
    assert_eq!(&prg[..2], &[0x00, 0x30]);
    assert!(dir.join("sprite_manifest.json").exists());
    assert!(dir.join("sprites.inc").exists());
    assert!(dir.join("sprites.bas").exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_loader_resizes_to_mode_resolution() {
    let dir = scratch_dir("loader");
    let path = dir.join("small.png");
    RgbaImage::from_pixel(80, 50, Rgba([255, 255, 255, 255]))
        .save(&path)
        .unwrap();

    let grid = loader::load_bitmap_source(&path, Mode::BitmapMulticolor).unwrap();
    assert_eq!((grid.width(), grid.height()), (160, 200));
    assert!(grid.rgb_at(80, 100).iter().all(|&c| c >= 250));

    let sheet = loader::load_sheet(&path).unwrap();
    assert_eq!((sheet.width(), sheet.height()), (80, 50));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_loader_rejects_unsupported_files() {
    let dir = scratch_dir("loader_bad");
    let path = dir.join("notes.txt");
    std::fs::write(&path, "hello").unwrap();
    assert!(loader::open_image(&path).is_err());
    assert!(loader::open_image(&dir.join("missing.png")).is_err());
    let _ = std::fs::remove_dir_all(&dir);
}
