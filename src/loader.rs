//! Image decoding and scaling ahead of conversion.

use anyhow::{Context, Result, anyhow, bail};
use c64gfx_core::cells::Region;
use c64gfx_core::{ConvertOptions, Mode, ModeConfig, PixelGrid, SpriteConversion, pipeline};
use image::imageops::{self, FilterType};
use image::{ImageFormat, ImageReader, RgbaImage};
use std::path::Path;

/// Decode a PNG, JPEG or BMP file into RGBA.
pub fn open_image(path: &Path) -> Result<RgbaImage> {
    let reader = ImageReader::open(path)
        .with_context(|| format!("cannot open {}", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("cannot read {}", path.display()))?;
    match reader.format() {
        Some(ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Bmp) => {}
        Some(other) => bail!("unsupported image format {:?}", other),
        None => bail!("unknown image format: {}", path.display()),
    }
    let image = reader
        .decode()
        .with_context(|| format!("cannot decode {}", path.display()))?;
    Ok(image.to_rgba8())
}

pub fn to_pixel_grid(image: &RgbaImage) -> Result<PixelGrid> {
    Ok(PixelGrid::from_rgba_bytes(
        image.width() as usize,
        image.height() as usize,
        image.as_raw(),
    )?)
}

/// Scale to `width`×`height` with a Lanczos3 filter; same-size images pass
/// through untouched.
pub fn fit(image: RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) {
        return image;
    }
    log::info!(
        "resizing {}x{} image to {}x{}",
        image.width(),
        image.height(),
        width,
        height
    );
    imageops::resize(&image, width, height, FilterType::Lanczos3)
}

/// Load an image at the full-screen resolution of a bitmap mode.
pub fn load_bitmap_source(path: &Path, mode: Mode) -> Result<PixelGrid> {
    let (width, height) = mode.resolution();
    let image = fit(open_image(path)?, width as u32, height as u32);
    to_pixel_grid(&image)
}

/// Load a sprite sheet as is.
pub fn load_sheet(path: &Path) -> Result<PixelGrid> {
    to_pixel_grid(&open_image(path)?)
}

/// Crop `regions` out of `image`, scale each to sprite size and lay them out
/// left to right. Returns the strip and the sprite regions within it.
pub fn sprite_strip(
    image: &RgbaImage,
    mode: Mode,
    regions: &[Region],
) -> Result<(PixelGrid, Vec<Region>)> {
    if regions.is_empty() {
        bail!("no sprite regions given");
    }
    let (sw, sh) = mode.resolution();
    let mut strip = RgbaImage::new((sw * regions.len()) as u32, sh as u32);
    let mut placed = Vec::with_capacity(regions.len());

    for (i, r) in regions.iter().enumerate() {
        if r.width == 0
            || r.height == 0
            || r.x + r.width > image.width() as usize
            || r.y + r.height > image.height() as usize
        {
            return Err(anyhow!(
                "sprite region {} ({},{} {}x{}) is outside the {}x{} image",
                i,
                r.x,
                r.y,
                r.width,
                r.height,
                image.width(),
                image.height()
            ));
        }
        let crop = imageops::crop_imm(
            image,
            r.x as u32,
            r.y as u32,
            r.width as u32,
            r.height as u32,
        )
        .to_image();
        let sprite = fit(crop, sw as u32, sh as u32);
        imageops::replace(&mut strip, &sprite, (i * sw) as i64, 0);
        placed.push(Region::new(i * sw, 0, sw, sh));
    }

    Ok((to_pixel_grid(&strip)?, placed))
}

/// Convert sprites cropped from `regions` of `image`.
///
/// The manifest and report describe the source image: sprite regions are the
/// requested ones and the image size is that of `image`, not of the strip.
pub fn convert_sheet_regions(
    image: &RgbaImage,
    config: &ModeConfig,
    regions: &[Region],
    options: &ConvertOptions,
) -> Result<SpriteConversion> {
    let (strip, placed) = sprite_strip(image, config.mode, regions)?;
    let mut conv = pipeline::convert_sprite_regions(&strip, config, &placed, options)?;
    for (entry, region) in conv.manifest.sprites.iter_mut().zip(regions) {
        entry.region = *region;
    }
    conv.report.image_size = [image.width() as usize, image.height() as usize];
    Ok(conv)
}

/// Parse the `--regions` argument: a JSON list of `{x, y, w, h}` objects.
pub fn parse_regions(json: &str) -> Result<Vec<Region>> {
    serde_json::from_str(json).context("regions must be a JSON list of {x, y, w, h} objects")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_fit_keeps_matching_size() {
        let image = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]));
        let out = fit(image.clone(), 4, 4);
        assert_eq!(out, image);
        assert_eq!(fit(image, 8, 2).dimensions(), (8, 2));
    }

    #[test]
    fn test_sprite_strip_places_regions() {
        let mut image = RgbaImage::from_pixel(48, 21, Rgba([0, 0, 0, 255]));
        image.put_pixel(24, 0, Rgba([255, 255, 255, 255]));
        let regions = [Region::new(24, 0, 24, 21), Region::new(0, 0, 24, 21)];
        let (grid, placed) = sprite_strip(&image, Mode::SpriteHires, &regions).unwrap();
        assert_eq!((grid.width(), grid.height()), (48, 21));
        assert_eq!(placed[1], Region::new(24, 0, 24, 21));
        assert_eq!(grid.rgb_at(0, 0), [255, 255, 255]);
        assert_eq!(grid.rgb_at(24, 0), [0, 0, 0]);
    }

    #[test]
    fn test_sprite_strip_rejects_outside_region() {
        let image = RgbaImage::new(24, 21);
        let regions = [Region::new(10, 0, 24, 21)];
        assert!(sprite_strip(&image, Mode::SpriteHires, &regions).is_err());
    }

    #[test]
    fn test_sheet_regions_report_source_geometry() {
        let mut image = RgbaImage::from_pixel(100, 60, Rgba([0, 0, 0, 255]));
        image.put_pixel(50, 30, Rgba([255, 255, 255, 255]));
        let regions = [Region::new(40, 20, 24, 21), Region::new(0, 0, 24, 21)];
        let config = ModeConfig::for_mode(Mode::SpriteHires);
        let options = ConvertOptions::default();
        let conv = convert_sheet_regions(&image, &config, &regions, &options).unwrap();

        assert_eq!(conv.report.image_size, [100, 60]);
        assert_eq!(conv.manifest.sprites.len(), 2);
        assert_eq!(conv.manifest.sprites[0].region, regions[0]);
        assert_eq!(conv.manifest.sprites[1].region, regions[1]);
    }

    #[test]
    fn test_parse_regions() {
        let regions = parse_regions(r#"[{"x": 1, "y": 2, "w": 24, "h": 21}]"#).unwrap();
        assert_eq!(regions, vec![Region::new(1, 2, 24, 21)]);
        assert!(parse_regions("[1, 2]").is_err());
    }
}
