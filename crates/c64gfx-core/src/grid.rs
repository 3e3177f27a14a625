use crate::error::{GfxError, Result};

/// Decoded source image: RGBA samples in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 4]>,
}

impl PixelGrid {
    pub fn new(width: usize, height: usize, pixels: Vec<[u8; 4]>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GfxError::Dimension(format!(
                "image must not be empty ({}x{})",
                width, height
            )));
        }
        if pixels.len() != width * height {
            return Err(GfxError::Dimension(format!(
                "{}x{} image needs {} pixels, got {}",
                width,
                height,
                width * height,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build a grid from a flat RGBA byte buffer (4 bytes per pixel).
    pub fn from_rgba_bytes(width: usize, height: usize, data: &[u8]) -> Result<Self> {
        if !data.len().is_multiple_of(4) {
            return Err(GfxError::Dimension(format!(
                "RGBA buffer length {} is not a multiple of 4",
                data.len()
            )));
        }
        let pixels = data
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect();
        Self::new(width, height, pixels)
    }

    /// Solid single-color grid. Mostly useful for tests and placeholders.
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Result<Self> {
        Self::new(
            width,
            height,
            vec![[rgb[0], rgb[1], rgb[2], 0xFF]; width * height],
        )
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    /// RGB value at (x, y); alpha is dropped.
    #[inline]
    pub fn rgb_at(&self, x: usize, y: usize) -> [u8; 3] {
        let p = self.pixels[y * self.width + x];
        [p[0], p[1], p[2]]
    }

    /// Copy out the `w`×`h` rectangle at (x, y).
    pub fn crop(&self, x: usize, y: usize, w: usize, h: usize) -> Result<PixelGrid> {
        if w == 0 || h == 0 || x + w > self.width || y + h > self.height {
            return Err(GfxError::Dimension(format!(
                "region ({},{} {}x{}) is outside the {}x{} image",
                x, y, w, h, self.width, self.height
            )));
        }
        let mut pixels = Vec::with_capacity(w * h);
        for row in y..y + h {
            let start = row * self.width + x;
            pixels.extend_from_slice(&self.pixels[start..start + w]);
        }
        PixelGrid::new(w, h, pixels)
    }
}

/// Same geometry as a [`PixelGrid`] with every sample replaced by a palette
/// index (0..15).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedGrid {
    width: usize,
    height: usize,
    indices: Vec<u8>,
}

impl QuantizedGrid {
    pub fn new(width: usize, height: usize, indices: Vec<u8>) -> Result<Self> {
        if indices.len() != width * height {
            return Err(GfxError::Dimension(format!(
                "{}x{} grid needs {} indices, got {}",
                width,
                height,
                width * height,
                indices.len()
            )));
        }
        Ok(Self {
            width,
            height,
            indices,
        })
    }

    /// Caller guarantees `indices.len() == width * height`.
    pub(crate) fn from_parts(width: usize, height: usize, indices: Vec<u8>) -> Self {
        debug_assert_eq!(indices.len(), width * height);
        Self {
            width,
            height,
            indices,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.indices[y * self.width + x]
    }

    /// Pixel count per palette index.
    pub fn histogram(&self) -> [u32; 16] {
        let mut counts = [0u32; 16];
        for &i in &self.indices {
            counts[(i & 0x0F) as usize] += 1;
        }
        counts
    }

    /// Distinct palette indices present, ascending.
    pub fn palette_used(&self) -> Vec<u8> {
        used_indices(&self.histogram())
    }
}

/// Indices with a non-zero count, ascending.
pub fn used_indices(histogram: &[u32; 16]) -> Vec<u8> {
    histogram
        .iter()
        .enumerate()
        .filter(|(_, c)| **c > 0)
        .map(|(i, _)| i as u8)
        .collect()
}

/// Indices ordered by count descending, then index ascending. Zero counts
/// are left out.
pub fn rank_by_frequency(histogram: &[u32; 16]) -> Vec<u8> {
    let mut ranked: Vec<u8> = used_indices(histogram);
    ranked.sort_by(|a, b| {
        histogram[*b as usize]
            .cmp(&histogram[*a as usize])
            .then(a.cmp(b))
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_grid_rejects_wrong_length() {
        assert!(PixelGrid::new(2, 2, vec![[0, 0, 0, 255]; 3]).is_err());
        assert!(PixelGrid::new(0, 2, vec![]).is_err());
        assert!(PixelGrid::new(2, 2, vec![[0, 0, 0, 255]; 4]).is_ok());
    }

    #[test]
    fn test_from_rgba_bytes() {
        let grid = PixelGrid::from_rgba_bytes(2, 1, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        assert_eq!(grid.rgb_at(1, 0), [5, 6, 7]);
        assert!(PixelGrid::from_rgba_bytes(2, 1, &[1, 2, 3]).is_err());
    }

    #[test]
    fn test_crop() {
        let pixels = (0..16u8).map(|i| [i, 0, 0, 255]).collect();
        let grid = PixelGrid::new(4, 4, pixels).unwrap();
        let sub = grid.crop(1, 2, 2, 2).unwrap();
        assert_eq!(sub.rgb_at(0, 0), [9, 0, 0]);
        assert_eq!(sub.rgb_at(1, 1), [14, 0, 0]);
        assert!(grid.crop(3, 3, 2, 2).is_err());
    }

    #[test]
    fn test_rank_by_frequency_ties() {
        let mut hist = [0u32; 16];
        hist[7] = 5;
        hist[3] = 5;
        hist[9] = 8;
        assert_eq!(rank_by_frequency(&hist), vec![9, 3, 7]);
    }
}
