use crate::error::{GfxError, Result};
use crate::grid::{QuantizedGrid, rank_by_frequency};
use serde::{Deserialize, Serialize};

/// Rectangle in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: usize,
    pub y: usize,
    #[serde(alias = "w")]
    pub width: usize,
    #[serde(alias = "h")]
    pub height: usize,
}

impl Region {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// One palette index present in a cell, with the positions it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellColor {
    pub index: u8,
    pub count: u32,
    /// (x, y) relative to the cell origin, row-major.
    pub positions: Vec<(usize, usize)>,
}

/// A fixed-size tile of the quantized grid that shares one color budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Position in raster order.
    pub index: usize,
    /// Cell column/row in the cell grid.
    pub cell_x: usize,
    pub cell_y: usize,
    pub region: Region,
    /// Palette indices, row-major within the cell.
    pub pixels: Vec<u8>,
}

impl Cell {
    /// Copy `region` out of `grid`. The region must lie inside the grid.
    pub fn from_region(
        grid: &QuantizedGrid,
        index: usize,
        cell_x: usize,
        cell_y: usize,
        region: Region,
    ) -> Result<Self> {
        if region.width == 0
            || region.height == 0
            || region.x + region.width > grid.width()
            || region.y + region.height > grid.height()
        {
            return Err(GfxError::Dimension(format!(
                "region ({},{} {}x{}) is outside the {}x{} image",
                region.x,
                region.y,
                region.width,
                region.height,
                grid.width(),
                grid.height()
            )));
        }
        let mut pixels = Vec::with_capacity(region.width * region.height);
        for y in region.y..region.y + region.height {
            let start = y * grid.width() + region.x;
            pixels.extend_from_slice(&grid.indices()[start..start + region.width]);
        }
        Ok(Self {
            index,
            cell_x,
            cell_y,
            region,
            pixels,
        })
    }

    pub fn histogram(&self) -> [u32; 16] {
        let mut counts = [0u32; 16];
        for &p in &self.pixels {
            counts[(p & 0x0F) as usize] += 1;
        }
        counts
    }

    /// Distinct colors ranked by pixel count (desc), then palette index (asc).
    pub fn ranked_colors(&self) -> Vec<u8> {
        rank_by_frequency(&self.histogram())
    }

    /// Every color in the cell with its pixel positions, in ranked order.
    pub fn colors(&self) -> Vec<CellColor> {
        let hist = self.histogram();
        self.ranked_colors()
            .into_iter()
            .map(|index| CellColor {
                index,
                count: hist[index as usize],
                positions: self
                    .pixels
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| **p == index)
                    .map(|(i, _)| (i % self.region.width, i / self.region.width))
                    .collect(),
            })
            .collect()
    }
}

/// Split `grid` into `cell_w`×`cell_h` cells in raster order.
///
/// The grid dimensions must be exact multiples of the cell size.
pub fn partition(grid: &QuantizedGrid, cell_w: usize, cell_h: usize) -> Result<Vec<Cell>> {
    if cell_w == 0 || cell_h == 0 {
        return Err(GfxError::Dimension(format!(
            "cell size {}x{} is empty",
            cell_w, cell_h
        )));
    }
    if !grid.width().is_multiple_of(cell_w) || !grid.height().is_multiple_of(cell_h) {
        return Err(GfxError::Dimension(format!(
            "{}x{} image does not divide into {}x{} cells",
            grid.width(),
            grid.height(),
            cell_w,
            cell_h
        )));
    }

    let cols = grid.width() / cell_w;
    let rows = grid.height() / cell_h;
    let mut cells = Vec::with_capacity(cols * rows);
    for cell_y in 0..rows {
        for cell_x in 0..cols {
            let region = Region::new(cell_x * cell_w, cell_y * cell_h, cell_w, cell_h);
            cells.push(Cell::from_region(
                grid,
                cell_y * cols + cell_x,
                cell_x,
                cell_y,
                region,
            )?);
        }
    }
    log::debug!(
        "partitioned {}x{} grid into {} cells of {}x{}",
        grid.width(),
        grid.height(),
        cells.len(),
        cell_w,
        cell_h
    );
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(width: usize, height: usize) -> QuantizedGrid {
        let indices = (0..width * height).map(|i| (i % 16) as u8).collect();
        QuantizedGrid::new(width, height, indices).unwrap()
    }

    #[test]
    fn test_partition_covers_every_pixel_once() {
        let g = grid(16, 16);
        let cells = partition(&g, 8, 8).unwrap();
        assert_eq!(cells.len(), 4);

        let mut seen = vec![0u8; 16 * 16];
        for cell in &cells {
            for dy in 0..cell.region.height {
                for dx in 0..cell.region.width {
                    let (x, y) = (cell.region.x + dx, cell.region.y + dy);
                    seen[y * 16 + x] += 1;
                    assert_eq!(cell.pixels[dy * cell.region.width + dx], g.get(x, y));
                }
            }
        }
        assert!(seen.iter().all(|&n| n == 1));
    }

    #[test]
    fn test_partition_raster_order() {
        let cells = partition(&grid(16, 16), 8, 8).unwrap();
        let coords: Vec<(usize, usize)> = cells.iter().map(|c| (c.cell_x, c.cell_y)).collect();
        assert_eq!(coords, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
        assert_eq!(cells[3].index, 3);
    }

    #[test]
    fn test_partition_rejects_partial_cells() {
        let err = partition(&grid(16, 12), 8, 8).unwrap_err();
        assert!(matches!(err, GfxError::Dimension(_)));
    }

    #[test]
    fn test_cell_colors_ranked_with_positions() {
        let g = QuantizedGrid::new(2, 2, vec![5, 3, 3, 5]).unwrap();
        let cells = partition(&g, 2, 2).unwrap();
        let colors = cells[0].colors();
        assert_eq!(colors[0].index, 3);
        assert_eq!(colors[0].positions, vec![(1, 0), (0, 1)]);
        assert_eq!(colors[1].index, 5);
        assert_eq!(colors[1].count, 2);
    }
}
