use std::ops::Range;

use ndarray::ArrayViewMut2;
use num_complex::Complex32;

use crate::raster::RasterGrid;

use super::spectral::TileWorkspace;
use super::tiling::Tile;

/// Exclusive window onto a horizontal band of both output grids.
///
/// A band covers the full raster width and exactly the output rows owned by
/// one worker's tile rows, so writes through it never race with another
/// worker.
pub struct OutputBand<'a> {
    row_offset: usize,
    filtered: ArrayViewMut2<'a, Complex32>,
    alpha: ArrayViewMut2<'a, f32>,
}

impl<'a> OutputBand<'a> {
    pub fn new(
        row_offset: usize,
        filtered: ArrayViewMut2<'a, Complex32>,
        alpha: ArrayViewMut2<'a, f32>,
    ) -> Self {
        debug_assert_eq!(filtered.dim(), alpha.dim());
        Self {
            row_offset,
            filtered,
            alpha,
        }
    }

    /// Global output rows covered by this band.
    pub fn rows(&self) -> Range<usize> {
        self.row_offset..self.row_offset + self.filtered.nrows()
    }

    /// Write the tile's owned rectangle: filtered samples from `workspace`
    /// and the tile's constant `alpha`. Owned positions past the raster edge
    /// are skipped.
    pub fn commit(&mut self, grid: RasterGrid, tile: &Tile, workspace: &TileWorkspace, alpha: f32) {
        for m in tile.row.valid() {
            let row = tile.row0() + m;
            for n in tile.col.valid() {
                let col = tile.col0() + n;
                if !grid.contains(row, col) {
                    continue;
                }
                debug_assert!(
                    self.rows().contains(&row),
                    "row {row} outside band {:?}",
                    self.rows()
                );
                let local = row - self.row_offset;
                self.filtered[[local, col]] = workspace.sample(m, n);
                self.alpha[[local, col]] = alpha;
            }
        }
    }
}
