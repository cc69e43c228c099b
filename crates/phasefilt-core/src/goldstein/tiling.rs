use std::ops::Range;

use crate::raster::RasterGrid;

use super::config::GoldsteinConfig;

/// One tile position along a single axis, with the part of the tile it owns
/// in the output.
///
/// `valid_start..valid_end` is relative to `origin`. Positions that map past
/// the raster edge are not owned by anyone and are never written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisSpan {
    pub origin: usize,
    pub valid_start: usize,
    pub valid_end: usize,
}

impl AxisSpan {
    /// Local offsets inside the tile that this span owns.
    pub fn valid(&self) -> Range<usize> {
        self.valid_start..self.valid_end
    }

    /// Owned global positions, clipped to `[0, len)`.
    pub fn global_range(&self, len: usize) -> Range<usize> {
        let start = (self.origin + self.valid_start).min(len);
        let end = (self.origin + self.valid_end).min(len);
        start..end.max(start)
    }
}

/// Enumerate tile spans along an axis of length `len`.
///
/// Origins advance from 0 by `size - overlap` while inside the axis. The
/// first tile owns everything up to its trailing seam, the last owns
/// everything from its leading seam to the axis end, and interior tiles own
/// the band between the two seams. Leading seams sit at `floor(overlap / 2)`
/// and trailing seams at `size - ceil(overlap / 2)`, so consecutive tiles
/// meet exactly for even and odd overlaps alike.
pub fn axis_spans(len: usize, size: usize, overlap: usize) -> Vec<AxisSpan> {
    let step = size - overlap;
    let lead = overlap / 2;
    let trail = size - (overlap - lead);

    (0..len)
        .step_by(step)
        .map(|origin| {
            let (valid_start, valid_end) = if origin == 0 {
                (0, trail)
            } else if origin + step > len {
                (lead, (len - origin).max(lead))
            } else {
                (lead, trail)
            };
            AxisSpan {
                origin,
                valid_start,
                valid_end,
            }
        })
        .collect()
}

/// A square tile: its origin on both axes and the output rectangle it owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    pub row: AxisSpan,
    pub col: AxisSpan,
    pub size: usize,
}

impl Tile {
    pub fn row0(&self) -> usize {
        self.row.origin
    }

    pub fn col0(&self) -> usize {
        self.col.origin
    }
}

/// All tiles covering a raster, organised as tile rows.
#[derive(Clone, Debug)]
pub struct TilePlan {
    pub grid: RasterGrid,
    pub tile_size: usize,
    pub overlap: usize,
    rows: Vec<AxisSpan>,
    cols: Vec<AxisSpan>,
}

impl TilePlan {
    /// The caller validates `config` first.
    pub fn new(grid: RasterGrid, config: &GoldsteinConfig) -> Self {
        Self {
            grid,
            tile_size: config.tile_size,
            overlap: config.overlap,
            rows: axis_spans(grid.height, config.tile_size, config.overlap),
            cols: axis_spans(grid.width, config.tile_size, config.overlap),
        }
    }

    pub fn row_spans(&self) -> &[AxisSpan] {
        &self.rows
    }

    pub fn col_spans(&self) -> &[AxisSpan] {
        &self.cols
    }

    pub fn tile_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn tile_count(&self) -> usize {
        self.rows.len() * self.cols.len()
    }

    /// Tiles of one tile row, left to right.
    pub fn tiles_in_row(&self, row_index: usize) -> impl Iterator<Item = Tile> + '_ {
        let row = self.rows[row_index];
        self.cols.iter().map(move |&col| Tile {
            row,
            col,
            size: self.tile_size,
        })
    }

    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        (0..self.rows.len()).flat_map(move |r| self.tiles_in_row(r))
    }

    /// Output rows owned by tile rows `rows`, clipped to the raster.
    pub fn owned_rows(&self, rows: Range<usize>) -> Range<usize> {
        if rows.is_empty() {
            return 0..0;
        }
        let first = self.rows[rows.start].global_range(self.grid.height);
        let last = self.rows[rows.end - 1].global_range(self.grid.height);
        first.start..last.end.max(first.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_geometry_on_40px_axis() {
        let spans = axis_spans(40, 32, 24);
        let origins: Vec<usize> = spans.iter().map(|s| s.origin).collect();
        assert_eq!(origins, vec![0, 8, 16, 24, 32]);
        assert_eq!(spans[0].valid(), 0..20);
        assert_eq!(spans[1].valid(), 12..20);
        // origin 32 is not a "last" tile (32 + 8 == 40) and everything it
        // would own lies past the edge
        assert_eq!(spans[4].valid(), 12..20);
        assert!(spans[4].global_range(40).is_empty());
        assert_eq!(spans[3].global_range(40), 36..40);
    }

    #[test]
    fn single_short_axis_is_owned_by_first_tile() {
        let spans = axis_spans(5, 32, 24);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].global_range(5), 0..5);
    }

    #[test]
    fn odd_overlap_seams_meet() {
        let spans = axis_spans(30, 8, 3);
        for pair in spans.windows(2) {
            let a = pair[0].global_range(30);
            let b = pair[1].global_range(30);
            assert_eq!(a.end, b.start, "seam between {:?} and {:?}", pair[0], pair[1]);
        }
    }
}
