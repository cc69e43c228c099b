use crate::raster::{CoherenceMap, RasterGrid};

use super::tiling::Tile;

/// Mean coherence over the in-bounds part of the tile's full extent.
///
/// Positions past the raster edge are left out of both the sum and the
/// count. Returns 0 when the tile has no in-bounds position.
pub fn mean_coherence(coherence: &CoherenceMap, grid: RasterGrid, tile: &Tile) -> f32 {
    let mut sum = 0.0f64;
    let mut count = 0usize;

    for m in 0..tile.size {
        let row = tile.row0() + m;
        for n in 0..tile.size {
            let col = tile.col0() + n;
            if grid.contains(row, col) {
                sum += coherence[[row, col]] as f64;
                count += 1;
            }
        }
    }

    if count == 0 {
        0.0
    } else {
        (sum / count as f64) as f32
    }
}

/// Adaptive exponent for a tile: `1 - clamp(mean, 0, 1)`.
pub fn tile_alpha(coherence: &CoherenceMap, grid: RasterGrid, tile: &Tile) -> f32 {
    alpha_from_mean(mean_coherence(coherence, grid, tile))
}

pub fn alpha_from_mean(mean: f32) -> f32 {
    if mean.is_nan() {
        return 1.0;
    }
    1.0 - mean.clamp(0.0, 1.0)
}
