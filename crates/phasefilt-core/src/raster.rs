use ndarray::Array2;
use num_complex::Complex32;

use crate::error::{PhasefiltError, Result};

/// Complex interferogram samples, row-major, shape = (height, width).
pub type Interferogram = Array2<Complex32>;

/// Per-pixel coherence in [0, 1], same shape as the interferogram.
pub type CoherenceMap = Array2<f32>;

/// Per-pixel adaptive exponent written by the filter.
pub type AlphaMap = Array2<f32>;

/// Filtered complex samples written by the filter.
pub type FilteredOutput = Array2<Complex32>;

/// Dimensions of a raster grid.
///
/// Every bounds decision in the filter (tile extraction, coherence
/// averaging, and the output commit) goes through [`RasterGrid::contains`],
/// so the three agree with the tile partition by construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RasterGrid {
    pub height: usize,
    pub width: usize,
}

impl RasterGrid {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    /// Grid of an existing array.
    pub fn of<T>(data: &Array2<T>) -> Self {
        let (height, width) = data.dim();
        Self { height, width }
    }

    #[inline]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.height && col < self.width
    }

    /// Number of pixels, saturating at `usize::MAX` so an impossible grid
    /// fails at allocation rather than wrapping.
    pub fn pixel_count(&self) -> usize {
        self.height.saturating_mul(self.width)
    }

    pub fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0
    }

    pub fn dim(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Fail with [`PhasefiltError::DimensionMismatch`] unless `data` has this shape.
    pub fn ensure_matches<T>(&self, what: &'static str, data: &Array2<T>) -> Result<()> {
        let (height, width) = data.dim();
        if (height, width) != self.dim() {
            return Err(PhasefiltError::DimensionMismatch {
                what,
                expected_height: self.height,
                expected_width: self.width,
                height,
                width,
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for RasterGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Allocate a `height x width` grid filled with `fill`, reporting failure
/// instead of aborting.
pub fn try_alloc_grid<T: Clone>(grid: RasterGrid, fill: T, what: &'static str) -> Result<Array2<T>> {
    let data = try_alloc_vec(grid.pixel_count(), fill, what)?;
    Array2::from_shape_vec(grid.dim(), data)
        .map_err(|e| PhasefiltError::InvalidRaster(format!("{what}: {e}")))
}

/// Allocate a vector of `len` copies of `fill`, reporting failure instead of
/// aborting.
pub fn try_alloc_vec<T: Clone>(len: usize, fill: T, what: &'static str) -> Result<Vec<T>> {
    let bytes = len.saturating_mul(std::mem::size_of::<T>());
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| PhasefiltError::Allocation { what, bytes })?;
    data.resize(len, fill);
    Ok(data)
}
