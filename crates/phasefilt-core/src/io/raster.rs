use ndarray::{s, Array2, ArrayView2};

use crate::error::{PhasefiltError, Result};
use crate::raster::{try_alloc_grid, RasterGrid};

/// Shape shared by readable and writable rasters.
pub trait Raster {
    fn grid(&self) -> RasterGrid;

    fn band_count(&self) -> usize {
        1
    }
}

/// Window reads from a multi-band raster.
pub trait RasterRead<T>: Raster {
    /// Read `w x h` samples of `band` starting at column `x`, row `y`.
    fn read(&self, band: usize, x: usize, y: usize, w: usize, h: usize) -> Result<Array2<T>>;

    /// Read a whole band.
    fn read_band(&self, band: usize) -> Result<Array2<T>> {
        let grid = self.grid();
        self.read(band, 0, 0, grid.width, grid.height)
    }
}

/// Window writes into a multi-band raster.
pub trait RasterWrite<T>: Raster {
    /// Write `samples` (shape `h x w`) into `band` at column `x`, row `y`.
    fn write(
        &mut self,
        band: usize,
        x: usize,
        y: usize,
        w: usize,
        h: usize,
        samples: ArrayView2<'_, T>,
    ) -> Result<()>;

    /// Write a whole band.
    fn write_band(&mut self, band: usize, samples: ArrayView2<'_, T>) -> Result<()> {
        let grid = self.grid();
        self.write(band, 0, 0, grid.width, grid.height, samples)
    }
}

/// Fail unless `band` exists and the `w x h` window at (`x`, `y`) lies inside `grid`.
pub fn check_window(
    grid: RasterGrid,
    bands: usize,
    band: usize,
    x: usize,
    y: usize,
    w: usize,
    h: usize,
) -> Result<()> {
    if band >= bands {
        return Err(PhasefiltError::InvalidRaster(format!(
            "band {band} out of range (bands: {bands})"
        )));
    }
    let x_end = x.checked_add(w);
    let y_end = y.checked_add(h);
    match (x_end, y_end) {
        (Some(xe), Some(ye)) if xe <= grid.width && ye <= grid.height => Ok(()),
        _ => Err(PhasefiltError::InvalidRaster(format!(
            "window {w}x{h} at ({x}, {y}) exceeds raster {grid}"
        ))),
    }
}

/// In-memory raster, one array per band.
#[derive(Clone, Debug)]
pub struct MemRaster<T> {
    grid: RasterGrid,
    bands: Vec<Array2<T>>,
}

impl<T: Clone> MemRaster<T> {
    /// `band_count` bands of `grid`, every sample set to `fill`.
    pub fn new(grid: RasterGrid, band_count: usize, fill: T) -> Result<Self> {
        let bands = (0..band_count)
            .map(|_| try_alloc_grid(grid, fill.clone(), "raster band"))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { grid, bands })
    }

    /// Single-band raster wrapping `data`.
    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            grid: RasterGrid::of(&data),
            bands: vec![data],
        }
    }

    pub fn band(&self, band: usize) -> Option<&Array2<T>> {
        self.bands.get(band)
    }

    pub fn into_bands(self) -> Vec<Array2<T>> {
        self.bands
    }
}

impl<T> Raster for MemRaster<T> {
    fn grid(&self) -> RasterGrid {
        self.grid
    }

    fn band_count(&self) -> usize {
        self.bands.len()
    }
}

impl<T: Clone> RasterRead<T> for MemRaster<T> {
    fn read(&self, band: usize, x: usize, y: usize, w: usize, h: usize) -> Result<Array2<T>> {
        check_window(self.grid, self.bands.len(), band, x, y, w, h)?;
        Ok(self.bands[band].slice(s![y..y + h, x..x + w]).to_owned())
    }
}

impl<T: Clone> RasterWrite<T> for MemRaster<T> {
    fn write(
        &mut self,
        band: usize,
        x: usize,
        y: usize,
        w: usize,
        h: usize,
        samples: ArrayView2<'_, T>,
    ) -> Result<()> {
        check_window(self.grid, self.bands.len(), band, x, y, w, h)?;
        if samples.dim() != (h, w) {
            return Err(PhasefiltError::DimensionMismatch {
                what: "raster write window",
                expected_height: h,
                expected_width: w,
                height: samples.nrows(),
                width: samples.ncols(),
            });
        }
        self.bands[band]
            .slice_mut(s![y..y + h, x..x + w])
            .assign(&samples);
        Ok(())
    }
}
