use std::sync::Arc;

use ndarray::Array2;
use num_complex::Complex32;
use num_traits::Zero;
use rustfft::{Fft, FftPlanner};

use crate::consts::{SMOOTHING_KERNEL_SIZE, SMOOTHING_KERNEL_WEIGHT};
use crate::error::{PhasefiltError, Result};
use crate::raster::{try_alloc_vec, Interferogram, RasterGrid};

use super::tiling::Tile;

/// Transform plans and scratch buffers for one worker.
///
/// Built once per worker before any tile is processed and reused for every
/// tile that worker handles. All buffers are `size * size`, row-major.
pub struct TileWorkspace {
    size: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    spatial: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    transposed: Vec<Complex32>,
    fft_scratch: Vec<Complex32>,
    magnitude: Vec<f32>,
    smoothed: Vec<f32>,
}

impl TileWorkspace {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(PhasefiltError::InvalidTileConfig {
                tile_size: size,
                overlap: 0,
                reason: "tile size must be positive",
            });
        }
        let n = size.checked_mul(size).ok_or(PhasefiltError::Allocation {
            what: "tile buffers",
            bytes: usize::MAX,
        })?;

        // Buffers before plans: an oversized tile fails here instead of
        // inside the planner.
        let spatial = try_alloc_vec(n, Complex32::zero(), "tile spatial buffer")?;
        let spectrum = try_alloc_vec(n, Complex32::zero(), "tile spectrum buffer")?;
        let transposed = try_alloc_vec(n, Complex32::zero(), "tile transpose buffer")?;
        let magnitude = try_alloc_vec(n, 0.0, "tile magnitude buffer")?;
        let smoothed = try_alloc_vec(n, 0.0, "tile smoothed magnitude buffer")?;

        let mut planner = FftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        Ok(Self {
            size,
            forward,
            inverse,
            spatial,
            spectrum,
            transposed,
            fft_scratch: try_alloc_vec(scratch_len, Complex32::zero(), "FFT scratch")?,
            magnitude,
            smoothed,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Copy the tile's samples into the spatial buffer, zero-filling every
    /// position past the raster edge.
    pub fn load_tile(&mut self, interferogram: &Interferogram, grid: RasterGrid, tile: &Tile) {
        let size = self.size;
        for m in 0..size {
            let row = tile.row0() + m;
            for n in 0..size {
                let col = tile.col0() + n;
                self.spatial[m * size + n] = if grid.contains(row, col) {
                    interferogram[[row, col]]
                } else {
                    Complex32::zero()
                };
            }
        }
    }

    /// Load an already extracted `size x size` block.
    pub fn load_block(&mut self, block: &Array2<Complex32>) -> Result<()> {
        let grid = RasterGrid::new(self.size, self.size);
        grid.ensure_matches("tile block", block)?;
        for ((m, n), &v) in block.indexed_iter() {
            self.spatial[m * self.size + n] = v;
        }
        Ok(())
    }

    /// Run the spectral pipeline on the loaded tile with exponent `alpha`.
    ///
    /// Forward FFT, magnitude, 5x5 zero-padded smoothing, per-bin gain
    /// `smoothed^alpha`, inverse FFT, and division by `size^2`. The result
    /// replaces the spatial buffer.
    pub fn filter(&mut self, alpha: f32) {
        let size = self.size;

        self.spectrum.copy_from_slice(&self.spatial);
        fft2d_in_place(
            self.forward.as_ref(),
            &mut self.spectrum,
            &mut self.transposed,
            &mut self.fft_scratch,
            size,
        );

        for (mag, c) in self.magnitude.iter_mut().zip(&self.spectrum) {
            *mag = c.norm_sqr().sqrt();
        }

        smooth_magnitude(&self.magnitude, &mut self.smoothed, size);

        for (c, &s) in self.spectrum.iter_mut().zip(&self.smoothed) {
            let gain = spectral_gain(s, alpha);
            c.re *= gain;
            c.im *= gain;
        }

        self.spatial.copy_from_slice(&self.spectrum);
        fft2d_in_place(
            self.inverse.as_ref(),
            &mut self.spatial,
            &mut self.transposed,
            &mut self.fft_scratch,
            size,
        );

        let norm = (size * size) as f32;
        for c in self.spatial.iter_mut() {
            c.re /= norm;
            c.im /= norm;
        }
    }

    /// Filtered sample at local position (m, n) after [`Self::filter`].
    #[inline]
    pub fn sample(&self, m: usize, n: usize) -> Complex32 {
        self.spatial[m * self.size + n]
    }

    /// Smoothed spectral magnitude of the last filtered tile.
    pub fn smoothed_magnitude(&self) -> Array2<f32> {
        Array2::from_shape_fn((self.size, self.size), |(m, n)| {
            self.smoothed[m * self.size + n]
        })
    }

    /// Spatial buffer as an array (the filtered block after [`Self::filter`]).
    pub fn spatial_block(&self) -> Array2<Complex32> {
        Array2::from_shape_fn((self.size, self.size), |(m, n)| self.sample(m, n))
    }
}

/// Filter a single square block with a fixed exponent.
pub fn filter_block(block: &Array2<Complex32>, alpha: f32) -> Result<Array2<Complex32>> {
    let (h, w) = block.dim();
    if h != w {
        return Err(PhasefiltError::DimensionMismatch {
            what: "tile block",
            expected_height: h,
            expected_width: h,
            height: h,
            width: w,
        });
    }
    let mut workspace = TileWorkspace::new(h)?;
    workspace.load_block(block)?;
    workspace.filter(alpha);
    Ok(workspace.spatial_block())
}

/// Gain applied to a spectral bin: `smoothed^alpha`.
///
/// `alpha == 0` yields exactly 1 for every bin, including `smoothed == 0`
/// where `0^0` is taken as the identity.
#[inline]
pub fn spectral_gain(smoothed: f32, alpha: f32) -> f32 {
    if alpha == 0.0 {
        return 1.0;
    }
    smoothed.powf(alpha)
}

/// Convolve a `size x size` grid with the uniform smoothing kernel,
/// treating everything outside the grid as zero.
pub fn smooth_magnitude(input: &[f32], output: &mut [f32], size: usize) {
    debug_assert_eq!(input.len(), size * size);
    debug_assert_eq!(output.len(), size * size);
    let radius = SMOOTHING_KERNEL_SIZE / 2;

    for row in 0..size {
        let r0 = row.saturating_sub(radius);
        let r1 = (row + radius + 1).min(size);
        for col in 0..size {
            let c0 = col.saturating_sub(radius);
            let c1 = (col + radius + 1).min(size);
            let mut sum = 0.0f32;
            for r in r0..r1 {
                for c in c0..c1 {
                    sum += SMOOTHING_KERNEL_WEIGHT * input[r * size + c];
                }
            }
            output[row * size + col] = sum;
        }
    }
}

/// 2D FFT of a square row-major buffer: row transforms, transpose, row
/// transforms again, transpose back. Unnormalized in both directions.
fn fft2d_in_place(
    fft: &dyn Fft<f32>,
    data: &mut [Complex32],
    transposed: &mut [Complex32],
    scratch: &mut [Complex32],
    size: usize,
) {
    fft.process_with_scratch(data, scratch);
    transpose(data, transposed, size);
    fft.process_with_scratch(transposed, scratch);
    transpose(transposed, data, size);
}

fn transpose(src: &[Complex32], dst: &mut [Complex32], size: usize) {
    for row in 0..size {
        for col in 0..size {
            dst[col * size + row] = src[row * size + col];
        }
    }
}
