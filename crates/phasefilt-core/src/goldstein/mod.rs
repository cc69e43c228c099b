//! Coherence-adaptive Goldstein-Baran interferogram filter.
//!
//! The raster is covered by overlapping square tiles. Each tile is filtered
//! in the frequency domain with a gain `smoothed_magnitude^alpha`, where
//! `alpha = 1 - mean coherence` of the tile, and contributes only its owned
//! sub-rectangle to the output. Owned rectangles partition the raster, so
//! tiles run in parallel without synchronisation.

pub mod coherence;
pub mod config;
mod executor;
pub mod spectral;
pub mod tiling;
mod writer;

use std::time::{Duration, Instant};

use num_complex::Complex32;
use num_traits::Zero;
use tracing::{info, warn};

use crate::error::{PhasefiltError, Result};
use crate::pipeline::{FilterStage, NoOpReporter, ProgressReporter};
use crate::raster::{
    try_alloc_grid, AlphaMap, CoherenceMap, FilteredOutput, Interferogram, RasterGrid,
};

pub use config::GoldsteinConfig;
pub use tiling::{AxisSpan, Tile, TilePlan};

/// Summary of a successful filter run.
#[derive(Clone, Debug)]
pub struct FilterReport {
    pub height: usize,
    pub width: usize,
    pub tiles: usize,
    pub workers: usize,
    pub elapsed: Duration,
}

impl std::fmt::Display for FilterReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "goldstein filter finished: {}x{}, {} tiles on {} workers in {:.3}s",
            self.width,
            self.height,
            self.tiles,
            self.workers,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Filtered samples, per-pixel exponent, and run summary.
#[derive(Clone, Debug)]
pub struct GoldsteinOutput {
    pub filtered: FilteredOutput,
    pub alpha: AlphaMap,
    pub report: FilterReport,
}

/// Filter an interferogram, allocating both outputs.
pub fn goldstein_filter(
    interferogram: &Interferogram,
    coherence: &CoherenceMap,
    config: &GoldsteinConfig,
) -> Result<GoldsteinOutput> {
    goldstein_filter_reported(interferogram, coherence, config, &NoOpReporter)
}

/// Like [`goldstein_filter`], with progress reporting.
pub fn goldstein_filter_reported(
    interferogram: &Interferogram,
    coherence: &CoherenceMap,
    config: &GoldsteinConfig,
    reporter: &dyn ProgressReporter,
) -> Result<GoldsteinOutput> {
    let grid = validate_inputs(interferogram, coherence, config)?;
    let mut filtered = try_alloc_grid(grid, Complex32::zero(), "filtered output")?;
    let mut alpha = try_alloc_grid(grid, 0.0f32, "alpha map")?;
    let report = run(interferogram, coherence, config, grid, &mut filtered, &mut alpha, reporter)?;
    Ok(GoldsteinOutput {
        filtered,
        alpha,
        report,
    })
}

/// Filter into caller-provided outputs.
///
/// An output whose shape differs from the interferogram is reallocated.
/// On error the contents of both outputs are unspecified.
pub fn goldstein_filter_into(
    interferogram: &Interferogram,
    coherence: &CoherenceMap,
    config: &GoldsteinConfig,
    filtered: &mut FilteredOutput,
    alpha: &mut AlphaMap,
    reporter: &dyn ProgressReporter,
) -> Result<FilterReport> {
    let grid = validate_inputs(interferogram, coherence, config)?;

    let actual = RasterGrid::of(filtered);
    if actual != grid {
        warn!(expected = %grid, actual = %actual, "Filtered output mis-sized, reallocating");
        *filtered = try_alloc_grid(grid, Complex32::zero(), "filtered output")?;
    }
    let actual = RasterGrid::of(alpha);
    if actual != grid {
        warn!(expected = %grid, actual = %actual, "Alpha map mis-sized, reallocating");
        *alpha = try_alloc_grid(grid, 0.0f32, "alpha map")?;
    }

    run(interferogram, coherence, config, grid, filtered, alpha, reporter)
}

/// Check configuration and input shapes; nothing is allocated or spawned
/// before this passes.
fn validate_inputs(
    interferogram: &Interferogram,
    coherence: &CoherenceMap,
    config: &GoldsteinConfig,
) -> Result<RasterGrid> {
    config.validate()?;
    let grid = RasterGrid::of(interferogram);
    if grid.is_empty() {
        return Err(PhasefiltError::EmptyInput {
            height: grid.height,
            width: grid.width,
        });
    }
    grid.ensure_matches("coherence map", coherence)?;
    Ok(grid)
}

fn run(
    interferogram: &Interferogram,
    coherence: &CoherenceMap,
    config: &GoldsteinConfig,
    grid: RasterGrid,
    filtered: &mut FilteredOutput,
    alpha: &mut AlphaMap,
    reporter: &dyn ProgressReporter,
) -> Result<FilterReport> {
    let start = Instant::now();
    let plan = TilePlan::new(grid, config);
    let requested = config.resolved_workers();

    info!(
        size = %grid,
        tile_size = config.tile_size,
        overlap = config.overlap,
        tiles = plan.tile_count(),
        requested_workers = requested,
        "Goldstein filter start"
    );

    reporter.begin_stage(FilterStage::Filtering, Some(plan.tile_rows()));
    let workers = executor::run_tiles(
        &plan,
        interferogram,
        coherence,
        filtered,
        alpha,
        requested,
        reporter,
    )?;
    reporter.finish_stage();

    let report = FilterReport {
        height: grid.height,
        width: grid.width,
        tiles: plan.tile_count(),
        workers,
        elapsed: start.elapsed(),
    };
    info!(elapsed_s = report.elapsed.as_secs_f64(), "{report}");
    Ok(report)
}
