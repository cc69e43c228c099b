use num_complex::Complex32;
use tracing::{debug, info};

use crate::error::{PhasefiltError, Result};
use crate::goldstein::{goldstein_filter_reported, FilterReport, GoldsteinConfig};
use crate::io::raster::{RasterRead, RasterWrite};
use crate::io::raw::{RawRasterReader, RawRasterWriter};
use crate::raster::RasterGrid;

use super::config::PipelineConfig;
use super::types::{FilterStage, NoOpReporter, ProgressReporter};

fn ensure_same_grid(what: &'static str, expected: RasterGrid, actual: RasterGrid) -> Result<()> {
    if expected != actual {
        return Err(PhasefiltError::DimensionMismatch {
            what,
            expected_height: expected.height,
            expected_width: expected.width,
            height: actual.height,
            width: actual.width,
        });
    }
    Ok(())
}

/// Read band 0 of both inputs, filter, and write band 0 of both outputs.
///
/// All four rasters must share the interferogram's dimensions; this is
/// checked before anything is read.
pub fn filter_rasters<I, C, F, A>(
    interferogram: &I,
    coherence: &C,
    filtered: &mut F,
    alpha: &mut A,
    config: &GoldsteinConfig,
    reporter: &dyn ProgressReporter,
) -> Result<FilterReport>
where
    I: RasterRead<Complex32>,
    C: RasterRead<f32>,
    F: RasterWrite<Complex32>,
    A: RasterWrite<f32>,
{
    let grid = interferogram.grid();
    ensure_same_grid("coherence raster", grid, coherence.grid())?;
    ensure_same_grid("filtered output raster", grid, filtered.grid())?;
    ensure_same_grid("alpha output raster", grid, alpha.grid())?;

    reporter.begin_stage(FilterStage::Reading, Some(2));
    let interferogram_data = interferogram.read_band(0)?;
    reporter.advance(1);
    let coherence_data = coherence.read_band(0)?;
    reporter.advance(1);
    reporter.finish_stage();
    debug!(size = %grid, "Inputs read");

    let output = goldstein_filter_reported(&interferogram_data, &coherence_data, config, reporter)?;

    reporter.begin_stage(FilterStage::Writing, Some(2));
    filtered.write_band(0, output.filtered.view())?;
    reporter.advance(1);
    alpha.write_band(0, output.alpha.view())?;
    reporter.advance(1);
    reporter.finish_stage();

    Ok(output.report)
}

/// Run a raw-raster filter job.
pub fn run_pipeline(config: &PipelineConfig) -> Result<FilterReport> {
    run_pipeline_reported(config, &NoOpReporter)
}

/// Run a raw-raster filter job with progress reporting.
pub fn run_pipeline_reported(
    config: &PipelineConfig,
    reporter: &dyn ProgressReporter,
) -> Result<FilterReport> {
    config.goldstein.validate()?;
    info!(
        interferogram = %config.interferogram.display(),
        coherence = %config.coherence.display(),
        width = config.width,
        height = config.height,
        filter = %config.goldstein,
        "Opening rasters"
    );

    let interferogram =
        RawRasterReader::<Complex32>::open(&config.interferogram, config.height, config.width)?;
    let coherence = RawRasterReader::<f32>::open(&config.coherence, config.height, config.width)?;
    let mut filtered =
        RawRasterWriter::<Complex32>::create(&config.filtered_output, config.height, config.width)?;
    let mut alpha = RawRasterWriter::<f32>::create(&config.alpha_output, config.height, config.width)?;

    let report = filter_rasters(
        &interferogram,
        &coherence,
        &mut filtered,
        &mut alpha,
        &config.goldstein,
        reporter,
    )?;

    filtered.finish()?;
    alpha.finish()?;
    info!(
        filtered = %config.filtered_output.display(),
        alpha = %config.alpha_output.display(),
        "Outputs saved"
    );
    Ok(report)
}
