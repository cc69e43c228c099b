mod common;

use std::sync::Mutex;

use ndarray::Array2;
use num_complex::Complex32;

use phasefilt_core::error::PhasefiltError;
use phasefilt_core::goldstein::{goldstein_filter, GoldsteinConfig};
use phasefilt_core::io::{read_raw, write_raw, MemRaster};
use phasefilt_core::pipeline::config::PipelineConfig;
use phasefilt_core::pipeline::{
    filter_rasters, run_pipeline, run_pipeline_reported, FilterStage, NoOpReporter,
    ProgressReporter,
};
use phasefilt_core::raster::RasterGrid;

use common::{noisy_fringe, varying_coherence};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

fn write_inputs(dir: &std::path::Path, h: usize, w: usize) -> (PipelineConfig, Array2<Complex32>, Array2<f32>) {
    let interferogram = noisy_fringe(h, w, 0.9, 31);
    let coherence = varying_coherence(h, w, 32);
    let config = PipelineConfig {
        interferogram: dir.join("ifg.bin"),
        coherence: dir.join("coh.bin"),
        filtered_output: dir.join("filtered.bin"),
        alpha_output: dir.join("alpha.bin"),
        width: w,
        height: h,
        goldstein: GoldsteinConfig::default().with_workers(2),
    };
    write_raw(&config.interferogram, interferogram.view()).unwrap();
    write_raw(&config.coherence, coherence.view()).unwrap();
    (config, interferogram, coherence)
}

#[test]
fn test_run_pipeline_matches_in_memory_filter() {
    init_tracing();
    let dir = tempfile::tempdir().expect("temp dir");
    let (config, interferogram, coherence) = write_inputs(dir.path(), 45, 38);

    let report = run_pipeline(&config).unwrap();
    assert_eq!((report.height, report.width), (45, 38));

    let expected = goldstein_filter(&interferogram, &coherence, &config.goldstein).unwrap();
    let filtered: Array2<Complex32> = read_raw(&config.filtered_output, 45, 38).unwrap();
    let alpha: Array2<f32> = read_raw(&config.alpha_output, 45, 38).unwrap();
    assert!(filtered == expected.filtered);
    assert!(alpha == expected.alpha);
}

#[test]
fn test_run_pipeline_wrong_dimensions_fails_before_writing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (mut config, _, _) = write_inputs(dir.path(), 20, 20);
    config.width = 21;

    let err = run_pipeline(&config).unwrap_err();
    assert!(matches!(err, PhasefiltError::InvalidRaster(_)), "got: {err}");
    assert!(!config.filtered_output.exists());
    assert!(!config.alpha_output.exists());
}

#[test]
fn test_run_pipeline_missing_input() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (mut config, _, _) = write_inputs(dir.path(), 10, 10);
    config.coherence = dir.path().join("missing.bin");
    match run_pipeline(&config) {
        Err(err @ PhasefiltError::FileIo { .. }) => {
            let msg = err.to_string();
            assert!(msg.contains("missing.bin"), "got: {msg}");
        }
        other => panic!("expected file error, got {:?}", other.map(|r| r.tiles)),
    }
    assert!(!config.filtered_output.exists());
}

#[test]
fn test_pipeline_config_load_error_names_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("absent.toml");
    let err = PipelineConfig::load(&path).unwrap_err();
    assert!(matches!(err, PhasefiltError::FileIo { .. }));
    assert!(err.to_string().contains("absent.toml"), "got: {err}");
}

#[test]
fn test_filter_rasters_rejects_mismatched_coherence() {
    let interferogram = MemRaster::from_array(noisy_fringe(12, 12, 0.5, 1));
    let coherence = MemRaster::from_array(Array2::<f32>::ones((12, 13)));
    let mut filtered = MemRaster::new(RasterGrid::new(12, 12), 1, Complex32::new(0.0, 0.0)).unwrap();
    let mut alpha = MemRaster::new(RasterGrid::new(12, 12), 1, 0.0f32).unwrap();

    let err = filter_rasters(
        &interferogram,
        &coherence,
        &mut filtered,
        &mut alpha,
        &GoldsteinConfig::default(),
        &NoOpReporter,
    )
    .unwrap_err();
    match err {
        PhasefiltError::DimensionMismatch { what, width, .. } => {
            assert_eq!(what, "coherence raster");
            assert_eq!(width, 13);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_filter_rasters_in_memory() {
    let data = noisy_fringe(16, 24, 0.7, 5);
    let coh = varying_coherence(16, 24, 6);
    let interferogram = MemRaster::from_array(data.clone());
    let coherence = MemRaster::from_array(coh.clone());
    let mut filtered = MemRaster::new(RasterGrid::new(16, 24), 1, Complex32::new(0.0, 0.0)).unwrap();
    let mut alpha = MemRaster::new(RasterGrid::new(16, 24), 1, 0.0f32).unwrap();

    filter_rasters(
        &interferogram,
        &coherence,
        &mut filtered,
        &mut alpha,
        &GoldsteinConfig::default(),
        &NoOpReporter,
    )
    .unwrap();

    let expected = goldstein_filter(&data, &coh, &GoldsteinConfig::default()).unwrap();
    assert!(filtered.band(0) == Some(&expected.filtered));
    assert!(alpha.band(0) == Some(&expected.alpha));
}

#[derive(Default)]
struct StageLog(Mutex<Vec<FilterStage>>);

impl ProgressReporter for StageLog {
    fn begin_stage(&self, stage: FilterStage, _total_items: Option<usize>) {
        self.0.lock().unwrap().push(stage);
    }
}

#[test]
fn test_pipeline_reports_stages_in_order() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (config, _, _) = write_inputs(dir.path(), 10, 10);
    let log = StageLog::default();
    run_pipeline_reported(&config, &log).unwrap();
    assert_eq!(
        *log.0.lock().unwrap(),
        vec![FilterStage::Reading, FilterStage::Filtering, FilterStage::Writing]
    );
}

#[test]
fn test_pipeline_config_file_round_trip() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (config, _, _) = write_inputs(dir.path(), 10, 10);
    let path = dir.path().join("job.toml");
    std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

    let loaded = PipelineConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
    run_pipeline(&loaded).unwrap();
    assert!(loaded.filtered_output.exists());
}
