pub mod config;
mod run;
mod types;

pub use run::{filter_rasters, run_pipeline, run_pipeline_reported};
pub use types::{FilterStage, NoOpReporter, ProgressReporter};
