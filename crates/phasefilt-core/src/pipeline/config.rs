use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{file_io, Result};
use crate::goldstein::GoldsteinConfig;

/// Raw-raster filter job: where the inputs live, where the outputs go,
/// and the raster dimensions (raw files carry no header).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Complex interferogram, interleaved little-endian f32 pairs.
    pub interferogram: PathBuf,
    /// Coherence map, little-endian f32.
    pub coherence: PathBuf,
    pub filtered_output: PathBuf,
    pub alpha_output: PathBuf,
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub goldstein: GoldsteinConfig,
}

impl PipelineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(file_io(path))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
