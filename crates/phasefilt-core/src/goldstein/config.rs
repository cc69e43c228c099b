use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_OVERLAP, DEFAULT_TILE_SIZE, FALLBACK_WORKER_COUNT};
use crate::error::{PhasefiltError, Result};

/// Tiling and parallelism parameters of the Goldstein filter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoldsteinConfig {
    /// Tile edge length in pixels (default: 32).
    pub tile_size: usize,
    /// Overlap between neighbouring tiles in pixels (default: 24).
    pub overlap: usize,
    /// Worker count. `None` uses the available hardware parallelism.
    pub workers: Option<usize>,
}

impl Default for GoldsteinConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            overlap: DEFAULT_OVERLAP,
            workers: None,
        }
    }
}

impl GoldsteinConfig {
    pub fn new(tile_size: usize, overlap: usize) -> Self {
        Self {
            tile_size,
            overlap,
            workers: None,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Distance between consecutive tile origins.
    pub fn step(&self) -> usize {
        self.tile_size - self.overlap
    }

    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(PhasefiltError::InvalidTileConfig {
                tile_size: self.tile_size,
                overlap: self.overlap,
                reason: "tile size must be positive",
            });
        }
        if self.overlap >= self.tile_size {
            return Err(PhasefiltError::InvalidTileConfig {
                tile_size: self.tile_size,
                overlap: self.overlap,
                reason: "overlap must be smaller than tile size",
            });
        }
        if self.workers == Some(0) {
            return Err(PhasefiltError::InvalidWorkerCount(0));
        }
        Ok(())
    }

    /// Worker count to run with: the configured value or the hardware parallelism.
    pub fn resolved_workers(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(FALLBACK_WORKER_COUNT)
        })
    }
}

impl std::fmt::Display for GoldsteinConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Goldstein {}px / {}px overlap",
            self.tile_size, self.overlap
        )
    }
}
