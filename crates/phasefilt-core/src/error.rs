use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhasefiltError {
    #[error("I/O error on {}: {source}", path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid tile configuration: size={tile_size}, overlap={overlap} ({reason})")]
    InvalidTileConfig {
        tile_size: usize,
        overlap: usize,
        reason: &'static str,
    },

    #[error("Invalid worker count: {0}")]
    InvalidWorkerCount(usize),

    #[error("Empty input raster: {width}x{height}")]
    EmptyInput { height: usize, width: usize },

    #[error(
        "{what} dimensions {width}x{height} differ from expected {expected_width}x{expected_height}"
    )]
    DimensionMismatch {
        what: &'static str,
        expected_height: usize,
        expected_width: usize,
        height: usize,
        width: usize,
    },

    #[error("Failed to allocate {bytes} bytes for {what}")]
    Allocation { what: &'static str, bytes: usize },

    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Invalid raster: {0}")]
    InvalidRaster(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, PhasefiltError>;

/// Attach `path` to an I/O error, for use with `map_err`.
pub(crate) fn file_io(path: &Path) -> impl FnOnce(std::io::Error) -> PhasefiltError {
    let path = path.to_path_buf();
    move |source| PhasefiltError::FileIo { path, source }
}
