/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: usize = 32;

/// Default overlap between neighbouring tiles in pixels.
pub const DEFAULT_OVERLAP: usize = 24;

/// Edge length of the spectral magnitude smoothing kernel.
pub const SMOOTHING_KERNEL_SIZE: usize = 5;

/// Uniform weight of each smoothing kernel tap (1 / 25, sums to 1).
pub const SMOOTHING_KERNEL_WEIGHT: f32 = 0.04;

/// Worker count used when hardware parallelism cannot be queried.
pub const FALLBACK_WORKER_COUNT: usize = 1;
