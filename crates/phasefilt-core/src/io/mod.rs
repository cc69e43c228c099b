pub mod raster;
pub mod raw;

pub use raster::{MemRaster, Raster, RasterRead, RasterWrite};
pub use raw::{read_raw, write_raw, RawRasterReader, RawRasterWriter, RawSample};
