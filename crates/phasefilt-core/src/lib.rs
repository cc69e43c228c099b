pub mod consts;
pub mod error;
pub mod goldstein;
pub mod io;
pub mod pipeline;
pub mod raster;
