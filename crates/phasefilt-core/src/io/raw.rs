use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use memmap2::Mmap;
use ndarray::{Array2, ArrayView2};
use num_complex::Complex32;
use tracing::debug;

use crate::error::{file_io, PhasefiltError, Result};
use crate::raster::RasterGrid;

use super::raster::{check_window, Raster, RasterRead, RasterWrite};

/// A sample type stored in headerless little-endian raster files.
pub trait RawSample: Copy + Default + Send + Sync + 'static {
    /// Bytes per sample on disk.
    const BYTES: usize;

    fn read_le(bytes: &[u8]) -> Self;

    fn write_le<W: Write>(&self, w: &mut W) -> std::io::Result<()>;
}

impl RawSample for f32 {
    const BYTES: usize = 4;

    fn read_le(bytes: &[u8]) -> Self {
        LittleEndian::read_f32(bytes)
    }

    fn write_le<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_f32::<LittleEndian>(*self)
    }
}

/// Interleaved `re, im` f32 pair.
impl RawSample for Complex32 {
    const BYTES: usize = 8;

    fn read_le(bytes: &[u8]) -> Self {
        Complex32::new(
            LittleEndian::read_f32(&bytes[0..4]),
            LittleEndian::read_f32(&bytes[4..8]),
        )
    }

    fn write_le<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_f32::<LittleEndian>(self.re)?;
        w.write_f32::<LittleEndian>(self.im)
    }
}

/// Memory-mapped single-band raw raster.
#[derive(Debug)]
pub struct RawRasterReader<T> {
    mmap: Mmap,
    grid: RasterGrid,
    _sample: PhantomData<T>,
}

impl<T: RawSample> RawRasterReader<T> {
    /// Map `path` as a `height x width` raster. The file size must match exactly.
    pub fn open(path: &Path, height: usize, width: usize) -> Result<Self> {
        let grid = RasterGrid::new(height, width);
        let expected = raw_len::<T>(grid)?;

        let file = File::open(path).map_err(file_io(path))?;
        let mmap = unsafe { Mmap::map(&file) }.map_err(file_io(path))?;

        if mmap.len() != expected {
            return Err(PhasefiltError::InvalidRaster(format!(
                "{}: expected {} bytes for {} raster of {}-byte samples, got {}",
                path.display(),
                expected,
                grid,
                T::BYTES,
                mmap.len()
            )));
        }
        debug!(path = %path.display(), size = %grid, "Mapped raw raster");

        Ok(Self {
            mmap,
            grid,
            _sample: PhantomData,
        })
    }
}

impl<T> Raster for RawRasterReader<T> {
    fn grid(&self) -> RasterGrid {
        self.grid
    }
}

impl<T: RawSample> RasterRead<T> for RawRasterReader<T> {
    fn read(&self, band: usize, x: usize, y: usize, w: usize, h: usize) -> Result<Array2<T>> {
        check_window(self.grid, 1, band, x, y, w, h)?;
        let stride = self.grid.width * T::BYTES;
        Ok(Array2::from_shape_fn((h, w), |(r, c)| {
            let offset = (y + r) * stride + (x + c) * T::BYTES;
            T::read_le(&self.mmap[offset..offset + T::BYTES])
        }))
    }
}

/// Byte length of a raw raster of `grid`, rejecting empty or unaddressable grids.
fn raw_len<T: RawSample>(grid: RasterGrid) -> Result<usize> {
    if grid.is_empty() {
        return Err(PhasefiltError::EmptyInput {
            height: grid.height,
            width: grid.width,
        });
    }
    grid.pixel_count()
        .checked_mul(T::BYTES)
        .ok_or_else(|| PhasefiltError::InvalidRaster(format!("raster {grid} too large")))
}

fn write_samples<'a, T, W, I>(w: &mut W, samples: I) -> std::io::Result<()>
where
    T: RawSample,
    W: Write,
    I: IntoIterator<Item = &'a T>,
{
    for v in samples {
        v.write_le(w)?;
    }
    Ok(())
}

/// Read a whole raw raster into memory.
pub fn read_raw<T: RawSample>(path: &Path, height: usize, width: usize) -> Result<Array2<T>> {
    RawRasterReader::<T>::open(path, height, width)?.read_band(0)
}

/// Write `data` row-major as a headerless little-endian raster.
pub fn write_raw<T: RawSample>(path: &Path, data: ArrayView2<'_, T>) -> Result<()> {
    let file = File::create(path).map_err(file_io(path))?;
    let mut writer = BufWriter::new(file);
    write_samples(&mut writer, data.iter())
        .and_then(|_| writer.flush())
        .map_err(file_io(path))?;
    let grid = RasterGrid::new(data.nrows(), data.ncols());
    debug!(path = %path.display(), size = %grid, "Wrote raw raster");
    Ok(())
}

/// Single-band raw raster written window by window straight to disk.
///
/// The file is created on the first write (or on [`Self::finish`]), sized to
/// the full raster with unwritten samples reading as zero. A writer dropped
/// before either leaves nothing on disk.
#[derive(Debug)]
pub struct RawRasterWriter<T> {
    path: PathBuf,
    grid: RasterGrid,
    file: Option<File>,
    row: Vec<u8>,
    _sample: PhantomData<T>,
}

impl<T: RawSample> RawRasterWriter<T> {
    pub fn create(path: &Path, height: usize, width: usize) -> Result<Self> {
        let grid = RasterGrid::new(height, width);
        raw_len::<T>(grid)?;
        Ok(Self {
            path: path.to_path_buf(),
            grid,
            file: None,
            row: Vec::new(),
            _sample: PhantomData,
        })
    }

    fn file(&mut self) -> Result<&mut File> {
        if self.file.is_none() {
            let len = raw_len::<T>(self.grid)? as u64;
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.path)
                .map_err(file_io(&self.path))?;
            file.set_len(len).map_err(file_io(&self.path))?;
            debug!(path = %self.path.display(), size = %self.grid, "Created raw raster");
            self.file = Some(file);
        }
        match self.file.as_mut() {
            Some(file) => Ok(file),
            None => Err(PhasefiltError::InvalidRaster(format!(
                "{}: output not open",
                self.path.display()
            ))),
        }
    }

    /// Flush the raster to disk, creating it zero-filled if nothing was written.
    pub fn finish(mut self) -> Result<()> {
        self.file()?.sync_all().map_err(file_io(&self.path))?;
        debug!(path = %self.path.display(), size = %self.grid, "Wrote raw raster");
        Ok(())
    }
}

impl<T> Raster for RawRasterWriter<T> {
    fn grid(&self) -> RasterGrid {
        self.grid
    }
}

impl<T: RawSample> RasterWrite<T> for RawRasterWriter<T> {
    fn write(
        &mut self,
        band: usize,
        x: usize,
        y: usize,
        w: usize,
        h: usize,
        samples: ArrayView2<'_, T>,
    ) -> Result<()> {
        check_window(self.grid, 1, band, x, y, w, h)?;
        if samples.dim() != (h, w) {
            return Err(PhasefiltError::DimensionMismatch {
                what: "raster write window",
                expected_height: h,
                expected_width: w,
                height: samples.nrows(),
                width: samples.ncols(),
            });
        }

        let width = self.grid.width;
        let mut row = std::mem::take(&mut self.row);
        let file = self.file()?;
        let mut result = Ok(());
        for (r, samples_row) in samples.rows().into_iter().enumerate() {
            row.clear();
            let offset = (((y + r) * width + x) * T::BYTES) as u64;
            result = write_samples(&mut row, samples_row.iter())
                .and_then(|_| file.seek(SeekFrom::Start(offset)))
                .and_then(|_| file.write_all(&row));
            if result.is_err() {
                break;
            }
        }
        self.row = row;
        result.map_err(file_io(&self.path))
    }
}
