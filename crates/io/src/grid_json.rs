//! JSON persistence of coefficient grids.
//!
//! A grid file holds a format version, the kernel family and parameters, the
//! boundary policy, the sampling interval, the time-axis length, and one
//! record per scale with its stride and split real and imaginary parts.
//! Values are written in shortest round-trip form, so a saved grid loads back
//! bit-identical.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use cwtlab_cwt::{BoundaryPolicy, CoefficientGrid, ScaleSet, WaveletFamily};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::IoError;
use crate::validate::{validate_ascending, validate_row_parts};

/// Version written by [`save_grid`] and accepted by [`load_grid`].
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
enum KernelRecord {
    Morlet {
        dff: f64,
    },
    Cauchy {
        alpha: f64,
    },
    Dog {
        order: u32,
    },
    Sampled {
        name: String,
        t0: f64,
        dt: f64,
        values: Vec<[f64; 2]>,
    },
}

impl From<&WaveletFamily> for KernelRecord {
    fn from(family: &WaveletFamily) -> Self {
        match family {
            WaveletFamily::Morlet { dff } => Self::Morlet { dff: *dff },
            WaveletFamily::Cauchy { alpha } => Self::Cauchy { alpha: *alpha },
            WaveletFamily::DerivativeOfGaussian { order } => Self::Dog { order: *order },
            WaveletFamily::Sampled {
                name,
                t0,
                dt,
                values,
            } => Self::Sampled {
                name: name.clone(),
                t0: *t0,
                dt: *dt,
                values: values.iter().map(|c| [c.re, c.im]).collect(),
            },
        }
    }
}

impl From<KernelRecord> for WaveletFamily {
    fn from(record: KernelRecord) -> Self {
        match record {
            KernelRecord::Morlet { dff } => Self::Morlet { dff },
            KernelRecord::Cauchy { alpha } => Self::Cauchy { alpha },
            KernelRecord::Dog { order } => Self::DerivativeOfGaussian { order },
            KernelRecord::Sampled {
                name,
                t0,
                dt,
                values,
            } => Self::Sampled {
                name,
                t0,
                dt,
                values: values
                    .into_iter()
                    .map(|[re, im]| Complex64::new(re, im))
                    .collect(),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RowRecord {
    scale: f64,
    stride: usize,
    re: Vec<f64>,
    im: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GridRecord {
    version: u32,
    kernel: KernelRecord,
    boundary: String,
    dt: f64,
    n_times: usize,
    rows: Vec<RowRecord>,
}

impl GridRecord {
    fn from_grid(grid: &CoefficientGrid) -> Self {
        let rows = grid
            .rows()
            .iter()
            .zip(grid.scales().iter())
            .zip(grid.strides())
            .map(|((row, scale), &stride)| RowRecord {
                scale,
                stride,
                re: row.iter().map(|c| c.re).collect(),
                im: row.iter().map(|c| c.im).collect(),
            })
            .collect();
        Self {
            version: FORMAT_VERSION,
            kernel: KernelRecord::from(grid.family()),
            boundary: grid.boundary().to_string(),
            dt: grid.dt(),
            n_times: grid.n_times(),
            rows,
        }
    }

    fn into_grid(self) -> Result<CoefficientGrid, IoError> {
        if self.version != FORMAT_VERSION {
            return Err(IoError::UnsupportedVersion {
                found: self.version,
                expected: FORMAT_VERSION,
            });
        }

        let scales: Vec<f64> = self.rows.iter().map(|r| r.scale).collect();
        let mut c = validate_ascending(&scales);
        c.merge(validate_row_parts(
            self.rows.iter().map(|r| (r.re.as_slice(), r.im.as_slice())),
        ));
        c.finish()?;

        let boundary: BoundaryPolicy = self.boundary.parse()?;
        let scale_set = ScaleSet::from_explicit(scales)?;
        let (strides, rows): (Vec<usize>, Vec<Vec<Complex64>>) = self
            .rows
            .into_iter()
            .map(|r| {
                let row = r
                    .re
                    .into_iter()
                    .zip(r.im)
                    .map(|(re, im)| Complex64::new(re, im))
                    .collect();
                (r.stride, row)
            })
            .unzip();

        Ok(CoefficientGrid::from_parts(
            rows,
            scale_set,
            strides,
            self.n_times,
            self.dt,
            self.kernel.into(),
            boundary,
        )?)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Save a coefficient grid as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`IoError::Io`] if the file cannot be created or flushed, or
/// [`IoError::Json`] if serialization fails.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn save_grid(path: &Path, grid: &CoefficientGrid) -> Result<(), IoError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &GridRecord::from_grid(grid))?;
    writer.flush()?;
    info!(
        n_scales = grid.n_scales(),
        stored = grid.stored_len(),
        "grid saved"
    );
    Ok(())
}

/// Load a coefficient grid written by [`save_grid`].
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`IoError::FileNotFound`] | `path` does not exist |
/// | [`IoError::Json`] | malformed JSON or missing fields |
/// | [`IoError::UnsupportedVersion`] | `version` differs from [`FORMAT_VERSION`] |
/// | [`IoError::Validation`] | scales out of order, or real and imaginary parts of unequal length |
/// | [`IoError::Transform`] | unknown boundary, invalid scales, or rows inconsistent with strides and `n_times` |
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_grid(path: &Path) -> Result<CoefficientGrid, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let reader = BufReader::new(File::open(path)?);
    let record: GridRecord = serde_json::from_reader(reader)?;
    debug!(version = record.version, rows = record.rows.len(), "grid record parsed");
    let grid = record.into_grid()?;
    info!(n_scales = grid.n_scales(), n_times = grid.n_times(), "grid loaded");
    Ok(grid)
}

/// Serialize a grid to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns [`IoError::Json`] if serialization fails.
pub fn grid_to_string(grid: &CoefficientGrid) -> Result<String, IoError> {
    Ok(serde_json::to_string_pretty(&GridRecord::from_grid(grid))?)
}

/// Parse a grid from JSON text.
///
/// # Errors
///
/// Same as [`load_grid`], except [`IoError::FileNotFound`] and
/// [`IoError::Io`].
pub fn grid_from_str(json: &str) -> Result<CoefficientGrid, IoError> {
    let record: GridRecord = serde_json::from_str(json)?;
    record.into_grid()
}
