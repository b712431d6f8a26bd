//! Coefficient grids produced by analysis and consumed by synthesis.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use num_complex::Complex64;

use crate::boundary::BoundaryPolicy;
use crate::error::CwtError;
use crate::kernel::{WaveletFamily, WaveletKernel};
use crate::scales::ScaleSet;

/// Real-valued projection of complex coefficients.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ComponentView {
    /// Modulus `|W|`.
    #[default]
    Abs,
    /// Phase `arg W` in radians.
    Angle,
    /// Real part.
    Real,
    /// Imaginary part.
    Imag,
}

impl ComponentView {
    /// Projects one coefficient.
    pub fn apply(self, c: Complex64) -> f64 {
        match self {
            Self::Abs => c.norm(),
            Self::Angle => c.arg(),
            Self::Real => c.re,
            Self::Imag => c.im,
        }
    }
}

impl fmt::Display for ComponentView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Abs => "abs",
            Self::Angle => "angle",
            Self::Real => "real",
            Self::Imag => "imag",
        })
    }
}

impl FromStr for ComponentView {
    type Err = CwtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abs" | "modulus" => Ok(Self::Abs),
            "angle" | "arg" | "phase" => Ok(Self::Angle),
            "real" | "re" => Ok(Self::Real),
            "imag" | "im" => Ok(Self::Imag),
            other => Err(CwtError::InvalidParameter {
                component: "view".into(),
                reason: format!("unknown component view {other:?}"),
            }),
        }
    }
}

/// Complex wavelet coefficients indexed by (scale index, time index).
///
/// Row `j` holds `ceil(n_times / stride_j)` coefficients at times
/// `0, stride_j, 2·stride_j, …`; without subsampling every stride is 1. The
/// grid also records everything synthesis needs to check compatibility:
/// the kernel family, the scale set, and the boundary policy.
///
/// For a real-valued kernel (see [`WaveletFamily::is_real`]) a row with
/// stride above one stores the analytic value `W + i·H[W]`, where `H` is the
/// Hilbert transform along time. Its real part is the coefficient; the
/// quadrature part lets synthesis interpolate the row without aliasing.
/// [`get`](Self::get), [`power`](Self::power) and
/// [`component`](Self::component) report the coefficient itself, while
/// [`rows`](Self::rows) exposes the stored values.
#[derive(Clone, Debug, PartialEq)]
pub struct CoefficientGrid {
    rows: Vec<Vec<Complex64>>,
    scales: ScaleSet,
    strides: Vec<usize>,
    n_times: usize,
    dt: f64,
    family: WaveletFamily,
    boundary: BoundaryPolicy,
}

impl CoefficientGrid {
    /// Crate-internal constructor for rows already known to be consistent.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        rows: Vec<Vec<Complex64>>,
        scales: ScaleSet,
        strides: Vec<usize>,
        n_times: usize,
        dt: f64,
        family: WaveletFamily,
        boundary: BoundaryPolicy,
    ) -> Self {
        Self {
            rows,
            scales,
            strides,
            n_times,
            dt,
            family,
            boundary,
        }
    }

    /// Assembles a grid from stored parts, validating every shape invariant.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`CwtError::InvalidGrid`] | row or stride count differs from the scale count, a stride is zero, a row length is not `ceil(n_times / stride)`, `n_times == 0`, `dt` is not positive, or a coefficient is not finite |
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        rows: Vec<Vec<Complex64>>,
        scales: ScaleSet,
        strides: Vec<usize>,
        n_times: usize,
        dt: f64,
        family: WaveletFamily,
        boundary: BoundaryPolicy,
    ) -> Result<Self, CwtError> {
        if n_times == 0 {
            return Err(CwtError::InvalidGrid("time axis is empty".into()));
        }
        if !(dt.is_finite() && dt > 0.0) {
            return Err(CwtError::InvalidGrid(format!(
                "dt must be positive and finite, got {dt}"
            )));
        }
        if rows.len() != scales.len() {
            return Err(CwtError::InvalidGrid(format!(
                "{} rows for {} scales",
                rows.len(),
                scales.len()
            )));
        }
        if strides.len() != scales.len() {
            return Err(CwtError::InvalidGrid(format!(
                "{} strides for {} scales",
                strides.len(),
                scales.len()
            )));
        }
        for (j, (row, &stride)) in rows.iter().zip(strides.iter()).enumerate() {
            if stride == 0 {
                return Err(CwtError::InvalidGrid(format!("stride of row {j} is zero")));
            }
            let expected = n_times.div_ceil(stride);
            if row.len() != expected {
                return Err(CwtError::InvalidGrid(format!(
                    "row {j} has {} values, expected {expected}",
                    row.len()
                )));
            }
            if let Some(i) = row.iter().position(|c| !c.is_finite()) {
                return Err(CwtError::InvalidGrid(format!(
                    "row {j} value {i} is not finite"
                )));
            }
        }
        Ok(Self::new(
            rows, scales, strides, n_times, dt, family, boundary,
        ))
    }

    /// Stored rows, one per scale in ascending scale order.
    pub fn rows(&self) -> &[Vec<Complex64>] {
        &self.rows
    }

    /// Row of the scale at `scale_index`.
    ///
    /// # Panics
    ///
    /// Panics if `scale_index >= n_scales()`.
    pub fn row(&self, scale_index: usize) -> &[Complex64] {
        &self.rows[scale_index]
    }

    /// Coefficient at `(scale_index, time_index)`, if that time is retained.
    pub fn get(&self, scale_index: usize, time_index: usize) -> Option<Complex64> {
        let stride = *self.strides.get(scale_index)?;
        if time_index % stride != 0 {
            return None;
        }
        let value = self.rows[scale_index].get(time_index / stride).copied()?;
        Some(self.coefficient(scale_index, value))
    }

    /// `true` if row `scale_index` stores analytic values rather than the
    /// coefficients themselves.
    pub fn is_quadrature_row(&self, scale_index: usize) -> bool {
        self.strides.get(scale_index).is_some_and(|&s| s > 1) && self.family.is_real()
    }

    /// Coefficient behind a stored value of row `scale_index`.
    fn coefficient(&self, scale_index: usize, value: Complex64) -> Complex64 {
        if self.is_quadrature_row(scale_index) {
            Complex64::new(value.re, 0.0)
        } else {
            value
        }
    }

    /// Coefficients of every row, with quadrature parts removed.
    fn coefficient_rows(&self) -> impl Iterator<Item = Cow<'_, [Complex64]>> {
        self.rows.iter().enumerate().map(|(j, row)| {
            if self.is_quadrature_row(j) {
                Cow::Owned(row.iter().map(|c| Complex64::new(c.re, 0.0)).collect())
            } else {
                Cow::Borrowed(row.as_slice())
            }
        })
    }

    /// Scale set of the vertical axis.
    pub fn scales(&self) -> &ScaleSet {
        &self.scales
    }

    /// Per-scale time strides.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// `true` if any row is stored at reduced resolution.
    pub fn is_subsampled(&self) -> bool {
        self.strides.iter().any(|&s| s > 1)
    }

    /// Number of scales.
    pub fn n_scales(&self) -> usize {
        self.rows.len()
    }

    /// Length of the full-resolution time axis.
    pub fn n_times(&self) -> usize {
        self.n_times
    }

    /// Sampling interval of the analysed signal.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Family and parameters of the kernel that produced the grid.
    pub fn family(&self) -> &WaveletFamily {
        &self.family
    }

    /// Boundary policy used during analysis.
    pub fn boundary(&self) -> BoundaryPolicy {
        self.boundary
    }

    /// Total number of stored coefficients.
    pub fn stored_len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Wavelet power `|W|²`, row by row.
    pub fn power(&self) -> Vec<Vec<f64>> {
        self.coefficient_rows()
            .map(|row| row.iter().map(|c| c.norm_sqr()).collect())
            .collect()
    }

    /// Time-averaged power per scale over the stored samples.
    pub fn global_spectrum(&self) -> Vec<f64> {
        self.coefficient_rows()
            .map(|row| row.iter().map(|c| c.norm_sqr()).sum::<f64>() / row.len() as f64)
            .collect()
    }

    /// Fourier period of every scale, in time units.
    pub fn periods(&self, kernel: &WaveletKernel) -> Vec<f64> {
        self.scales
            .iter()
            .map(|s| kernel.fourier_period(s) * self.dt)
            .collect()
    }

    /// Largest scale, per time index, whose kernel support stays inside the
    /// signal; coefficients above it are affected by the boundary policy.
    pub fn cone_of_influence(&self, kernel: &WaveletKernel) -> Vec<f64> {
        let (lo, hi) = kernel.support();
        let n = self.n_times;
        (0..n)
            .map(|t| {
                // Offsets in [s·lo, s·hi] must stay within [-t, n-1-t].
                let before = if lo < 0.0 { t as f64 / -lo } else { f64::INFINITY };
                let after = if hi > 0.0 {
                    (n - 1 - t) as f64 / hi
                } else {
                    f64::INFINITY
                };
                before.min(after)
            })
            .collect()
    }

    /// Rows projected onto `view`.
    pub fn component(&self, view: ComponentView) -> Vec<Vec<f64>> {
        self.coefficient_rows()
            .map(|row| row.iter().map(|&c| view.apply(c)).collect())
            .collect()
    }

    /// Consumes the grid and returns its stored rows.
    pub fn into_rows(self) -> Vec<Vec<Complex64>> {
        self.rows
    }
}
