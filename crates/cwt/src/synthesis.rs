//! Inverse continuous wavelet transform.
//!
//! Reconstruction uses the single-integral inverse
//!
//! ```text
//! x̃(b) = Re[ Σ_j W(s_j, b) · s_j^{-1/2} · Δu_j / conj(C) ]
//! ```
//!
//! where `Δu_j` are the trapezoid weights of the scales in `u = ln s` and `C`
//! is the kernel's [admissibility constant](crate::WaveletKernel::admissibility).
//! Only the zero-mean part of the signal is recoverable, and accuracy depends
//! on how well the scale set covers the signal's spectrum.
//!
//! Subsampled rows are expanded back to full resolution before summing. The
//! default [`Interpolation::Lagrange`] keeps the subsampled reconstruction
//! error close to the full-resolution one.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use num_complex::Complex64;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::analysis::AnalysisEngine;
use crate::boundary::BoundaryPolicy;
use crate::cancel::CancelToken;
use crate::error::CwtError;
use crate::grid::CoefficientGrid;
use crate::kernel::WaveletKernel;
use crate::scales::ScaleSet;
use crate::signal::Signal;

/// Output samples summed per parallel task.
const SUM_CHUNK: usize = 4096;

/// Retained samples on each side of an output sample used by
/// [`Interpolation::Lagrange`].
const LAGRANGE_HALF_WIDTH: usize = 8;

/// How subsampled rows are brought back to full time resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Interpolation {
    /// Nearest retained sample.
    Nearest,
    /// Linear interpolation between retained samples.
    Linear,
    /// Lagrange polynomial through the `16` nearest retained samples.
    ///
    /// Periodic grids wrap the stencil around the seam; other grids shrink
    /// it symmetrically near either end.
    #[default]
    Lagrange,
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Nearest => "nearest",
            Self::Linear => "linear",
            Self::Lagrange => "lagrange",
        })
    }
}

impl FromStr for Interpolation {
    type Err = CwtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "linear" => Ok(Self::Linear),
            "lagrange" => Ok(Self::Lagrange),
            other => Err(CwtError::InvalidParameter {
                component: "interpolation".into(),
                reason: format!("unknown interpolation {other:?}"),
            }),
        }
    }
}

/// Inverse transform engine.
///
/// An engine built with [`from_analysis`](Self::from_analysis) also checks
/// that the grid carries the analysis engine's scale set.
#[derive(Clone, Debug)]
pub struct SynthesisEngine {
    kernel: WaveletKernel,
    expected_scales: Option<ScaleSet>,
    interpolation: Interpolation,
    parallel: bool,
    cancel: Option<CancelToken>,
}

impl SynthesisEngine {
    /// Creates an engine that accepts grids of any scale set.
    pub fn new(kernel: WaveletKernel) -> Self {
        Self {
            kernel,
            expected_scales: None,
            interpolation: Interpolation::default(),
            parallel: true,
            cancel: None,
        }
    }

    /// Creates an engine matching `analysis`: same kernel, scales,
    /// parallelism and cancellation token.
    pub fn from_analysis(analysis: &AnalysisEngine) -> Self {
        Self {
            kernel: analysis.kernel().clone(),
            expected_scales: Some(analysis.scales().clone()),
            interpolation: Interpolation::default(),
            parallel: analysis.parallel(),
            cancel: analysis.cancel_token().cloned(),
        }
    }

    /// Sets the interpolation used for subsampled rows.
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Enables or disables parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Attaches a cancellation token checked before each scale.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Returns the kernel.
    pub fn kernel(&self) -> &WaveletKernel {
        &self.kernel
    }

    /// Returns the interpolation mode.
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Reconstructs a signal of `grid.n_times()` samples from `grid`.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`CwtError::KernelMismatch`] | grid was produced by a different kernel |
    /// | [`CwtError::ScaleMismatch`] | engine expects a different scale set |
    /// | [`CwtError::Cancelled`] | the cancellation token fired |
    /// | [`CwtError::NumericInstability`] | a reconstructed sample is not finite |
    #[tracing::instrument(skip_all, fields(n_times = grid.n_times(), n_scales = grid.n_scales(), interpolation = %self.interpolation))]
    pub fn synthesize(&self, grid: &CoefficientGrid) -> Result<Signal, CwtError> {
        if grid.family() != self.kernel.family() {
            return Err(CwtError::KernelMismatch {
                expected: self.kernel.family().to_string(),
                found: grid.family().to_string(),
            });
        }
        if let Some(expected) = &self.expected_scales
            && expected != grid.scales()
        {
            return Err(CwtError::ScaleMismatch {
                expected: expected.len(),
                found: grid.scales().len(),
            });
        }

        let scales = grid.scales();
        if scales.len() < 2 {
            warn!("reconstruction from a single scale only recovers a narrow band");
        }
        if grid.is_subsampled() {
            debug!(stored = grid.stored_len(), "expanding subsampled rows");
        }

        let n = grid.n_times();
        let weights = scales.log_weights();
        let inv_c = self.kernel.admissibility().conj().inv();
        // Real kernels store subsampled rows with their quadrature, which
        // oscillates at the centre frequency like an analytic row.
        let omega = if self.kernel.is_analytic() || self.kernel.is_real() {
            self.kernel.center_frequency().abs()
        } else {
            0.0
        };
        let periodic = grid.boundary() == BoundaryPolicy::Periodic;

        let total = grid.n_scales();
        let completed = AtomicUsize::new(0);
        let expand = |j: usize| -> Result<Vec<Complex64>, CwtError> {
            if let Some(token) = &self.cancel
                && token.is_cancelled()
            {
                return Err(CwtError::Cancelled {
                    completed: completed.load(Ordering::Relaxed),
                    total,
                });
            }
            let s = scales.as_slice()[j];
            let factor = inv_c * (weights[j] / s.sqrt());
            let row = expand_row(
                grid.row(j),
                grid.strides()[j],
                n,
                omega / s,
                self.interpolation,
                periodic,
            );
            completed.fetch_add(1, Ordering::Relaxed);
            Ok(row.into_iter().map(|c| c * factor).collect())
        };

        let rows: Vec<Vec<Complex64>> = if self.parallel {
            (0..total)
                .into_par_iter()
                .map(&expand)
                .collect::<Result<_, _>>()?
        } else {
            (0..total).map(&expand).collect::<Result<_, _>>()?
        };

        let mut out = vec![0.0; n];
        let accumulate = |(chunk_index, chunk): (usize, &mut [f64])| {
            let offset = chunk_index * SUM_CHUNK;
            for row in &rows {
                for (value, c) in chunk.iter_mut().zip(&row[offset..]) {
                    *value += c.re;
                }
            }
        };
        if self.parallel {
            out.par_chunks_mut(SUM_CHUNK).enumerate().for_each(accumulate);
        } else {
            out.chunks_mut(SUM_CHUNK).enumerate().for_each(accumulate);
        }

        if let Some(time_index) = out.iter().position(|v| !v.is_finite()) {
            let scale_index = first_unstable_scale(&rows, time_index);
            return Err(CwtError::NumericInstability {
                scale_index,
                time_index,
                scale: scales.as_slice()[scale_index],
            });
        }

        Signal::with_dt(out, grid.dt())
    }
}

/// Scale index at which the running sum for `time_index` stops being finite.
fn first_unstable_scale(rows: &[Vec<Complex64>], time_index: usize) -> usize {
    let mut sum = 0.0;
    for (j, row) in rows.iter().enumerate() {
        sum += row[time_index].re;
        if !sum.is_finite() {
            return j;
        }
    }
    rows.len().saturating_sub(1)
}

/// Expands a row stored at `stride` to `n` samples.
///
/// Interpolation runs on the demodulated row `W(b)·e^{-iωb}` and the result
/// is re-modulated, so a narrow-band row centred on `ω` interpolates as a
/// slowly varying envelope. Pass `omega = 0` for rows without a carrier.
/// `periodic` lets the Lagrange stencil wrap around the end of the row.
pub(crate) fn expand_row(
    row: &[Complex64],
    stride: usize,
    n: usize,
    omega: f64,
    interpolation: Interpolation,
    periodic: bool,
) -> Vec<Complex64> {
    if stride <= 1 {
        return row.to_vec();
    }
    let Some(last) = row.len().checked_sub(1) else {
        return vec![Complex64::new(0.0, 0.0); n];
    };
    let base: Vec<Complex64> = row
        .iter()
        .enumerate()
        .map(|(m, &c)| c * Complex64::from_polar(1.0, -omega * (m * stride) as f64))
        .collect();

    let stencil = (interpolation == Interpolation::Lagrange)
        .then(|| LagrangeStencil::new(row, &base, stride, n, omega, periodic));

    (0..n)
        .map(|b| {
            let m = b / stride;
            let rem = b % stride;
            let envelope = match interpolation {
                Interpolation::Nearest => {
                    let nearest = if 2 * rem >= stride { m + 1 } else { m };
                    base[nearest.min(last)]
                }
                Interpolation::Linear => {
                    if rem == 0 || m >= last {
                        base[m.min(last)]
                    } else {
                        let frac = rem as f64 / stride as f64;
                        base[m] * (1.0 - frac) + base[m + 1] * frac
                    }
                }
                Interpolation::Lagrange => match &stencil {
                    Some(stencil) => stencil.envelope(b),
                    None => base[m.min(last)],
                },
            };
            envelope * Complex64::from_polar(1.0, omega * b as f64)
        })
        .collect()
}

/// Lagrange interpolation of a demodulated row.
///
/// Away from the ends every output sample with the same offset `b % stride`
/// uses the same weights, so those are tabulated once.
struct LagrangeStencil<'a> {
    row: &'a [Complex64],
    base: &'a [Complex64],
    stride: usize,
    n: usize,
    omega: f64,
    periodic: bool,
    half: usize,
    table: Vec<Vec<f64>>,
}

impl<'a> LagrangeStencil<'a> {
    fn new(
        row: &'a [Complex64],
        base: &'a [Complex64],
        stride: usize,
        n: usize,
        omega: f64,
        periodic: bool,
    ) -> Self {
        let half = if periodic {
            LAGRANGE_HALF_WIDTH.min(row.len() / 2)
        } else {
            LAGRANGE_HALF_WIDTH
        };
        // Node offsets from `m` in units of the stride.
        let offsets: Vec<f64> = (0..2 * half)
            .map(|k| k as f64 + 1.0 - half as f64)
            .collect();
        let table = (0..stride)
            .map(|rem| lagrange_weights(rem as f64 / stride as f64, &offsets))
            .collect();
        Self {
            row,
            base,
            stride,
            n,
            omega,
            periodic,
            half,
            table,
        }
    }

    /// Demodulated value at output sample `b`.
    fn envelope(&self, b: usize) -> Complex64 {
        let last = self.base.len() - 1;
        let m = (b / self.stride).min(last);
        let rem = b - m * self.stride;
        if rem == 0 {
            return self.base[m];
        }
        let h = if self.periodic {
            self.half
        } else {
            self.half.min(m + 1).min(last - m)
        };
        if h == 0 {
            return self.base[m];
        }

        let lo = m as isize + 1 - h as isize;
        let hi = (m + h) as isize;
        if h == self.half && lo >= 0 && hi <= last as isize {
            return self.base[lo as usize..=hi as usize]
                .iter()
                .zip(&self.table[rem])
                .map(|(v, w)| *v * *w)
                .sum();
        }

        let nodes: Vec<(f64, Complex64)> = (lo..=hi).map(|i| self.node(i)).collect();
        let positions: Vec<f64> = nodes.iter().map(|(t, _)| *t).collect();
        nodes
            .iter()
            .zip(lagrange_weights(b as f64, &positions))
            .map(|((_, v), w)| *v * w)
            .sum()
    }

    /// Position and demodulated value of node `i`, wrapping periodically.
    fn node(&self, i: isize) -> (f64, Complex64) {
        let len = self.row.len() as isize;
        let r = i.rem_euclid(len) as usize;
        let t = (r * self.stride) as f64 + i.div_euclid(len) as f64 * self.n as f64;
        (t, self.row[r] * Complex64::from_polar(1.0, -self.omega * t))
    }
}

/// Lagrange basis weights at `x` for distinct `nodes`.
fn lagrange_weights(x: f64, nodes: &[f64]) -> Vec<f64> {
    nodes
        .iter()
        .enumerate()
        .map(|(k, &tk)| {
            nodes
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != k)
                .map(|(_, &tj)| (x - tj) / (tk - tj))
                .product()
        })
        .collect()
}

/// Reconstructs a signal from `grid` with `kernel` and default settings.
///
/// # Errors
///
/// Same as [`SynthesisEngine::synthesize`].
pub fn synthesize(grid: &CoefficientGrid, kernel: &WaveletKernel) -> Result<Signal, CwtError> {
    SynthesisEngine::new(kernel.clone()).synthesize(grid)
}
