//! Per-scale correlation of a signal with a scaled, conjugated kernel.
//!
//! Row values are `W(i) = Σ_τ x(i + τ) · k(τ)` with taps
//! `k(τ) = conj(ψ(τ/s)) / √s` and `x` extended by the [`BoundaryPolicy`].
//! The direct and FFT paths consume the same taps and the same extension, so
//! they differ only by floating-point rounding.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use crate::boundary::BoundaryPolicy;
use crate::error::CwtError;
use crate::kernel::WaveletKernel;

/// Taps of wrapping policies are clamped to this many periods either side.
const MAX_WRAP_PERIODS: i64 = 4;

/// How a row of coefficients is computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConvolutionStrategy {
    /// Pick per scale by estimated cost.
    #[default]
    Auto,
    /// Time-domain sum over the kernel taps.
    Direct,
    /// Circular convolution of the extended signal via FFT.
    Fft,
}

impl ConvolutionStrategy {
    /// Resolves `Auto` to `Direct` when `taps · outputs <= 4 · L · log2(L)`.
    pub(crate) fn resolve(self, taps: usize, outputs: usize, fft_len: usize) -> Self {
        match self {
            Self::Auto => {
                let l = fft_len.max(2) as f64;
                let fft_cost = 4.0 * l * l.log2();
                if (taps as f64) * (outputs as f64) <= fft_cost {
                    Self::Direct
                } else {
                    Self::Fft
                }
            }
            other => other,
        }
    }
}

impl fmt::Display for ConvolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Direct => "direct",
            Self::Fft => "fft",
        })
    }
}

impl FromStr for ConvolutionStrategy {
    type Err = CwtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "direct" => Ok(Self::Direct),
            "fft" => Ok(Self::Fft),
            other => Err(CwtError::InvalidParameter {
                component: "strategy".into(),
                reason: format!("unknown convolution strategy {other:?}"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Taps
// ---------------------------------------------------------------------------

/// Inclusive range of integer tap offsets for one scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TapRange {
    first: i64,
    last: i64,
}

impl TapRange {
    /// Offsets `⌊s·lo⌋ ..= ⌈s·hi⌉`, clamped to `±(N-1)` under zero padding
    /// and to four periods under wrapping policies.
    pub(crate) fn new(
        kernel: &WaveletKernel,
        scale: f64,
        n: usize,
        boundary: BoundaryPolicy,
    ) -> Self {
        let (lo, hi) = kernel.support();
        let limit = match boundary.period(n) {
            Some(period) => MAX_WRAP_PERIODS * period as i64,
            None => n as i64 - 1,
        };
        Self {
            first: ((scale * lo).floor() as i64).max(-limit),
            last: ((scale * hi).ceil() as i64).min(limit),
        }
    }

    pub(crate) fn len(&self) -> usize {
        if self.last < self.first {
            0
        } else {
            (self.last - self.first + 1) as usize
        }
    }

    /// Largest distance between an output index and a sample it touches.
    pub(crate) fn reach(&self) -> usize {
        if self.len() == 0 {
            0
        } else {
            self.first.unsigned_abs().max(self.last.unsigned_abs()) as usize
        }
    }

    /// Conjugated, scaled kernel values for every offset in the range.
    pub(crate) fn taps(&self, kernel: &WaveletKernel, scale: f64) -> Vec<Complex64> {
        (self.first..=self.last)
            .map(|tau| kernel.evaluate(tau as f64, scale).conj())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Direct path
// ---------------------------------------------------------------------------

/// Evaluates the row at times `0, stride, 2·stride, …` by direct summation.
pub(crate) fn direct_row(
    data: &[f64],
    boundary: BoundaryPolicy,
    range: TapRange,
    taps: &[Complex64],
    stride: usize,
) -> Vec<Complex64> {
    (0..data.len())
        .step_by(stride)
        .map(|i| {
            let origin = i as i64 + range.first;
            taps.iter()
                .enumerate()
                .fold(Complex64::new(0.0, 0.0), |acc, (k, &w)| {
                    acc + w * boundary.sample(data, origin + k as i64)
                })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// FFT path
// ---------------------------------------------------------------------------

/// FFT plans and the transformed extended signal for one FFT length.
pub(crate) struct SpectrumEntry {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    spectrum: Vec<Complex64>,
}

impl SpectrumEntry {
    fn len(&self) -> usize {
        self.spectrum.len()
    }

    /// Full circular correlation, decimated by `stride` and cut to `n` samples.
    pub(crate) fn row(
        &self,
        n: usize,
        range: TapRange,
        taps: &[Complex64],
        stride: usize,
    ) -> Vec<Complex64> {
        let len = self.len();
        let mut buffer = vec![Complex64::new(0.0, 0.0); len];
        // Reversed taps, wrapped as many times as the range requires.
        for (k, &w) in taps.iter().enumerate() {
            let tau = range.first + k as i64;
            buffer[(-tau).rem_euclid(len as i64) as usize] += w;
        }
        self.forward.process(&mut buffer);
        for (b, &x) in buffer.iter_mut().zip(self.spectrum.iter()) {
            *b *= x;
        }
        self.inverse.process(&mut buffer);

        // rustfft is unnormalized
        let norm = 1.0 / len as f64;
        buffer
            .into_iter()
            .take(n)
            .step_by(stride)
            .map(|c| c * norm)
            .collect()
    }
}

/// Spectra of the extended signal keyed by FFT length.
///
/// Built once before the parallel section and shared read-only by workers.
pub(crate) struct SpectrumCache {
    entries: HashMap<usize, SpectrumEntry>,
}

impl SpectrumCache {
    pub(crate) fn build(
        data: &[f64],
        boundary: BoundaryPolicy,
        lengths: impl IntoIterator<Item = usize>,
    ) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let mut entries = HashMap::new();
        for len in lengths {
            if let Entry::Vacant(slot) = entries.entry(len) {
                let forward = planner.plan_fft_forward(len);
                let inverse = planner.plan_fft_inverse(len);
                let mut spectrum = boundary.extend(data, len);
                forward.process(&mut spectrum);
                slot.insert(SpectrumEntry {
                    forward,
                    inverse,
                    spectrum,
                });
            }
        }
        Self { entries }
    }

    pub(crate) fn get(&self, len: usize) -> Option<&SpectrumEntry> {
        self.entries.get(&len)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

// ---------------------------------------------------------------------------
// Quadrature
// ---------------------------------------------------------------------------

/// Analytic extension `W + i·H[W]` of real rows, one FFT pair for all scales.
///
/// The row is extended like the signal it came from: periodically, by
/// half-sample reflection, or with zeros, over a period of `n` or `2n`.
pub(crate) struct HilbertPlan {
    boundary: BoundaryPolicy,
    len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl HilbertPlan {
    pub(crate) fn new(n: usize, boundary: BoundaryPolicy) -> Self {
        let len = match boundary {
            BoundaryPolicy::Periodic => n,
            BoundaryPolicy::Zero | BoundaryPolicy::Reflect => 2 * n,
        };
        let mut planner = FftPlanner::<f64>::new();
        Self {
            boundary,
            len,
            forward: planner.plan_fft_forward(len),
            inverse: planner.plan_fft_inverse(len),
        }
    }

    /// Keeps the real part of `row` and replaces the imaginary part with the
    /// Hilbert transform of the real part.
    pub(crate) fn analytic(&self, row: &[Complex64]) -> Vec<Complex64> {
        let len = self.len;
        let real = |c: &Complex64| Complex64::new(c.re, 0.0);
        let mut buffer: Vec<Complex64> = row.iter().map(real).collect();
        match self.boundary {
            BoundaryPolicy::Periodic => {}
            BoundaryPolicy::Reflect => buffer.extend(row.iter().rev().map(real)),
            BoundaryPolicy::Zero => buffer.resize(len, Complex64::new(0.0, 0.0)),
        }
        debug_assert_eq!(buffer.len(), len);

        self.forward.process(&mut buffer);
        // One-sided spectrum: DC and Nyquist kept once, positive bins doubled.
        let half = len / 2;
        for (k, value) in buffer.iter_mut().enumerate() {
            let gain = if k == 0 || (len % 2 == 0 && k == half) {
                1.0
            } else if k <= half {
                2.0
            } else {
                0.0
            };
            *value *= gain;
        }
        self.inverse.process(&mut buffer);

        let norm = 1.0 / len as f64;
        row.iter()
            .zip(buffer)
            .map(|(c, a)| Complex64::new(c.re, a.im * norm))
            .collect()
    }
}
