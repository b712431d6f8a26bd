//! Signal extension beyond its ends.

use std::fmt;
use std::str::FromStr;

use num_complex::Complex64;

use crate::error::CwtError;

/// How samples outside `0..N` are defined during analysis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BoundaryPolicy {
    /// Samples outside the signal are zero.
    #[default]
    Zero,
    /// The signal repeats with period `N`.
    Periodic,
    /// Half-sample symmetric mirror, `x[-1-k] = x[k]`, period `2N`.
    Reflect,
}

impl BoundaryPolicy {
    /// Sample at `index` of the extended signal.
    pub(crate) fn sample(self, data: &[f64], index: i64) -> f64 {
        let n = data.len() as i64;
        match self {
            Self::Zero => {
                if (0..n).contains(&index) {
                    data[index as usize]
                } else {
                    0.0
                }
            }
            Self::Periodic => data[index.rem_euclid(n) as usize],
            Self::Reflect => {
                let m = index.rem_euclid(2 * n);
                if m < n {
                    data[m as usize]
                } else {
                    data[(2 * n - 1 - m) as usize]
                }
            }
        }
    }

    /// Period of the extended signal, or `None` when it does not repeat.
    pub(crate) fn period(self, n: usize) -> Option<usize> {
        match self {
            Self::Zero => None,
            Self::Periodic => Some(n),
            Self::Reflect => Some(2 * n),
        }
    }

    /// FFT length that makes circular correlation exact for taps reaching
    /// `reach` samples away from the output index.
    pub(crate) fn fft_len(self, n: usize, reach: usize) -> usize {
        match self.period(n) {
            Some(period) => period,
            None => (n + reach).next_power_of_two(),
        }
    }

    /// One period (or the zero-padded buffer) of the extended signal.
    pub(crate) fn extend(self, data: &[f64], len: usize) -> Vec<Complex64> {
        let mut out: Vec<Complex64> = data.iter().map(|&x| Complex64::new(x, 0.0)).collect();
        match self {
            Self::Zero | Self::Periodic => {}
            Self::Reflect => out.extend(data.iter().rev().map(|&x| Complex64::new(x, 0.0))),
        }
        out.resize(len, Complex64::new(0.0, 0.0));
        out
    }
}

impl fmt::Display for BoundaryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Zero => "zero",
            Self::Periodic => "periodic",
            Self::Reflect => "reflect",
        })
    }
}

impl FromStr for BoundaryPolicy {
    type Err = CwtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zero" | "zeros" | "zero-padding" => Ok(Self::Zero),
            "periodic" | "wrap" => Ok(Self::Periodic),
            "reflect" | "symmetric" | "mirror" => Ok(Self::Reflect),
            other => Err(CwtError::InvalidParameter {
                component: "boundary".into(),
                reason: format!("unknown boundary policy {other:?}"),
            }),
        }
    }
}
