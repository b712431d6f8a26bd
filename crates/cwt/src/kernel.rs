//! Mother wavelets and their scaled daughters.
//!
//! A [`WaveletKernel`] bundles a [`WaveletFamily`] with everything derived from
//! it once at construction: the effective time support, the spectral peak, and
//! the reconstruction constant used by synthesis. Kernels are immutable and
//! share their state through an `Arc`, so cloning one into every worker is
//! cheap.
//!
//! All built-in families are normalised to a spectral peak at `ξ_c = 2π`, which
//! makes the Fourier period of scale `s` equal to `s` samples.
//!
//! | Family | Shape | Parameter range |
//! |--------|-------|-----------------|
//! | [`WaveletFamily::Morlet`] | zero-mean corrected complex Gaussian wave packet | `0 < dff <= 20` |
//! | [`WaveletFamily::Cauchy`] | Cauchy (Paul) analytic wavelet | `0 < alpha <= 200` |
//! | [`WaveletFamily::DerivativeOfGaussian`] | even derivative of a Gaussian | even `order` in `2..=20` |
//! | [`WaveletFamily::Sampled`] | user samples, linearly interpolated | `>= 4` samples, near-zero mean |

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use num_complex::Complex64;
use statrs::function::gamma::ln_gamma;
use tracing::debug;

use crate::error::CwtError;

/// Relative magnitude below which a kernel is treated as zero.
pub const SUPPORT_EPS: f64 = 1e-8;

/// Default Morlet bandwidth parameter.
pub const DEFAULT_MORLET_DFF: f64 = 2.0;
/// Default Cauchy order.
pub const DEFAULT_CAUCHY_ALPHA: f64 = 2.0;
/// Default derivative-of-Gaussian order (Mexican hat).
pub const DEFAULT_DOG_ORDER: u32 = 2;

const TWO_PI: f64 = 2.0 * PI;
const MAX_MORLET_DFF: f64 = 20.0;
const MAX_CAUCHY_ALPHA: f64 = 200.0;
const MAX_DOG_ORDER: u32 = 20;
const MIN_SAMPLED_LEN: usize = 4;
const SAMPLED_MEAN_TOL: f64 = 1e-2;

/// Largest step of the trapezoid rule in `ln ξ`.
const LOG_FREQ_STEP: f64 = 4e-3;
/// Lower limit of the half-line integrals, relative to `|ξ_c|`.
const LOG_FREQ_FLOOR: f64 = 1e-9;
/// `|K₋| / |K₊|` below which a kernel counts as analytic.
const ANALYTIC_TOL: f64 = 1e-3;

// ---------------------------------------------------------------------------
// WaveletFamily
// ---------------------------------------------------------------------------

/// Family selector and parameters of a mother wavelet.
///
/// Two kernels are interchangeable exactly when their families compare equal;
/// coefficient grids record the family to detect mismatched synthesis.
#[derive(Clone, Debug, PartialEq)]
pub enum WaveletFamily {
    /// Morlet wavelet with bandwidth parameter `dff` (δ).
    Morlet {
        /// Gaussian width parameter δ; larger values give shorter wavelets.
        dff: f64,
    },
    /// Cauchy (Paul) wavelet of order `alpha`.
    Cauchy {
        /// Order α; larger values give longer, narrower-band wavelets.
        alpha: f64,
    },
    /// Derivative of a Gaussian; order 2 is the Mexican hat.
    DerivativeOfGaussian {
        /// Even derivative order.
        order: u32,
    },
    /// A user-supplied shape sampled at `t0 + k·dt`.
    Sampled {
        /// Identifier recorded with coefficient grids.
        name: String,
        /// Time of the first sample.
        t0: f64,
        /// Sample spacing.
        dt: f64,
        /// Complex samples.
        values: Arc<[Complex64]>,
    },
}

impl WaveletFamily {
    /// Returns the short family tag used in text forms.
    pub fn tag(&self) -> &str {
        match self {
            Self::Morlet { .. } => "morlet",
            Self::Cauchy { .. } => "cauchy",
            Self::DerivativeOfGaussian { .. } => "dog",
            Self::Sampled { .. } => "sampled",
        }
    }

    /// `true` when the mother wavelet takes only real values.
    pub fn is_real(&self) -> bool {
        match self {
            Self::Morlet { .. } | Self::Cauchy { .. } => false,
            Self::DerivativeOfGaussian { .. } => true,
            Self::Sampled { values, .. } => values.iter().all(|v| v.im == 0.0),
        }
    }
}

impl Default for WaveletFamily {
    fn default() -> Self {
        Self::Morlet {
            dff: DEFAULT_MORLET_DFF,
        }
    }
}

impl fmt::Display for WaveletFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Morlet { dff } => write!(f, "morlet(dff={dff})"),
            Self::Cauchy { alpha } => write!(f, "cauchy(alpha={alpha})"),
            Self::DerivativeOfGaussian { order } => write!(f, "dog(order={order})"),
            Self::Sampled { name, values, .. } => {
                write!(f, "sampled({name}, {} samples)", values.len())
            }
        }
    }
}

impl FromStr for WaveletFamily {
    type Err = CwtError;

    /// Parses `name[:parameter]`, e.g. `"morlet"`, `"morlet:1.5"`,
    /// `"cauchy:16"`, `"dog:4"` or `"mexican-hat"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let (name, param) = match lower.split_once(':') {
            Some((name, param)) => (name.trim(), Some(param.trim())),
            None => (lower.as_str(), None),
        };
        let bad_number = |p: &str| CwtError::InvalidParameter {
            component: name.to_string(),
            reason: format!("cannot parse {p:?} as a number"),
        };

        match name {
            "morlet" => {
                let dff = match param {
                    Some(p) => p.parse::<f64>().map_err(|_| bad_number(p))?,
                    None => DEFAULT_MORLET_DFF,
                };
                Ok(Self::Morlet { dff })
            }
            "cauchy" | "paul" => {
                let alpha = match param {
                    Some(p) => p.parse::<f64>().map_err(|_| bad_number(p))?,
                    None => DEFAULT_CAUCHY_ALPHA,
                };
                Ok(Self::Cauchy { alpha })
            }
            "dog" | "derivative-of-gaussian" => {
                let order = match param {
                    Some(p) => p.parse::<u32>().map_err(|_| bad_number(p))?,
                    None => DEFAULT_DOG_ORDER,
                };
                Ok(Self::DerivativeOfGaussian { order })
            }
            "mexican-hat" | "mexhat" | "ricker" => match param {
                None => Ok(Self::DerivativeOfGaussian {
                    order: DEFAULT_DOG_ORDER,
                }),
                Some(p) => Err(CwtError::InvalidParameter {
                    component: name.to_string(),
                    reason: format!("takes no parameter, got {p:?}"),
                }),
            },
            "sampled" => Err(CwtError::InvalidParameter {
                component: "sampled".into(),
                reason: "sampled kernels are built from values, not text".into(),
            }),
            other => Err(CwtError::InvalidParameter {
                component: other.to_string(),
                reason: "unknown wavelet family".into(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Shape: per-family evaluation with precomputed constants
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Shape {
    Morlet {
        dff: f64,
        norm: f64,
        offset: f64,
    },
    Cauchy {
        alpha: f64,
        ln_spectrum_norm: f64,
    },
    Dog {
        order: u32,
        a: f64,
        signed_norm: f64,
        ln_spectrum_norm: f64,
    },
    Sampled {
        t0: f64,
        dt: f64,
        values: Arc<[Complex64]>,
    },
}

fn invalid(component: &str, reason: String) -> CwtError {
    CwtError::InvalidParameter {
        component: component.to_string(),
        reason,
    }
}

impl Shape {
    fn from_family(family: &WaveletFamily) -> Result<Self, CwtError> {
        match family {
            WaveletFamily::Morlet { dff } => {
                let dff = *dff;
                if !(dff.is_finite() && dff > 0.0 && dff <= MAX_MORLET_DFF) {
                    return Err(invalid(
                        "morlet",
                        format!("dff must be in (0, {MAX_MORLET_DFF}], got {dff}"),
                    ));
                }
                Ok(Self::Morlet {
                    dff,
                    norm: (dff / TWO_PI).sqrt(),
                    offset: (-2.0 * PI * PI / dff).exp(),
                })
            }
            WaveletFamily::Cauchy { alpha } => {
                let alpha = *alpha;
                if !(alpha.is_finite() && alpha > 0.0 && alpha <= MAX_CAUCHY_ALPHA) {
                    return Err(invalid(
                        "cauchy",
                        format!("alpha must be in (0, {MAX_CAUCHY_ALPHA}], got {alpha}"),
                    ));
                }
                let ln_spectrum_norm =
                    TWO_PI.ln() - ln_gamma(1.0 + alpha) + (1.0 + alpha) * (alpha / TWO_PI).ln();
                Ok(Self::Cauchy {
                    alpha,
                    ln_spectrum_norm,
                })
            }
            WaveletFamily::DerivativeOfGaussian { order } => {
                let order = *order;
                if order < 2 || order > MAX_DOG_ORDER || order % 2 != 0 {
                    return Err(invalid(
                        "dog",
                        format!("order must be even and in 2..={MAX_DOG_ORDER}, got {order}"),
                    ));
                }
                let m = f64::from(order);
                let a = TWO_PI / m.sqrt();
                // Normalises the spectral peak at ξ = 2π to one.
                let ln_spectrum_norm = -0.5 * m * m.ln() + 0.5 * m;
                let ln_norm = a.ln() - 0.5 * TWO_PI.ln() + ln_spectrum_norm;
                let sign = if (order / 2) % 2 == 0 { 1.0 } else { -1.0 };
                Ok(Self::Dog {
                    order,
                    a,
                    signed_norm: sign * ln_norm.exp(),
                    ln_spectrum_norm,
                })
            }
            WaveletFamily::Sampled {
                name,
                t0,
                dt,
                values,
            } => {
                if name.trim().is_empty() {
                    return Err(invalid("sampled", "name must not be empty".into()));
                }
                if values.len() < MIN_SAMPLED_LEN {
                    return Err(invalid(
                        "sampled",
                        format!(
                            "need at least {MIN_SAMPLED_LEN} samples, got {}",
                            values.len()
                        ),
                    ));
                }
                if !(t0.is_finite() && dt.is_finite() && *dt > 0.0) {
                    return Err(invalid(
                        "sampled",
                        format!("t0 must be finite and dt positive, got t0={t0}, dt={dt}"),
                    ));
                }
                if let Some(i) = values.iter().position(|v| !v.is_finite()) {
                    return Err(invalid("sampled", format!("sample {i} is not finite")));
                }
                let total: f64 = values.iter().map(|v| v.norm()).sum();
                let mean: Complex64 = values.iter().sum();
                if total == 0.0 {
                    return Err(invalid("sampled", "all samples are zero".into()));
                }
                if mean.norm() > SAMPLED_MEAN_TOL * total {
                    return Err(invalid(
                        "sampled",
                        format!(
                            "shape is not admissible: |sum| = {:.3e} exceeds {SAMPLED_MEAN_TOL} * sum|v| = {:.3e}",
                            mean.norm(),
                            SAMPLED_MEAN_TOL * total
                        ),
                    ));
                }
                Ok(Self::Sampled {
                    t0: *t0,
                    dt: *dt,
                    values: Arc::clone(values),
                })
            }
        }
    }

    fn mother(&self, t: f64) -> Complex64 {
        match *self {
            Self::Morlet { dff, norm, offset } => {
                let envelope = norm * (-0.5 * dff * t * t).exp();
                (Complex64::from_polar(1.0, TWO_PI * t) - offset) * envelope
            }
            Self::Cauchy { alpha, .. } => {
                Complex64::new(1.0, -TWO_PI * t / alpha).powf(-(1.0 + alpha))
            }
            Self::Dog {
                order,
                a,
                signed_norm,
                ..
            } => {
                let x = a * t;
                Complex64::from(signed_norm * hermite_e(order, x) * (-0.5 * x * x).exp())
            }
            Self::Sampled { t0, dt, ref values } => {
                let pos = (t - t0) / dt;
                let n = values.len() as f64;
                if pos <= -1.0 || pos >= n {
                    return Complex64::new(0.0, 0.0);
                }
                let i = pos.floor();
                let frac = pos - i;
                let at = |k: f64| {
                    if k < 0.0 || k >= n {
                        Complex64::new(0.0, 0.0)
                    } else {
                        values[k as usize]
                    }
                };
                at(i) * (1.0 - frac) + at(i + 1.0) * frac
            }
        }
    }

    fn spectrum(&self, xi: f64) -> Complex64 {
        match *self {
            Self::Morlet { dff, offset, .. } => {
                let shifted = xi - TWO_PI;
                let value = (-shifted * shifted / (2.0 * dff)).exp()
                    - offset * (-xi * xi / (2.0 * dff)).exp();
                Complex64::from(value)
            }
            Self::Cauchy {
                alpha,
                ln_spectrum_norm,
            } => {
                if xi <= 0.0 {
                    return Complex64::new(0.0, 0.0);
                }
                Complex64::from((ln_spectrum_norm + alpha * xi.ln() - alpha * xi / TWO_PI).exp())
            }
            Self::Dog {
                order,
                a,
                ln_spectrum_norm,
                ..
            } => {
                if xi == 0.0 {
                    return Complex64::new(0.0, 0.0);
                }
                let y2 = (xi / a) * (xi / a);
                let m = f64::from(order);
                Complex64::from((ln_spectrum_norm + 0.5 * m * y2.ln() - 0.5 * y2).exp())
            }
            Self::Sampled { t0, dt, ref values } => {
                // Exact transform of the piecewise-linear interpolant: a sum of
                // hat functions, each contributing dt * sinc²(ξ dt / 2).
                let half = 0.5 * xi * dt;
                let hat = if half == 0.0 {
                    1.0
                } else {
                    (half.sin() / half).powi(2)
                };
                let step = Complex64::from_polar(1.0, -xi * dt);
                let mut phase = Complex64::from_polar(1.0, -xi * t0);
                let mut acc = Complex64::new(0.0, 0.0);
                for &v in values.iter() {
                    acc += v * phase;
                    phase *= step;
                }
                acc * (dt * hat)
            }
        }
    }

    /// Interval outside which `|ψ| < SUPPORT_EPS · max|ψ|`.
    fn support(&self) -> (f64, f64) {
        let ln_inv_eps = (1.0 / SUPPORT_EPS).ln();
        match *self {
            Self::Morlet { dff, offset, .. } => {
                let slack = ((1.0 + offset) / (1.0 - offset)).ln();
                let half = (2.0 * (ln_inv_eps + slack) / dff).sqrt();
                (-half, half)
            }
            Self::Cauchy { alpha, .. } => {
                let half = alpha / TWO_PI
                    * (SUPPORT_EPS.powf(-2.0 / (1.0 + alpha)) - 1.0).max(0.0).sqrt();
                (-half, half)
            }
            Self::Dog { order, a, .. } => {
                // Outer root of x^m e^{-x²/2} = eps by fixed-point iteration.
                let m = f64::from(order);
                let mut x = (2.0 * ln_inv_eps).sqrt();
                for _ in 0..50 {
                    x = (2.0 * (ln_inv_eps + m * x.max(1.0).ln())).sqrt();
                }
                (-x / a, x / a)
            }
            Self::Sampled { t0, dt, ref values } => (t0 - dt, t0 + values.len() as f64 * dt),
        }
    }

    fn center_frequency(&self) -> Result<f64, CwtError> {
        match *self {
            Self::Sampled { dt, .. } => self.sampled_peak(PI / dt),
            _ => Ok(TWO_PI),
        }
    }

    /// Locates the spectral magnitude peak of a sampled shape in `[-limit, limit]`.
    fn sampled_peak(&self, limit: f64) -> Result<f64, CwtError> {
        const COARSE: usize = 2048;
        const FINE: usize = 256;

        let step = 2.0 * limit / COARSE as f64;
        let mut best = (0.0, 0.0);
        for k in 0..=COARSE {
            let xi = -limit + k as f64 * step;
            let magnitude = self.spectrum(xi).norm();
            if magnitude > best.1 {
                best = (xi, magnitude);
            }
        }
        let centre = best.0;
        let fine_step = 2.0 * step / FINE as f64;
        for k in 0..=FINE {
            let xi = centre - step + k as f64 * fine_step;
            let magnitude = self.spectrum(xi).norm();
            if magnitude > best.1 {
                best = (xi, magnitude);
            }
        }
        if best.1 <= 0.0 || best.0 == 0.0 {
            return Err(invalid(
                "sampled",
                "shape has no spectral peak away from zero frequency".into(),
            ));
        }
        Ok(best.0)
    }

    /// Half-line integrals `K± = ∫₀^∞ ψ̂(±ξ) dξ/ξ`.
    fn half_line_integrals(&self, center: f64) -> (Complex64, Complex64) {
        match *self {
            // 2π c Γ(α)/Γ(1+α) with c = α/2π, which is exactly one.
            Self::Cauchy { .. } => (Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)),
            Self::Dog { order, .. } => {
                let k = Complex64::from(dog_half_line_integral(order));
                (k, k)
            }
            _ => self.half_line_quadrature(center),
        }
    }

    fn half_line_quadrature(&self, center: f64) -> (Complex64, Complex64) {
        let (upper, step) = match *self {
            Self::Morlet { dff, .. } => {
                let reach = (2.0 * dff * (1.0 / SUPPORT_EPS).ln()).sqrt();
                let width = dff.sqrt() / TWO_PI;
                (TWO_PI + reach, LOG_FREQ_STEP.min(0.25 * width))
            }
            Self::Sampled { dt, ref values, .. } => {
                let duration = values.len() as f64 * dt;
                let width = TWO_PI / (duration * center.abs());
                (PI / dt, LOG_FREQ_STEP.min(0.25 * width))
            }
            // The spectral tail y^m e^{-y²/2} has the same root as the time tail.
            Self::Dog { a, .. } => (a * a * self.support().1, LOG_FREQ_STEP),
            Self::Cauchy { alpha, .. } => (TWO_PI * (1.0 + 40.0 / alpha), LOG_FREQ_STEP),
        };
        let lower = LOG_FREQ_FLOOR * center.abs();
        let positive = log_trapezoid(|xi| self.spectrum(xi), lower, upper, step);
        let negative = log_trapezoid(|xi| self.spectrum(-xi), lower, upper, step);
        (positive, negative)
    }
}

/// Probabilists' Hermite polynomial `He_m(x)` by the three-term recurrence.
fn hermite_e(order: u32, x: f64) -> f64 {
    let mut prev = 1.0;
    if order == 0 {
        return prev;
    }
    let mut curr = x;
    for n in 1..order {
        let next = x * curr - f64::from(n) * prev;
        prev = curr;
        curr = next;
    }
    curr
}

/// `∫₀^∞ ψ̂(ξ) dξ/ξ` for the derivative of Gaussian of even order `m`:
/// `2^{m/2-1} Γ(m/2) e^{m/2} / m^{m/2}`.
fn dog_half_line_integral(order: u32) -> f64 {
    let m = f64::from(order);
    let half = 0.5 * m;
    ((half - 1.0) * 2f64.ln() + ln_gamma(half) + half - half * m.ln()).exp()
}

/// Trapezoid rule for `∫_lo^hi f(ξ) dξ/ξ`, evaluated in `u = ln ξ`.
fn log_trapezoid(f: impl Fn(f64) -> Complex64, lo: f64, hi: f64, max_step: f64) -> Complex64 {
    let (a, b) = (lo.ln(), hi.ln());
    if b <= a {
        return Complex64::new(0.0, 0.0);
    }
    let n = ((b - a) / max_step).ceil().max(1.0) as usize;
    let h = (b - a) / n as f64;
    let mut acc = Complex64::new(0.0, 0.0);
    for k in 0..=n {
        let weight = if k == 0 || k == n { 0.5 } else { 1.0 };
        acc += f((a + k as f64 * h).exp()) * weight;
    }
    acc * h
}

// ---------------------------------------------------------------------------
// WaveletKernel
// ---------------------------------------------------------------------------

/// An immutable, validated mother wavelet.
///
/// # Example
///
/// ```ignore
/// use cwtlab_cwt::{WaveletFamily, WaveletKernel};
///
/// let kernel = WaveletKernel::new(WaveletFamily::Morlet { dff: 2.0 })?;
/// let daughter = kernel.evaluate(3.0, 16.0);
/// assert!((kernel.fourier_period(16.0) - 16.0).abs() < 1e-12);
/// ```
#[derive(Clone, Debug)]
pub struct WaveletKernel {
    inner: Arc<KernelInner>,
}

#[derive(Debug)]
struct KernelInner {
    family: WaveletFamily,
    shape: Shape,
    support: (f64, f64),
    center_frequency: f64,
    admissibility: Complex64,
    analytic: bool,
}

impl WaveletKernel {
    /// Validates `family` and precomputes support, peak frequency and the
    /// reconstruction constant.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`CwtError::InvalidParameter`] | parameter outside the family's range, or the shape is not admissible |
    pub fn new(family: WaveletFamily) -> Result<Self, CwtError> {
        let shape = Shape::from_family(&family)?;
        let support = shape.support();
        let center_frequency = shape.center_frequency()?;
        let (k_pos, k_neg) = shape.half_line_integrals(center_frequency);
        let admissibility = (k_pos + k_neg) * 0.5;
        if !(admissibility.is_finite() && admissibility.norm() > 1e-12) {
            return Err(invalid(
                family.tag(),
                format!("reconstruction constant {admissibility} is degenerate"),
            ));
        }
        let analytic = k_neg.norm() <= ANALYTIC_TOL * k_pos.norm();
        debug!(
            family = %family,
            support_lo = support.0,
            support_hi = support.1,
            center_frequency,
            admissibility = %admissibility,
            analytic,
            "kernel constructed"
        );
        Ok(Self {
            inner: Arc::new(KernelInner {
                family,
                shape,
                support,
                center_frequency,
                admissibility,
                analytic,
            }),
        })
    }

    /// Morlet kernel with bandwidth parameter `dff`.
    pub fn morlet(dff: f64) -> Result<Self, CwtError> {
        Self::new(WaveletFamily::Morlet { dff })
    }

    /// Cauchy (Paul) kernel of order `alpha`.
    pub fn cauchy(alpha: f64) -> Result<Self, CwtError> {
        Self::new(WaveletFamily::Cauchy { alpha })
    }

    /// Derivative-of-Gaussian kernel of even `order`.
    pub fn derivative_of_gaussian(order: u32) -> Result<Self, CwtError> {
        Self::new(WaveletFamily::DerivativeOfGaussian { order })
    }

    /// Kernel from complex samples at `t0 + k·dt`.
    pub fn sampled(
        name: impl Into<String>,
        t0: f64,
        dt: f64,
        values: Vec<Complex64>,
    ) -> Result<Self, CwtError> {
        Self::new(WaveletFamily::Sampled {
            name: name.into(),
            t0,
            dt,
            values: values.into(),
        })
    }

    /// Family and parameters this kernel was built from.
    pub fn family(&self) -> &WaveletFamily {
        &self.inner.family
    }

    /// Daughter wavelet `ψ(t/scale)/√scale`.
    pub fn evaluate(&self, t: f64, scale: f64) -> Complex64 {
        self.inner.shape.mother(t / scale) / scale.sqrt()
    }

    /// Mother wavelet `ψ(t)`.
    pub fn mother(&self, t: f64) -> Complex64 {
        self.inner.shape.mother(t)
    }

    /// Fourier transform `ψ̂(ξ) = ∫ψ(t)e^{-iξt}dt`.
    pub fn spectrum(&self, xi: f64) -> Complex64 {
        self.inner.shape.spectrum(xi)
    }

    /// Effective support `(lo, hi)` of the mother wavelet; outside it
    /// `|ψ| < SUPPORT_EPS · max|ψ|`.
    pub fn support(&self) -> (f64, f64) {
        self.inner.support
    }

    /// Reconstruction constant `C = (K₊ + K₋)/2` with `K± = ∫₀^∞ ψ̂(±ξ) dξ/ξ`.
    pub fn admissibility(&self) -> Complex64 {
        self.inner.admissibility
    }

    /// Angular frequency of the spectral peak (2π for built-in families).
    pub fn center_frequency(&self) -> f64 {
        self.inner.center_frequency
    }

    /// Fourier period of `scale`, in samples.
    pub fn fourier_period(&self, scale: f64) -> f64 {
        TWO_PI * scale / self.inner.center_frequency.abs()
    }

    /// Whether the spectrum is negligible at negative frequencies.
    ///
    /// Rows of analytic kernels oscillate at a single frequency per scale, so
    /// synthesis demodulates them before interpolating subsampled rows.
    pub fn is_analytic(&self) -> bool {
        self.inner.analytic
    }

    /// Whether the mother wavelet is real-valued. See [`WaveletFamily::is_real`].
    pub fn is_real(&self) -> bool {
        self.inner.family.is_real()
    }
}

impl FromStr for WaveletKernel {
    type Err = CwtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    /// Trapezoid Fourier transform of the mother wavelet over its support.
    fn numeric_spectrum(kernel: &WaveletKernel, xi: f64, dt: f64) -> Complex64 {
        let (lo, hi) = kernel.support();
        let n = ((hi - lo) / dt).ceil() as usize;
        let mut acc = Complex64::new(0.0, 0.0);
        for k in 0..=n {
            let t = lo + k as f64 * dt;
            acc += kernel.mother(t) * Complex64::from_polar(1.0, -xi * t);
        }
        acc * dt
    }

    #[test]
    fn default_family_is_morlet() {
        assert_eq!(WaveletFamily::default(), WaveletFamily::Morlet { dff: 2.0 });
    }

    #[test]
    fn parse_families() {
        assert_eq!(
            "morlet".parse::<WaveletFamily>().unwrap(),
            WaveletFamily::Morlet { dff: 2.0 }
        );
        assert_eq!(
            "Morlet:1.5".parse::<WaveletFamily>().unwrap(),
            WaveletFamily::Morlet { dff: 1.5 }
        );
        assert_eq!(
            "cauchy:16".parse::<WaveletFamily>().unwrap(),
            WaveletFamily::Cauchy { alpha: 16.0 }
        );
        assert_eq!(
            "paul".parse::<WaveletFamily>().unwrap(),
            WaveletFamily::Cauchy { alpha: 2.0 }
        );
        assert_eq!(
            " dog:4 ".parse::<WaveletFamily>().unwrap(),
            WaveletFamily::DerivativeOfGaussian { order: 4 }
        );
        assert_eq!(
            "mexican-hat".parse::<WaveletFamily>().unwrap(),
            WaveletFamily::DerivativeOfGaussian { order: 2 }
        );
    }

    #[test]
    fn parse_rejects_unknown_and_malformed() {
        for text in ["haar", "morlet:abc", "dog:2.5", "mexican-hat:3", "sampled"] {
            let err = text.parse::<WaveletFamily>().unwrap_err();
            assert!(
                matches!(err, CwtError::InvalidParameter { .. }),
                "{text}: {err}"
            );
        }
    }

    #[test]
    fn display_round_trips_through_tags() {
        let family = WaveletFamily::Cauchy { alpha: 16.0 };
        assert_eq!(family.to_string(), "cauchy(alpha=16)");
        assert_eq!(family.tag(), "cauchy");
        assert_eq!(
            WaveletFamily::DerivativeOfGaussian { order: 4 }.to_string(),
            "dog(order=4)"
        );
    }

    #[test]
    fn invalid_parameters_rejected() {
        let bad = [
            WaveletFamily::Morlet { dff: 0.0 },
            WaveletFamily::Morlet { dff: -1.0 },
            WaveletFamily::Morlet { dff: 25.0 },
            WaveletFamily::Morlet { dff: f64::NAN },
            WaveletFamily::Cauchy { alpha: 0.0 },
            WaveletFamily::Cauchy { alpha: 300.0 },
            WaveletFamily::DerivativeOfGaussian { order: 0 },
            WaveletFamily::DerivativeOfGaussian { order: 3 },
            WaveletFamily::DerivativeOfGaussian { order: 22 },
        ];
        for family in bad {
            let err = WaveletKernel::new(family.clone()).unwrap_err();
            assert!(
                matches!(err, CwtError::InvalidParameter { .. }),
                "{family}: {err}"
            );
        }
    }

    #[test]
    fn evaluate_is_scaled_mother() {
        let kernel = WaveletKernel::morlet(2.0).unwrap();
        let (t, s) = (3.0, 4.0);
        let expected = kernel.mother(t / s) / s.sqrt();
        let got = kernel.evaluate(t, s);
        assert_abs_diff_eq!(got.re, expected.re, epsilon = 1e-15);
        assert_abs_diff_eq!(got.im, expected.im, epsilon = 1e-15);
    }

    #[test]
    fn morlet_value_at_origin() {
        let dff = 2.0;
        let kernel = WaveletKernel::morlet(dff).unwrap();
        let expected = (dff / TWO_PI).sqrt() * (1.0 - (-2.0 * PI * PI / dff).exp());
        let got = kernel.mother(0.0);
        assert_relative_eq!(got.re, expected, max_relative = 1e-12);
        assert_abs_diff_eq!(got.im, 0.0, epsilon = 1e-15);
    }

    #[test]
    fn spectra_match_numeric_transform() {
        let kernels = [
            WaveletKernel::morlet(2.0).unwrap(),
            WaveletKernel::cauchy(16.0).unwrap(),
            WaveletKernel::derivative_of_gaussian(2).unwrap(),
            WaveletKernel::derivative_of_gaussian(4).unwrap(),
        ];
        for kernel in &kernels {
            for xi in [0.5 * TWO_PI, TWO_PI, 1.5 * TWO_PI] {
                let analytic = kernel.spectrum(xi);
                let numeric = numeric_spectrum(kernel, xi, 1e-3);
                assert!(
                    (analytic - numeric).norm() < 1e-6,
                    "{}: xi = {xi}, analytic {analytic}, numeric {numeric}",
                    kernel.family()
                );
            }
        }
    }

    #[test]
    fn built_in_spectra_peak_at_two_pi() {
        for kernel in [
            WaveletKernel::morlet(1.0).unwrap(),
            WaveletKernel::cauchy(2.0).unwrap(),
            WaveletKernel::derivative_of_gaussian(6).unwrap(),
        ] {
            assert_relative_eq!(kernel.center_frequency(), TWO_PI);
            let peak = kernel.spectrum(TWO_PI).norm();
            assert!(kernel.spectrum(0.99 * TWO_PI).norm() < peak);
            assert!(kernel.spectrum(1.01 * TWO_PI).norm() < peak);
            assert_relative_eq!(kernel.fourier_period(16.0), 16.0, max_relative = 1e-12);
        }
    }

    #[test]
    fn morlet_and_dog_spectra_have_unit_peak() {
        let morlet = WaveletKernel::morlet(1.0).unwrap();
        let dog = WaveletKernel::derivative_of_gaussian(4).unwrap();
        assert_relative_eq!(morlet.spectrum(TWO_PI).re, 1.0, max_relative = 1e-12);
        assert_relative_eq!(dog.spectrum(TWO_PI).re, 1.0, max_relative = 1e-12);
    }

    #[test]
    fn built_in_spectra_vanish_at_zero() {
        for kernel in [
            WaveletKernel::morlet(2.0).unwrap(),
            WaveletKernel::cauchy(2.0).unwrap(),
            WaveletKernel::derivative_of_gaussian(2).unwrap(),
        ] {
            assert_abs_diff_eq!(kernel.spectrum(0.0).norm(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn support_bounds_the_mother_wavelet() {
        for kernel in [
            WaveletKernel::morlet(2.0).unwrap(),
            WaveletKernel::cauchy(16.0).unwrap(),
            WaveletKernel::derivative_of_gaussian(2).unwrap(),
        ] {
            let (lo, hi) = kernel.support();
            assert!(lo < 0.0 && hi > 0.0);
            let peak = kernel.mother(0.0).norm();
            for t in [lo * 1.01, hi * 1.01, hi * 2.0] {
                assert!(
                    kernel.mother(t).norm() < SUPPORT_EPS * peak,
                    "{}: |psi({t})| too large",
                    kernel.family()
                );
            }
        }
    }

    #[test]
    fn cauchy_admissibility_is_one_half() {
        let kernel = WaveletKernel::cauchy(16.0).unwrap();
        assert_relative_eq!(kernel.admissibility().re, 0.5);
        assert_abs_diff_eq!(kernel.admissibility().im, 0.0);
        assert!(kernel.is_analytic());
    }

    #[test]
    fn dog_closed_form_matches_quadrature() {
        for order in [2, 4, 8] {
            let shape = Shape::from_family(&WaveletFamily::DerivativeOfGaussian { order }).unwrap();
            let (pos, neg) = shape.half_line_quadrature(TWO_PI);
            let closed = dog_half_line_integral(order);
            assert_relative_eq!(pos.re, closed, max_relative = 1e-6);
            assert_relative_eq!(neg.re, closed, max_relative = 1e-6);
        }
        assert!(!WaveletKernel::derivative_of_gaussian(2).unwrap().is_analytic());
    }

    #[test]
    fn morlet_admissibility_is_real_and_positive() {
        let kernel = WaveletKernel::morlet(1.0).unwrap();
        let c = kernel.admissibility();
        assert!(c.re > 0.0);
        assert_abs_diff_eq!(c.im, 0.0, epsilon = 1e-15);
        assert!(kernel.is_analytic());
    }

    #[test]
    fn hermite_recurrence() {
        let x = 0.7;
        assert_relative_eq!(hermite_e(0, x), 1.0);
        assert_relative_eq!(hermite_e(1, x), x);
        assert_relative_eq!(hermite_e(2, x), x * x - 1.0);
        assert_relative_eq!(hermite_e(4, x), x.powi(4) - 6.0 * x * x + 3.0, max_relative = 1e-12);
    }

    fn sampled_mexican_hat() -> (WaveletKernel, WaveletKernel) {
        let reference = WaveletKernel::derivative_of_gaussian(2).unwrap();
        let (t0, dt) = (-1.6, 0.004);
        let values: Vec<Complex64> = (0..=800)
            .map(|k| reference.mother(t0 + k as f64 * dt))
            .collect();
        let sampled = WaveletKernel::sampled("mexican-hat-samples", t0, dt, values).unwrap();
        (reference, sampled)
    }

    #[test]
    fn sampled_kernel_reproduces_nodes() {
        let (reference, sampled) = sampled_mexican_hat();
        for k in [0, 100, 400, 650, 800] {
            let t = -1.6 + k as f64 * 0.004;
            assert_abs_diff_eq!(sampled.mother(t).re, reference.mother(t).re, epsilon = 1e-9);
        }
        assert_eq!(sampled.mother(5.0), Complex64::new(0.0, 0.0));
        assert_eq!(sampled.mother(-5.0), Complex64::new(0.0, 0.0));
    }

    #[test]
    fn sampled_kernel_derives_peak_and_constant() {
        let (reference, sampled) = sampled_mexican_hat();
        assert_relative_eq!(
            sampled.center_frequency().abs(),
            TWO_PI,
            max_relative = 1e-2
        );
        assert_relative_eq!(
            sampled.admissibility().re,
            reference.admissibility().re,
            max_relative = 1e-3
        );
        assert!(!sampled.is_analytic());
    }

    #[test]
    fn real_valued_families() {
        assert!(WaveletKernel::derivative_of_gaussian(4).unwrap().is_real());
        assert!(!WaveletKernel::morlet(2.0).unwrap().is_real());
        assert!(!WaveletKernel::cauchy(8.0).unwrap().is_real());
        let (_, sampled) = sampled_mexican_hat();
        assert!(sampled.is_real());
        let complex = WaveletKernel::sampled(
            "complex",
            0.0,
            1.0,
            vec![
                Complex64::new(-1.0, 0.5),
                Complex64::new(1.0, 0.0),
                Complex64::new(1.0, -0.5),
                Complex64::new(-1.0, 0.0),
            ],
        )
        .unwrap();
        assert!(!complex.is_real());
    }

    #[test]
    fn sampled_kernel_validation() {
        let ok_shape = vec![
            Complex64::new(-1.0, 0.0),
            Complex64::new(1.0, 0.0),
            Complex64::new(1.0, 0.0),
            Complex64::new(-1.0, 0.0),
        ];
        assert!(WaveletKernel::sampled("box", -2.0, 1.0, ok_shape.clone()).is_ok());

        let too_short = ok_shape[..3].to_vec();
        let biased = vec![Complex64::new(1.0, 0.0); 8];
        let cases = [
            WaveletKernel::sampled("short", 0.0, 1.0, too_short),
            WaveletKernel::sampled("biased", 0.0, 1.0, biased),
            WaveletKernel::sampled("", 0.0, 1.0, ok_shape.clone()),
            WaveletKernel::sampled("bad-dt", 0.0, 0.0, ok_shape),
        ];
        for result in cases {
            assert!(matches!(result, Err(CwtError::InvalidParameter { .. })));
        }
    }

    #[test]
    fn kernel_parses_from_text() {
        let kernel: WaveletKernel = "cauchy:16".parse().unwrap();
        assert_eq!(kernel.family(), &WaveletFamily::Cauchy { alpha: 16.0 });
    }

    #[test]
    fn clones_share_state() {
        let kernel = WaveletKernel::morlet(2.0).unwrap();
        let clone = kernel.clone();
        assert!(Arc::ptr_eq(&kernel.inner, &clone.inner));
    }

    #[test]
    fn kernel_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<WaveletKernel>();
        assert_impl::<WaveletFamily>();
    }
}
