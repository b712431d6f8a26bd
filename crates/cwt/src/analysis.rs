//! Forward continuous wavelet transform.
//!
//! Rows are computed from a copy of the signal scaled by a power of two so
//! that its peak magnitude is near one, and scaled back afterwards. Scaling
//! by a power of two is exact, so results only differ from an unscaled run
//! where the unscaled run would have overflowed, and the direct and FFT
//! paths overflow at the same coefficients.

use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};

use num_complex::Complex64;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::boundary::BoundaryPolicy;
use crate::cancel::CancelToken;
use crate::convolution::{
    ConvolutionStrategy, HilbertPlan, SpectrumCache, TapRange, direct_row,
};
use crate::error::CwtError;
use crate::grid::CoefficientGrid;
use crate::kernel::WaveletKernel;
use crate::scales::ScaleSet;
use crate::signal::Signal;

/// Forward transform engine for a fixed kernel and scale set.
///
/// Each scale produces one row of the [`CoefficientGrid`]. Rows are
/// independent and computed in parallel on the rayon pool unless
/// [`with_parallel(false)`](Self::with_parallel) is set; the result is
/// bit-identical either way.
///
/// # Example
///
/// ```ignore
/// use cwtlab_cwt::{AnalysisEngine, BoundaryPolicy, ScaleSet, Signal, WaveletKernel};
///
/// let kernel = WaveletKernel::morlet(2.0)?;
/// let scales = ScaleSet::from_range(32, 2.0, 2f64.powf(0.25))?;
/// let engine = AnalysisEngine::new(kernel, scales).with_boundary(BoundaryPolicy::Periodic);
/// let grid = engine.analyze(&Signal::new(samples)?)?;
/// ```
#[derive(Clone, Debug)]
pub struct AnalysisEngine {
    kernel: WaveletKernel,
    scales: ScaleSet,
    boundary: BoundaryPolicy,
    strategy: ConvolutionStrategy,
    subsample: bool,
    parallel: bool,
    cancel: Option<CancelToken>,
}

/// Largest power-of-two exponent used to normalise the input.
const MAX_NORM_EXPONENT: i32 = 1000;

/// Per-scale work item resolved before the parallel section.
struct ScalePlan {
    scale: f64,
    range: TapRange,
    stride: usize,
    /// Row is stored as `W + i·H[W]` and needs a full-resolution pass.
    quadrature: bool,
    strategy: ConvolutionStrategy,
    fft_len: usize,
}

impl AnalysisEngine {
    /// Creates an engine with zero padding, automatic strategy, no
    /// subsampling and parallel execution.
    pub fn new(kernel: WaveletKernel, scales: ScaleSet) -> Self {
        Self {
            kernel,
            scales,
            boundary: BoundaryPolicy::default(),
            strategy: ConvolutionStrategy::default(),
            subsample: false,
            parallel: true,
            cancel: None,
        }
    }

    /// Sets the boundary policy.
    pub fn with_boundary(mut self, boundary: BoundaryPolicy) -> Self {
        self.boundary = boundary;
        self
    }

    /// Sets the convolution strategy.
    pub fn with_strategy(mut self, strategy: ConvolutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Stores row `j` at stride `max(1, ⌊s_j / s_min⌋)` when enabled.
    ///
    /// With a real-valued kernel, rows above stride one are computed at full
    /// resolution and stored with their Hilbert quadrature; see
    /// [`CoefficientGrid`].
    pub fn with_subsampling(mut self, subsample: bool) -> Self {
        self.subsample = subsample;
        self
    }

    /// Enables or disables parallel execution across scales.
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

    /// Returns the scale set.
    pub fn scales(&self) -> &ScaleSet {
        &self.scales
    }

    /// Returns the boundary policy.
    pub fn boundary(&self) -> BoundaryPolicy {
        self.boundary
    }

    /// Returns the configured strategy.
    pub fn strategy(&self) -> ConvolutionStrategy {
        self.strategy
    }

    /// Returns whether rows are subsampled.
    pub fn subsample(&self) -> bool {
        self.subsample
    }

    /// Returns whether scales run in parallel.
    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Returns the cancellation token, if any.
    pub fn cancel_token(&self) -> Option<&CancelToken> {
        self.cancel.as_ref()
    }

    /// Analyses a validated signal.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`CwtError::EmptySignal`] | signal has no samples |
    /// | [`CwtError::Cancelled`] | the cancellation token fired |
    /// | [`CwtError::NumericInstability`] | a coefficient overflows or is NaN |
    #[tracing::instrument(skip_all, fields(n = signal.len(), n_scales = self.scales.len(), boundary = %self.boundary))]
    pub fn analyze(&self, signal: &Signal) -> Result<CoefficientGrid, CwtError> {
        let n = signal.len();
        if n == 0 {
            return Err(CwtError::EmptySignal);
        }
        let exponent = norm_exponent(signal.as_slice());
        let data: Cow<'_, [f64]> = if exponent == 0 {
            Cow::Borrowed(signal.as_slice())
        } else {
            let factor = 2f64.powi(-exponent);
            Cow::Owned(signal.as_slice().iter().map(|v| v * factor).collect())
        };
        let restore = 2f64.powi(exponent);

        let strides = if self.subsample {
            self.scales.strides()
        } else {
            vec![1; self.scales.len()]
        };
        let plans = self.plan(n, &strides);
        let cache = SpectrumCache::build(
            &data,
            self.boundary,
            plans
                .iter()
                .filter(|p| p.strategy == ConvolutionStrategy::Fft)
                .map(|p| p.fft_len),
        );
        let hilbert = plans
            .iter()
            .any(|p| p.quadrature)
            .then(|| HilbertPlan::new(n, self.boundary));
        debug!(
            n_fft = plans
                .iter()
                .filter(|p| p.strategy == ConvolutionStrategy::Fft)
                .count(),
            n_lengths = cache.len(),
            n_quadrature = plans.iter().filter(|p| p.quadrature).count(),
            exponent,
            "analysis plan ready"
        );

        let total = plans.len();
        let completed = AtomicUsize::new(0);
        let compute = |(j, plan): (usize, &ScalePlan)| -> Result<Vec<Complex64>, CwtError> {
            if let Some(token) = &self.cancel
                && token.is_cancelled()
            {
                return Err(CwtError::Cancelled {
                    completed: completed.load(Ordering::Relaxed),
                    total,
                });
            }
            let mut row = self.compute_row(&data, plan, &cache, hilbert.as_ref());
            if exponent != 0 {
                for c in &mut row {
                    *c *= restore;
                }
            }
            ensure_finite(&row, j, plan)?;
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            trace!(scale_index = j, completed = done, "scale analysed");
            Ok(row)
        };

        let rows: Vec<Vec<Complex64>> = if self.parallel {
            plans
                .par_iter()
                .enumerate()
                .map(&compute)
                .collect::<Result<_, _>>()?
        } else {
            plans
                .iter()
                .enumerate()
                .map(&compute)
                .collect::<Result<_, _>>()?
        };

        Ok(CoefficientGrid::new(
            rows,
            self.scales.clone(),
            strides,
            n,
            signal.dt(),
            self.kernel.family().clone(),
            self.boundary,
        ))
    }

    /// Validates `samples` as a [`Signal`] and analyses it.
    ///
    /// # Errors
    ///
    /// Same as [`Signal::with_dt`] and [`analyze`](Self::analyze).
    pub fn analyze_slice(&self, samples: &[f64], dt: f64) -> Result<CoefficientGrid, CwtError> {
        let signal = Signal::with_dt(samples.to_vec(), dt)?;
        self.analyze(&signal)
    }

    fn plan(&self, n: usize, strides: &[usize]) -> Vec<ScalePlan> {
        self.scales
            .iter()
            .zip(strides.iter())
            .map(|(scale, &stride)| {
                let range = TapRange::new(&self.kernel, scale, n, self.boundary);
                let fft_len = self.boundary.fft_len(n, range.reach());
                let quadrature = stride > 1 && self.kernel.is_real();
                let outputs = if quadrature { n } else { n.div_ceil(stride) };
                let strategy = self.strategy.resolve(range.len(), outputs, fft_len);
                trace!(scale, taps = range.len(), fft_len, quadrature, %strategy, "scale planned");
                ScalePlan {
                    scale,
                    range,
                    stride,
                    quadrature,
                    strategy,
                    fft_len,
                }
            })
            .collect()
    }

    fn compute_row(
        &self,
        data: &[f64],
        plan: &ScalePlan,
        cache: &SpectrumCache,
        hilbert: Option<&HilbertPlan>,
    ) -> Vec<Complex64> {
        let taps = plan.range.taps(&self.kernel, plan.scale);
        let step = if plan.quadrature { 1 } else { plan.stride };
        let row = match (plan.strategy, cache.get(plan.fft_len)) {
            (ConvolutionStrategy::Fft, Some(entry)) => {
                entry.row(data.len(), plan.range, &taps, step)
            }
            _ => direct_row(data, self.boundary, plan.range, &taps, step),
        };
        match hilbert {
            Some(hilbert) if plan.quadrature => hilbert
                .analytic(&row)
                .into_iter()
                .step_by(plan.stride)
                .collect(),
            _ => row,
        }
    }
}

/// Exponent `e` such that `2^-e · max|x|` lies in `[1, 2)`, clamped so both
/// `2^e` and `2^-e` stay normal.
fn norm_exponent(data: &[f64]) -> i32 {
    let peak = data.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if peak == 0.0 {
        return 0;
    }
    (peak.log2().floor() as i32).clamp(-MAX_NORM_EXPONENT, MAX_NORM_EXPONENT)
}

fn ensure_finite(row: &[Complex64], scale_index: usize, plan: &ScalePlan) -> Result<(), CwtError> {
    match row.iter().position(|c| !c.is_finite()) {
        Some(pos) => Err(CwtError::NumericInstability {
            scale_index,
            time_index: pos * plan.stride,
            scale: plan.scale,
        }),
        None => Ok(()),
    }
}

/// Analyses `signal` with default strategy and parallelism.
///
/// # Errors
///
/// Same as [`AnalysisEngine::analyze`].
pub fn analyze(
    signal: &Signal,
    kernel: &WaveletKernel,
    scales: &ScaleSet,
    boundary: BoundaryPolicy,
) -> Result<CoefficientGrid, CwtError> {
    AnalysisEngine::new(kernel.clone(), scales.clone())
        .with_boundary(boundary)
        .analyze(signal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn sine(n: usize, period: f64) -> Signal {
        Signal::new((0..n).map(|i| (2.0 * PI * i as f64 / period).sin()).collect()).unwrap()
    }

    #[test]
    fn builder_defaults() {
        let engine = AnalysisEngine::new(
            WaveletKernel::morlet(2.0).unwrap(),
            ScaleSet::from_explicit([4.0]).unwrap(),
        );
        assert_eq!(engine.boundary(), BoundaryPolicy::Zero);
        assert_eq!(engine.strategy(), ConvolutionStrategy::Auto);
        assert!(!engine.subsample());
        assert!(engine.parallel());
        assert!(engine.cancel_token().is_none());
    }

    #[test]
    fn output_dimensions() {
        let scales = ScaleSet::from_range(10, 2.0, 1.5).unwrap();
        let engine = AnalysisEngine::new(WaveletKernel::morlet(2.0).unwrap(), scales);
        let grid = engine.analyze(&sine(200, 16.0)).unwrap();
        assert_eq!(grid.n_scales(), 10);
        assert_eq!(grid.n_times(), 200);
        assert!(!grid.is_subsampled());
        for row in grid.rows() {
            assert_eq!(row.len(), 200);
        }
    }

    #[test]
    fn subsampled_rows_are_shorter() {
        let scales = ScaleSet::from_explicit([2.0, 4.0, 9.0]).unwrap();
        let engine =
            AnalysisEngine::new(WaveletKernel::morlet(2.0).unwrap(), scales).with_subsampling(true);
        let grid = engine.analyze(&sine(101, 16.0)).unwrap();
        assert_eq!(grid.strides(), &[1, 2, 4]);
        assert_eq!(grid.row(0).len(), 101);
        assert_eq!(grid.row(1).len(), 51);
        assert_eq!(grid.row(2).len(), 26);
    }

    #[test]
    fn sine_peaks_at_its_period() {
        let period = 32.0;
        let scales = ScaleSet::from_octaves(4.0, 8.0, 33).unwrap();
        let engine = AnalysisEngine::new(WaveletKernel::morlet(1.0).unwrap(), scales)
            .with_boundary(BoundaryPolicy::Periodic);
        let grid = engine.analyze(&sine(512, period)).unwrap();
        let gws = grid.global_spectrum();
        let (peak, _) = gws
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .unwrap();
        let peak_period = engine.kernel().fourier_period(grid.scales().as_slice()[peak]);
        assert!(
            ((peak_period - period) / period).abs() < 0.1,
            "peak period {peak_period}"
        );
    }

    #[test]
    fn constant_signal_has_negligible_response() {
        let scales = ScaleSet::from_range(4, 8.0, 2.0).unwrap();
        let engine = AnalysisEngine::new(WaveletKernel::morlet(2.0).unwrap(), scales)
            .with_boundary(BoundaryPolicy::Periodic);
        let grid = engine
            .analyze(&Signal::new(vec![3.0; 256]).unwrap())
            .unwrap();
        for row in grid.power() {
            for p in row {
                assert!(p < 1e-8, "power {p}");
            }
        }
    }

    #[test]
    fn grid_records_metadata() {
        let kernel = WaveletKernel::cauchy(4.0).unwrap();
        let scales = ScaleSet::from_explicit([3.0, 6.0]).unwrap();
        let grid = analyze(
            &Signal::with_dt(vec![1.0, 0.0, -1.0, 0.0], 0.1).unwrap(),
            &kernel,
            &scales,
            BoundaryPolicy::Reflect,
        )
        .unwrap();
        assert_eq!(grid.family(), kernel.family());
        assert_eq!(grid.scales(), &scales);
        assert_eq!(grid.boundary(), BoundaryPolicy::Reflect);
        assert_relative_eq!(grid.dt(), 0.1);
    }

    #[test]
    fn analyze_slice_validates_input() {
        let engine = AnalysisEngine::new(
            WaveletKernel::morlet(2.0).unwrap(),
            ScaleSet::from_explicit([2.0]).unwrap(),
        );
        assert!(matches!(
            engine.analyze_slice(&[], 1.0),
            Err(CwtError::EmptySignal)
        ));
        assert!(matches!(
            engine.analyze_slice(&[1.0, f64::NAN], 1.0),
            Err(CwtError::NonFiniteSignal { index: 1 })
        ));
    }

    #[test]
    fn single_sample_signal() {
        let engine = AnalysisEngine::new(
            WaveletKernel::morlet(2.0).unwrap(),
            ScaleSet::from_explicit([1.0, 50.0]).unwrap(),
        );
        let grid = engine.analyze_slice(&[1.0], 1.0).unwrap();
        assert_eq!(grid.n_times(), 1);
        assert_eq!(grid.row(1).len(), 1);
    }

    #[test]
    fn norm_exponent_brackets_the_peak() {
        assert_eq!(norm_exponent(&[0.0, 0.0]), 0);
        assert_eq!(norm_exponent(&[0.5, -1.5]), 0);
        assert_eq!(norm_exponent(&[3.0, -8.0]), 3);
        assert_eq!(norm_exponent(&[1e-3]), -10);
        assert_eq!(norm_exponent(&[f64::MAX]), MAX_NORM_EXPONENT);
    }

    #[test]
    fn scaled_input_gives_scaled_rows() {
        let scales = ScaleSet::from_explicit([3.0, 7.0]).unwrap();
        let engine = AnalysisEngine::new(WaveletKernel::morlet(2.0).unwrap(), scales);
        let unit = engine.analyze(&sine(64, 10.0)).unwrap();
        let big = Signal::new(sine(64, 10.0).as_slice().iter().map(|v| v * 1024.0).collect())
            .unwrap();
        let grid = engine.analyze(&big).unwrap();
        for (a, b) in grid.rows().iter().zip(unit.rows()) {
            for (x, y) in a.iter().zip(b) {
                assert_eq!(*x, *y * 1024.0);
            }
        }
    }

    #[test]
    fn real_kernel_subsampled_rows_keep_coefficients() {
        let kernel = WaveletKernel::derivative_of_gaussian(2).unwrap();
        let scales = ScaleSet::from_explicit([2.0, 4.0, 8.0]).unwrap();
        let signal = sine(96, 12.0);
        for boundary in [
            BoundaryPolicy::Zero,
            BoundaryPolicy::Periodic,
            BoundaryPolicy::Reflect,
        ] {
            let engine = AnalysisEngine::new(kernel.clone(), scales.clone()).with_boundary(boundary);
            let full = engine.analyze(&signal).unwrap();
            let sub = engine.with_subsampling(true).analyze(&signal).unwrap();
            assert_eq!(sub.strides(), &[1, 2, 4]);
            for j in 0..3 {
                assert_eq!(sub.is_quadrature_row(j), j > 0);
                let stride = sub.strides()[j];
                for (m, c) in sub.row(j).iter().enumerate() {
                    let expected = full.row(j)[m * stride];
                    assert!((c.re - expected.re).abs() < 1e-12, "{boundary} j={j} m={m}");
                    if j > 0 {
                        assert_eq!(sub.get(j, m * stride), Some(Complex64::new(c.re, 0.0)));
                    }
                }
            }
        }
    }

    #[test]
    fn engine_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<AnalysisEngine>();
    }
}
