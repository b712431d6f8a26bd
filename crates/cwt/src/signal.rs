//! Validated, uniformly sampled real signal.

use crate::error::CwtError;

/// A validated sequence of finite, uniformly spaced `f64` samples.
///
/// Guarantees:
/// - at least one sample
/// - every sample is finite (no NaN or infinity)
/// - the sampling interval `dt` is positive and finite
///
/// Scales throughout the crate are measured in samples; `dt` only converts
/// sample units to physical units for reporting.
///
/// # Example
///
/// ```ignore
/// use cwtlab_cwt::Signal;
///
/// let signal = Signal::new(vec![0.0, 1.0, 0.0, -1.0])?;
/// assert_eq!(signal.len(), 4);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Signal {
    samples: Vec<f64>,
    dt: f64,
}

impl Signal {
    /// Creates a new `Signal` with unit sampling interval.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`CwtError::EmptySignal`] | `samples` is empty |
    /// | [`CwtError::NonFiniteSignal`] | any sample is NaN or infinite |
    pub fn new(samples: Vec<f64>) -> Result<Self, CwtError> {
        Self::with_dt(samples, 1.0)
    }

    /// Creates a new `Signal` with an explicit sampling interval.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`CwtError::EmptySignal`] | `samples` is empty |
    /// | [`CwtError::NonFiniteSignal`] | any sample is NaN or infinite |
    /// | [`CwtError::InvalidParameter`] | `dt` is not positive and finite |
    pub fn with_dt(samples: Vec<f64>, dt: f64) -> Result<Self, CwtError> {
        if samples.is_empty() {
            return Err(CwtError::EmptySignal);
        }
        if let Some(index) = samples.iter().position(|v| !v.is_finite()) {
            return Err(CwtError::NonFiniteSignal { index });
        }
        if !(dt.is_finite() && dt > 0.0) {
            return Err(CwtError::InvalidParameter {
                component: "signal".into(),
                reason: format!("dt must be positive and finite, got {dt}"),
            });
        }
        Ok(Self { samples, dt })
    }

    /// Returns the samples as a slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.samples
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if the signal has no samples.
    ///
    /// Note: a valid `Signal` is never empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the sampling interval.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Returns the covered duration `len * dt` in physical units.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 * self.dt
    }

    /// Consumes the signal and returns the owned samples.
    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }
}

impl AsRef<[f64]> for Signal {
    fn as_ref(&self) -> &[f64] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_valid_signal() {
        let s = Signal::new(vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(s.len(), 3);
        assert!(!s.is_empty());
        assert_eq!(s.as_slice(), &[1.0, 2.0, 3.0]);
        assert!((s.dt() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn single_sample_is_valid() {
        let s = Signal::new(vec![4.0]).unwrap();
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn empty_rejected() {
        let err = Signal::new(vec![]).unwrap_err();
        assert!(matches!(err, CwtError::EmptySignal));
    }

    #[test]
    fn nan_rejected_with_index() {
        let err = Signal::new(vec![1.0, 2.0, f64::NAN, 3.0]).unwrap_err();
        assert!(matches!(err, CwtError::NonFiniteSignal { index: 2 }));
    }

    #[test]
    fn infinity_rejected_with_index() {
        let err = Signal::new(vec![f64::NEG_INFINITY, 1.0]).unwrap_err();
        assert!(matches!(err, CwtError::NonFiniteSignal { index: 0 }));
    }

    #[test]
    fn with_dt_stores_interval() {
        let s = Signal::with_dt(vec![0.0; 10], 0.25).unwrap();
        assert!((s.dt() - 0.25).abs() < f64::EPSILON);
        assert!((s.duration() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn with_dt_rejects_bad_interval() {
        for dt in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = Signal::with_dt(vec![1.0], dt).unwrap_err();
            assert!(matches!(err, CwtError::InvalidParameter { .. }), "dt = {dt}");
        }
    }

    #[test]
    fn as_ref_and_into_samples() {
        let s = Signal::new(vec![1.0, 2.0]).unwrap();
        let slice: &[f64] = s.as_ref();
        assert_eq!(slice, &[1.0, 2.0]);
        assert_eq!(s.into_samples(), vec![1.0, 2.0]);
    }

    #[test]
    fn signal_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<Signal>();
    }
}
