//! Error types for the cwtlab-cwt crate.

/// Error type for all fallible operations in the cwtlab-cwt crate.
///
/// Covers parameter validation, signal and grid validation, engine
/// compatibility checks, cancellation, and numerical failures raised while
/// analysing or synthesising.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CwtError {
    /// Returned when a kernel or engine parameter is outside its valid domain.
    #[error("invalid {component} parameter: {reason}")]
    InvalidParameter {
        /// Component the parameter belongs to (e.g. `"morlet"`, `"signal"`).
        component: String,
        /// Description of the violated constraint.
        reason: String,
    },

    /// Returned when a scale set is empty or contains a non-positive or
    /// non-finite scale.
    #[error("invalid scale set: {0}")]
    InvalidScale(String),

    /// Returned when the input signal has no samples.
    #[error("signal is empty")]
    EmptySignal,

    /// Returned when the input signal contains NaN or infinity.
    #[error("signal sample {index} is not finite")]
    NonFiniteSignal {
        /// Index of the first offending sample.
        index: usize,
    },

    /// Returned when a grid is synthesised with a kernel other than the one
    /// that produced it.
    #[error("kernel mismatch: grid was analysed with {found}, engine uses {expected}")]
    KernelMismatch {
        /// Kernel configured on the synthesis engine.
        expected: String,
        /// Kernel recorded in the coefficient grid.
        found: String,
    },

    /// Returned when a grid's scale set differs from the engine's scale set.
    #[error("scale mismatch: grid scales ({found} values) differ from engine scales ({expected} values)")]
    ScaleMismatch {
        /// Number of scales the engine was configured with.
        expected: usize,
        /// Number of scales carried by the grid.
        found: usize,
    },

    /// Returned when synthesis is requested before a successful analysis.
    #[error("synthesis requested before analysis")]
    NotAnalyzed,

    /// Returned when a cancellation token fires during a transform.
    #[error("transform cancelled after {completed} of {total} scales")]
    Cancelled {
        /// Number of scales that had completed when cancellation was observed.
        completed: usize,
        /// Total number of scales in the transform.
        total: usize,
    },

    /// Returned when a computed value is NaN or infinite.
    #[error("non-finite value at scale index {scale_index} (scale {scale}), time index {time_index}")]
    NumericInstability {
        /// Index of the offending scale.
        scale_index: usize,
        /// Time index of the offending value.
        time_index: usize,
        /// Scale value at `scale_index`.
        scale: f64,
    },

    /// Returned when a coefficient grid assembled from parts is inconsistent.
    #[error("invalid coefficient grid: {0}")]
    InvalidGrid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_invalid_parameter() {
        let err = CwtError::InvalidParameter {
            component: "morlet".into(),
            reason: "dff must be in (0, 20], got -1".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid morlet parameter: dff must be in (0, 20], got -1"
        );
    }

    #[test]
    fn error_invalid_scale() {
        let err = CwtError::InvalidScale("scale set is empty".into());
        assert_eq!(err.to_string(), "invalid scale set: scale set is empty");
    }

    #[test]
    fn error_empty_signal() {
        assert_eq!(CwtError::EmptySignal.to_string(), "signal is empty");
    }

    #[test]
    fn error_non_finite_signal() {
        let err = CwtError::NonFiniteSignal { index: 7 };
        assert_eq!(err.to_string(), "signal sample 7 is not finite");
    }

    #[test]
    fn error_kernel_mismatch() {
        let err = CwtError::KernelMismatch {
            expected: "cauchy(alpha=2)".into(),
            found: "morlet(dff=2)".into(),
        };
        assert_eq!(
            err.to_string(),
            "kernel mismatch: grid was analysed with morlet(dff=2), engine uses cauchy(alpha=2)"
        );
    }

    #[test]
    fn error_scale_mismatch() {
        let err = CwtError::ScaleMismatch {
            expected: 32,
            found: 16,
        };
        assert_eq!(
            err.to_string(),
            "scale mismatch: grid scales (16 values) differ from engine scales (32 values)"
        );
    }

    #[test]
    fn error_not_analyzed() {
        assert_eq!(
            CwtError::NotAnalyzed.to_string(),
            "synthesis requested before analysis"
        );
    }

    #[test]
    fn error_cancelled() {
        let err = CwtError::Cancelled {
            completed: 3,
            total: 10,
        };
        assert_eq!(err.to_string(), "transform cancelled after 3 of 10 scales");
    }

    #[test]
    fn error_numeric_instability() {
        let err = CwtError::NumericInstability {
            scale_index: 2,
            time_index: 40,
            scale: 8.0,
        };
        assert_eq!(
            err.to_string(),
            "non-finite value at scale index 2 (scale 8), time index 40"
        );
    }

    #[test]
    fn error_invalid_grid() {
        let err = CwtError::InvalidGrid("row 0 has 3 values, expected 4".into());
        assert_eq!(
            err.to_string(),
            "invalid coefficient grid: row 0 has 3 values, expected 4"
        );
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<CwtError>();
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<CwtError>();
    }
}
