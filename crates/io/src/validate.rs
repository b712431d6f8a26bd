//! Accumulated validation utilities.
//!
//! Provides [`ValidationCollector`] for gathering multiple validation errors
//! into a single [`IoError::Validation`], plus standalone helpers that check
//! the invariants of stored grid records.

use crate::error::IoError;

// ---------------------------------------------------------------------------
// ValidationCollector
// ---------------------------------------------------------------------------

/// Accumulates validation errors and converts them into a single
/// [`IoError::Validation`].
///
/// Create a collector, push zero or more error messages, then call
/// [`finish`](Self::finish) to obtain `Ok(())` when everything is valid or a
/// single `Err` that summarises every violation.
pub(crate) struct ValidationCollector {
    errors: Vec<String>,
}

impl ValidationCollector {
    pub(crate) fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub(crate) fn push(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    /// Moves every message of `other` into `self`.
    pub(crate) fn merge(&mut self, other: ValidationCollector) {
        self.errors.extend(other.errors);
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.errors.len()
    }

    /// Consume the collector and return `Ok(())` if no errors were recorded,
    /// or `Err(IoError::Validation { count, details })` otherwise.
    ///
    /// The `details` string joins all messages with `"; "`.
    pub(crate) fn finish(self) -> Result<(), IoError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(IoError::Validation {
                count: self.errors.len(),
                details: self.errors.join("; "),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Standalone validation helpers
// ---------------------------------------------------------------------------

/// Check that stored scales are in ascending order.
///
/// The row order of a grid follows its scale order, so a file with shuffled
/// scales cannot be loaded without losing the row mapping.
pub(crate) fn validate_ascending(scales: &[f64]) -> ValidationCollector {
    let mut c = ValidationCollector::new();

    for (i, pair) in scales.windows(2).enumerate() {
        if pair[1] < pair[0] {
            c.push(format!(
                "scale {} at position {} is smaller than scale {} before it",
                pair[1],
                i + 1,
                pair[0]
            ));
        }
    }

    c
}

/// Check that the real and imaginary parts of every row have equal length.
///
/// Records one message per offending row.
pub(crate) fn validate_row_parts<'a>(
    rows: impl IntoIterator<Item = (&'a [f64], &'a [f64])>,
) -> ValidationCollector {
    let mut c = ValidationCollector::new();

    for (j, (re, im)) in rows.into_iter().enumerate() {
        if re.len() != im.len() {
            c.push(format!(
                "row {j} has {} real and {} imaginary values",
                re.len(),
                im.len()
            ));
        }
    }

    c
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- ValidationCollector -------------------------------------------------

    #[test]
    fn collector_empty_is_ok() {
        let c = ValidationCollector::new();
        assert!(c.is_empty());
        assert_eq!(c.len(), 0);
        assert!(c.finish().is_ok());
    }

    #[test]
    fn collector_non_empty_is_err_with_correct_count() {
        let mut c = ValidationCollector::new();
        c.push("error one");
        c.push("error two");
        assert!(!c.is_empty());
        assert_eq!(c.len(), 2);

        let err = c.finish().unwrap_err();
        match err {
            IoError::Validation { count, details } => {
                assert_eq!(count, 2);
                assert_eq!(details, "error one; error two");
            }
            other => panic!("expected IoError::Validation, got {other:?}"),
        }
    }

    #[test]
    fn collector_merge_keeps_order() {
        let mut a = ValidationCollector::new();
        a.push("first");
        let mut b = ValidationCollector::new();
        b.push("second");
        b.push("third");
        a.merge(b);
        assert_eq!(a.len(), 3);
        match a.finish().unwrap_err() {
            IoError::Validation { details, .. } => assert_eq!(details, "first; second; third"),
            other => panic!("expected IoError::Validation, got {other:?}"),
        }
    }

    // -- validate_ascending --------------------------------------------------

    #[test]
    fn ascending_scales_are_valid() {
        assert!(validate_ascending(&[1.0, 2.0, 2.0, 8.0]).finish().is_ok());
        assert!(validate_ascending(&[3.0]).finish().is_ok());
        assert!(validate_ascending(&[]).finish().is_ok());
    }

    #[test]
    fn descending_pairs_produce_errors() {
        let c = validate_ascending(&[4.0, 2.0, 3.0, 1.0]);
        assert_eq!(c.len(), 2);
        match c.finish().unwrap_err() {
            IoError::Validation { count, details } => {
                assert_eq!(count, 2);
                assert!(details.contains("scale 2 at position 1"));
                assert!(details.contains("scale 1 at position 3"));
            }
            other => panic!("expected IoError::Validation, got {other:?}"),
        }
    }

    // -- validate_row_parts --------------------------------------------------

    #[test]
    fn matching_parts_are_valid() {
        let re = [vec![1.0, 2.0], vec![3.0]];
        let im = [vec![0.0, 0.0], vec![1.0]];
        let c = validate_row_parts(
            re.iter()
                .zip(im.iter())
                .map(|(r, i)| (r.as_slice(), i.as_slice())),
        );
        assert!(c.is_empty());
    }

    #[test]
    fn mismatched_parts_produce_errors() {
        let re = [vec![1.0, 2.0], vec![3.0]];
        let im = [vec![0.0], vec![1.0]];
        let c = validate_row_parts(
            re.iter()
                .zip(im.iter())
                .map(|(r, i)| (r.as_slice(), i.as_slice())),
        );
        assert_eq!(c.len(), 1);
        match c.finish().unwrap_err() {
            IoError::Validation { details, .. } => {
                assert_eq!(details, "row 0 has 2 real and 1 imaginary values");
            }
            other => panic!("expected IoError::Validation, got {other:?}"),
        }
    }
}
