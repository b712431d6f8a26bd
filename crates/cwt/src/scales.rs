//! Ordered, immutable sets of analysis scales.

use std::sync::Arc;

use crate::error::CwtError;

/// A non-empty, ascending sequence of strictly positive, finite scales.
///
/// Scales are measured in samples. The set is shared through an `Arc`, so
/// engines, pipelines and coefficient grids can hold the same set without
/// copying it.
///
/// # Example
///
/// ```ignore
/// use cwtlab_cwt::ScaleSet;
///
/// let scales = ScaleSet::from_range(64, 2.0, 2f64.powf(1.0 / 8.0))?;
/// assert_eq!(scales.len(), 64);
/// assert!((scales.min() - 2.0).abs() < 1e-12);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ScaleSet {
    values: Arc<[f64]>,
}

impl ScaleSet {
    /// Builds a set from explicit values, sorted ascending.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`CwtError::InvalidScale`] | no values, or any value `<= 0` or non-finite |
    pub fn from_explicit(values: impl IntoIterator<Item = f64>) -> Result<Self, CwtError> {
        let mut values: Vec<f64> = values.into_iter().collect();
        if values.is_empty() {
            return Err(CwtError::InvalidScale("scale set is empty".into()));
        }
        if let Some((i, v)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !(v.is_finite() && **v > 0.0))
        {
            return Err(CwtError::InvalidScale(format!(
                "scale {v} at position {i} is not a positive finite number"
            )));
        }
        values.sort_by(f64::total_cmp);
        Ok(Self {
            values: values.into(),
        })
    }

    /// Geometric progression `first · factor^i` for `i = 0..count`.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`CwtError::InvalidScale`] | `count == 0`, `first <= 0`, `factor <= 0`, or a generated value is not positive and finite |
    pub fn from_range(count: usize, first: f64, factor: f64) -> Result<Self, CwtError> {
        if count == 0 {
            return Err(CwtError::InvalidScale("count must be at least 1".into()));
        }
        if !(first.is_finite() && first > 0.0) {
            return Err(CwtError::InvalidScale(format!(
                "first scale must be positive and finite, got {first}"
            )));
        }
        if !(factor.is_finite() && factor > 0.0) {
            return Err(CwtError::InvalidScale(format!(
                "factor must be positive and finite, got {factor}"
            )));
        }
        Self::from_explicit((0..count).map(|i| first * factor.powi(i as i32)))
    }

    /// Arithmetic progression `first + i · step` for `i = 0..count`.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`CwtError::InvalidScale`] | `count == 0` or a generated value is not positive and finite |
    pub fn from_linear(count: usize, first: f64, step: f64) -> Result<Self, CwtError> {
        if count == 0 {
            return Err(CwtError::InvalidScale("count must be at least 1".into()));
        }
        Self::from_explicit((0..count).map(|i| first + i as f64 * step))
    }

    /// `count` linearly spaced scales from `min` to `max` inclusive.
    ///
    /// A single scale yields `[min]`.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`CwtError::InvalidScale`] | `count == 0`, `min <= 0`, or `max < min` |
    pub fn from_bounds(min: f64, max: f64, count: usize) -> Result<Self, CwtError> {
        if count == 0 {
            return Err(CwtError::InvalidScale("count must be at least 1".into()));
        }
        if !(max.is_finite() && max >= min) {
            return Err(CwtError::InvalidScale(format!(
                "max scale {max} must be finite and >= min scale {min}"
            )));
        }
        if count == 1 {
            return Self::from_explicit([min]);
        }
        let step = (max - min) / (count - 1) as f64;
        Self::from_linear(count, min, step)
    }

    /// `count` scales spaced `voices` per octave: `first · 2^(j / voices)`.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`CwtError::InvalidScale`] | `voices` not positive and finite, or [`from_range`](Self::from_range) fails |
    pub fn from_octaves(first: f64, voices: f64, count: usize) -> Result<Self, CwtError> {
        if !(voices.is_finite() && voices > 0.0) {
            return Err(CwtError::InvalidScale(format!(
                "voices per octave must be positive and finite, got {voices}"
            )));
        }
        Self::from_range(count, first, 2f64.powf(1.0 / voices))
    }

    /// Number of scales.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always `false`; a valid set holds at least one scale.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Scale at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Scales as an ascending slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Iterates the scales in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// Smallest scale.
    pub fn min(&self) -> f64 {
        self.values[0]
    }

    /// Largest scale.
    pub fn max(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    /// Subsampling strides `max(1, ⌊s / s_min⌋)`, one per scale.
    pub fn strides(&self) -> Vec<usize> {
        let s_min = self.min();
        self.values
            .iter()
            // Guards exact multiples such as 16·s_min against rounding down.
            .map(|&s| ((s / s_min) * (1.0 + 1e-12)).floor().max(1.0) as usize)
            .collect()
    }

    /// Trapezoid weights of the scales in `u = ln s`.
    ///
    /// A single scale gets unit weight.
    pub fn log_weights(&self) -> Vec<f64> {
        let n = self.values.len();
        if n == 1 {
            return vec![1.0];
        }
        let u: Vec<f64> = self.values.iter().map(|s| s.ln()).collect();
        (0..n)
            .map(|j| {
                let left = if j == 0 { u[0] } else { u[j - 1] };
                let right = if j == n - 1 { u[n - 1] } else { u[j + 1] };
                0.5 * (right - left)
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a ScaleSet {
    type Item = f64;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, f64>>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter().copied()
    }
}
