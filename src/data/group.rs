//! Named groups of numeric observations.

use crate::error::{MetaboError, Result};
use serde::{Deserialize, Serialize};

/// A named collection of numeric observations (one per replicate).
///
/// Groups are non-empty by construction: missing values are dropped before
/// the group is built, and a group that ends up with no observations is
/// rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleGroup {
    name: String,
    values: Vec<f64>,
}

impl SampleGroup {
    /// Create a group from already-clean observations.
    ///
    /// Non-finite values count as missing and are dropped.
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        let name = name.into();
        let values: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        if values.is_empty() {
            return Err(MetaboError::EmptyData(format!(
                "group '{}' has no observations",
                name
            )));
        }
        Ok(Self { name, values })
    }

    /// Create a group from observations that may contain missing values.
    pub fn from_observations(name: impl Into<String>, values: Vec<Option<f64>>) -> Result<Self> {
        Self::new(name, values.into_iter().flatten().collect())
    }

    /// Group name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Observations, missing values already excluded.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of observations.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the group holds no observations.
    ///
    /// Cannot happen for groups built through the public constructors; kept
    /// so callers can guard data deserialized from elsewhere.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Arithmetic mean of the observations.
    pub fn mean(&self) -> f64 {
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_group() {
        let g = SampleGroup::new("asp", vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(g.name(), "asp");
        assert_eq!(g.len(), 3);
        assert_relative_eq!(g.mean(), 2.0);
    }

    #[test]
    fn test_missing_values_dropped() {
        let g =
            SampleGroup::from_observations("glu", vec![Some(1.0), None, Some(3.0), None]).unwrap();
        assert_eq!(g.values(), &[1.0, 3.0]);
    }

    #[test]
    fn test_nan_counts_as_missing() {
        let g = SampleGroup::new("h2o", vec![1.0, f64::NAN, 2.0]).unwrap();
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn test_empty_group_rejected() {
        assert!(SampleGroup::new("empty", vec![]).is_err());
        assert!(SampleGroup::from_observations("empty", vec![None, None]).is_err());
    }
}
