//! Kruskal-Wallis rank-sum test for independent groups.

use crate::data::SampleGroup;
use crate::error::{MetaboError, Result};
use crate::stats::ranks::{average_ranks, tie_adjustment};
use crate::stats::Significance;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use std::fmt;

/// Result of the omnibus group comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KruskalResult {
    /// H statistic, tie-corrected.
    pub statistic: f64,
    /// Upper-tail p-value from the chi-squared approximation.
    pub p_value: f64,
    /// Degrees of freedom (number of groups minus one).
    pub df: usize,
    /// Verdict at the fixed 0.05 threshold.
    pub verdict: Significance,
}

impl fmt::Display for KruskalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "H={:.4}, p={:.4} -> {}",
            self.statistic, self.p_value, self.verdict
        )
    }
}

/// Test the null hypothesis that all groups share the same median.
///
/// Observations are pooled and converted to average ranks (ties receive the
/// average of the ranks they span), the H statistic is corrected for ties,
/// and the p-value comes from a chi-squared distribution with k − 1 degrees
/// of freedom. Group order affects output labeling only, never the result.
///
/// # Arguments
/// * `groups` - Two or more non-empty groups of observations.
///
/// # Returns
/// `KruskalResult` with the tie-corrected H statistic, p-value and verdict.
pub fn kruskal_wallis(groups: &[SampleGroup]) -> Result<KruskalResult> {
    if groups.len() < 2 {
        return Err(MetaboError::InsufficientGroups {
            needed: 2,
            got: groups.len(),
        });
    }
    if groups.iter().any(|g| g.is_empty()) {
        let non_empty = groups.iter().filter(|g| !g.is_empty()).count();
        return Err(MetaboError::InsufficientGroups {
            needed: groups.len(),
            got: non_empty,
        });
    }

    let pooled: Vec<f64> = groups
        .iter()
        .flat_map(|g| g.values().iter().copied())
        .collect();
    let n_total = pooled.len() as f64;
    let ranks = average_ranks(&pooled);

    let mut rank_sum_term = 0.0;
    let mut offset = 0;
    for group in groups {
        let n_j = group.len();
        let r_j: f64 = ranks[offset..offset + n_j].iter().sum();
        rank_sum_term += r_j * r_j / n_j as f64;
        offset += n_j;
    }

    let h = 12.0 / (n_total * (n_total + 1.0)) * rank_sum_term - 3.0 * (n_total + 1.0);

    let correction = 1.0 - tie_adjustment(&pooled) / (n_total.powi(3) - n_total);
    if correction <= 0.0 {
        return Err(MetaboError::StatisticalPrecondition {
            test: "Kruskal-Wallis",
            reason: "all observations are identical".to_string(),
        });
    }
    let statistic = (h / correction).max(0.0);

    let df = groups.len() - 1;
    let chi_squared =
        ChiSquared::new(df as f64).map_err(|e| MetaboError::StatisticalPrecondition {
            test: "Kruskal-Wallis",
            reason: e.to_string(),
        })?;
    let p_value = 1.0 - chi_squared.cdf(statistic);

    Ok(KruskalResult {
        statistic,
        p_value,
        df,
        verdict: Significance::from_p(p_value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn group(name: &str, values: &[f64]) -> SampleGroup {
        SampleGroup::new(name, values.to_vec()).unwrap()
    }

    #[test]
    fn test_known_value_two_groups() {
        // pooled ranks 1..6, H = 12/42 * (12 + 75) - 21
        let result =
            kruskal_wallis(&[group("a", &[1.0, 2.0, 3.0]), group("b", &[4.0, 5.0, 6.0])]).unwrap();
        assert_relative_eq!(result.statistic, 3.857143, epsilon = 1e-6);
        assert_relative_eq!(result.p_value, 0.04953, epsilon = 1e-4);
        assert_eq!(result.df, 1);
        assert_eq!(result.verdict, Significance::Significant);
    }

    #[test]
    fn test_identical_groups_not_significant() {
        let groups = vec![
            group("a", &[1.0, 2.0, 3.0]),
            group("b", &[1.0, 2.0, 3.0]),
            group("c", &[1.0, 2.0, 3.0]),
        ];
        let result = kruskal_wallis(&groups).unwrap();
        assert_relative_eq!(result.statistic, 0.0, epsilon = 1e-10);
        assert_relative_eq!(result.p_value, 1.0, epsilon = 1e-10);
        assert_eq!(result.verdict, Significance::NotSignificant);
    }

    #[test]
    fn test_determinism_and_order_invariance() {
        let a = group("a", &[1.0, 5.0, 9.0, 2.0]);
        let b = group("b", &[3.0, 7.0, 4.0]);
        let c = group("c", &[8.0, 6.0, 10.0]);

        let first = kruskal_wallis(&[a.clone(), b.clone(), c.clone()]).unwrap();
        let second = kruskal_wallis(&[a.clone(), b.clone(), c.clone()]).unwrap();
        assert_eq!(first.statistic, second.statistic);
        assert_eq!(first.p_value, second.p_value);

        let permuted = kruskal_wallis(&[c, a, b]).unwrap();
        assert_relative_eq!(first.statistic, permuted.statistic, epsilon = 1e-12);
        assert_relative_eq!(first.p_value, permuted.p_value, epsilon = 1e-12);
    }

    #[test]
    fn test_too_few_groups() {
        let err = kruskal_wallis(&[group("only", &[1.0, 2.0])]).unwrap_err();
        assert!(matches!(err, MetaboError::InsufficientGroups { .. }));
    }

    #[test]
    fn test_constant_data_rejected() {
        let groups = vec![group("a", &[5.0, 5.0]), group("b", &[5.0, 5.0])];
        let err = kruskal_wallis(&groups).unwrap_err();
        assert!(matches!(err, MetaboError::StatisticalPrecondition { .. }));
    }
}
