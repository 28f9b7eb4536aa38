//! Dunn post-hoc pairwise comparison with Bonferroni correction.

use crate::data::SampleGroup;
use crate::error::{MetaboError, Result};
use crate::stats::ranks::{average_ranks, tie_adjustment};
use crate::stats::Significance;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt;

/// Pairwise comparison results as square matrices over the group set.
///
/// The diagonal holds the self-comparisons, fixed at p = 1; both matrices
/// are symmetric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DunnResult {
    /// Group names, indexing the matrix rows and columns.
    pub groups: Vec<String>,
    /// Pairwise z statistics.
    pub statistics: DMatrix<f64>,
    /// Bonferroni-adjusted two-sided p-values.
    pub adjusted_p: DMatrix<f64>,
    /// Number of unordered comparisons used for the correction.
    pub n_comparisons: usize,
}

/// One row of the long-form pairwise table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DunnRow {
    pub group_a: String,
    pub group_b: String,
    pub p_value: f64,
    pub verdict: Significance,
}

impl DunnResult {
    /// Adjusted p-value for a pair of groups, by name.
    pub fn p_between(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.groups.iter().position(|g| g == a)?;
        let j = self.groups.iter().position(|g| g == b)?;
        Some(self.adjusted_p[(i, j)])
    }

    /// Long-form table with one row per ordered pair, diagonal included.
    pub fn rows(&self) -> Vec<DunnRow> {
        let k = self.groups.len();
        let mut rows = Vec::with_capacity(k * k);
        for i in 0..k {
            for j in 0..k {
                let p_value = self.adjusted_p[(i, j)];
                rows.push(DunnRow {
                    group_a: self.groups[i].clone(),
                    group_b: self.groups[j].clone(),
                    p_value,
                    verdict: Significance::from_p(p_value),
                });
            }
        }
        rows
    }

    /// Count of unordered pairs whose adjusted p-value falls below 0.05.
    pub fn n_significant(&self) -> usize {
        let k = self.groups.len();
        let mut count = 0;
        for i in 0..k {
            for j in i + 1..k {
                if Significance::from_p(self.adjusted_p[(i, j)]) == Significance::Significant {
                    count += 1;
                }
            }
        }
        count
    }
}

impl fmt::Display for DunnResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            writeln!(
                f,
                "  {} vs {}: p={:.4} -> {}",
                row.group_a, row.group_b, row.p_value, row.verdict
            )?;
        }
        Ok(())
    }
}

/// Run the Dunn test using the groups' own names.
pub fn dunn_test(groups: &[SampleGroup]) -> Result<DunnResult> {
    let names: Vec<String> = groups.iter().map(|g| g.name().to_string()).collect();
    dunn_test_named(groups, &names)
}

/// Run the Dunn test with explicit group names.
///
/// Pools all observations, assigns average ranks, and compares mean ranks
/// per pair:
///
/// `z = (R̄ᵢ − R̄ⱼ) / sqrt((N(N+1)/12 − Σ(t³−t)/(12(N−1))) · (1/nᵢ + 1/nⱼ))`
///
/// Two-sided p-values are Bonferroni-adjusted (multiplied by the number of
/// unordered comparisons, capped at 1.0).
///
/// # Arguments
/// * `groups` - Two or more non-empty groups.
/// * `names` - Display names, one per group.
///
/// Fails with `ShapeMismatch` when the name count disagrees with the group
/// count.
pub fn dunn_test_named(groups: &[SampleGroup], names: &[String]) -> Result<DunnResult> {
    if groups.len() != names.len() {
        return Err(MetaboError::ShapeMismatch {
            groups: groups.len(),
            names: names.len(),
        });
    }
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

    let mut mean_ranks = Vec::with_capacity(groups.len());
    let mut offset = 0;
    for group in groups {
        let n_j = group.len();
        let r_j: f64 = ranks[offset..offset + n_j].iter().sum();
        mean_ranks.push(r_j / n_j as f64);
        offset += n_j;
    }

    // pooled variance of mean-rank differences, tie-corrected
    let tie_term = tie_adjustment(&pooled) / (12.0 * (n_total - 1.0));
    let variance_base = n_total * (n_total + 1.0) / 12.0 - tie_term;
    if variance_base <= 0.0 {
        return Err(MetaboError::StatisticalPrecondition {
            test: "Dunn",
            reason: "all observations are identical".to_string(),
        });
    }

    let k = groups.len();
    let n_comparisons = k * (k - 1) / 2;
    let normal = Normal::new(0.0, 1.0).unwrap();

    let mut statistics = DMatrix::zeros(k, k);
    let mut adjusted_p = DMatrix::from_element(k, k, 1.0);

    for i in 0..k {
        for j in i + 1..k {
            let inv_n = 1.0 / groups[i].len() as f64 + 1.0 / groups[j].len() as f64;
            let z = (mean_ranks[i] - mean_ranks[j]) / (variance_base * inv_n).sqrt();
            let raw_p = 2.0 * (1.0 - normal.cdf(z.abs()));
            let adj = (raw_p * n_comparisons as f64).min(1.0);

            statistics[(i, j)] = z;
            statistics[(j, i)] = -z;
            adjusted_p[(i, j)] = adj;
            adjusted_p[(j, i)] = adj;
        }
    }

    Ok(DunnResult {
        groups: names.to_vec(),
        statistics,
        adjusted_p,
        n_comparisons,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn group(name: &str, values: &[f64]) -> SampleGroup {
        SampleGroup::new(name, values.to_vec()).unwrap()
    }

    fn three_groups() -> Vec<SampleGroup> {
        vec![
            group("h2o", &[1.0, 2.0, 3.0, 4.0]),
            group("asp", &[10.0, 11.0, 12.0, 13.0]),
            group("glu", &[5.0, 6.0, 7.0, 8.0]),
        ]
    }

    #[test]
    fn test_table_shape_includes_diagonal() {
        let result = dunn_test(&three_groups()).unwrap();
        let rows = result.rows();
        assert_eq!(rows.len(), 9);
        let diagonal: Vec<&DunnRow> = rows.iter().filter(|r| r.group_a == r.group_b).collect();
        assert_eq!(diagonal.len(), 3);
        for row in diagonal {
            assert_relative_eq!(row.p_value, 1.0);
            assert_eq!(row.verdict, Significance::NotSignificant);
        }
    }

    #[test]
    fn test_symmetry() {
        let result = dunn_test(&three_groups()).unwrap();
        assert_relative_eq!(
            result.p_between("h2o", "asp").unwrap(),
            result.p_between("asp", "h2o").unwrap()
        );
        assert_relative_eq!(
            result.statistics[(0, 1)],
            -result.statistics[(1, 0)],
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_separated_groups_significant() {
        let result = dunn_test(&three_groups()).unwrap();
        // h2o and asp are fully separated in rank space
        assert!(result.p_between("h2o", "asp").unwrap() < 0.05);
        assert!(result.n_significant() >= 1);
    }

    #[test]
    fn test_identical_groups_no_pair_significant() {
        let groups = vec![
            group("a", &[1.0, 2.0, 3.0]),
            group("b", &[1.0, 2.0, 3.0]),
            group("c", &[1.0, 2.0, 3.0]),
        ];
        let result = dunn_test(&groups).unwrap();
        assert_eq!(result.n_significant(), 0);
        for row in result.rows() {
            assert_relative_eq!(row.p_value, 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_bonferroni_caps_at_one() {
        let result = dunn_test(&three_groups()).unwrap();
        for row in result.rows() {
            assert!(row.p_value <= 1.0);
            assert!(row.p_value >= 0.0);
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let groups = three_groups();
        let names = vec!["a".to_string(), "b".to_string()];
        let err = dunn_test_named(&groups, &names).unwrap_err();
        assert!(matches!(
            err,
            MetaboError::ShapeMismatch { groups: 3, names: 2 }
        ));
    }

    #[test]
    fn test_comparison_count() {
        let result = dunn_test(&three_groups()).unwrap();
        assert_eq!(result.n_comparisons, 3);
    }
}
