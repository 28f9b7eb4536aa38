//! Shapiro-Wilk normality test.
//!
//! Implements the AS R94 algorithm (Royston 1995): order-statistic weights
//! from Blom scores with polynomial corrections for the two extreme
//! coefficients, and lognormal approximations for the null distribution of
//! W. Matches the algorithm behind R's `shapiro.test`.

use crate::data::SampleGroup;
use crate::error::{MetaboError, Result};
use crate::stats::Normality;
use log::warn;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::f64::consts::{FRAC_1_SQRT_2, PI};
use std::fmt;

/// Result of a Shapiro-Wilk test on one sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapiroResult {
    /// W statistic.
    pub statistic: f64,
    /// Upper-tail p-value.
    pub p_value: f64,
    /// Verdict at the fixed 0.05 threshold.
    pub verdict: Normality,
}

/// Normality results for a set of named groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalityReport {
    /// One row per group that could be tested.
    pub rows: Vec<NormalityRow>,
    /// Groups that failed the test's preconditions, with the reason.
    pub failures: Vec<(String, String)>,
}

/// Normality result for a single named group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalityRow {
    pub group: String,
    pub statistic: f64,
    pub p_value: f64,
    pub verdict: Normality,
}

impl NormalityReport {
    /// Number of groups tested plus groups that failed.
    pub fn len(&self) -> usize {
        self.rows.len() + self.failures.len()
    }

    /// True when no group was examined.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.failures.is_empty()
    }
}

impl fmt::Display for NormalityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(
                f,
                "  {}: W={:.4}, p={:.4} -> {}",
                row.group, row.statistic, row.p_value, row.verdict
            )?;
        }
        for (group, reason) in &self.failures {
            writeln!(f, "  {}: skipped ({})", group, reason)?;
        }
        Ok(())
    }
}

/// Run the Shapiro-Wilk test on a single sample.
///
/// # Arguments
/// * `sample` - Observations, missing values already excluded.
///
/// # Returns
/// `ShapiroResult` with the W statistic, p-value and verdict.
///
/// Fails with `StatisticalPrecondition` for fewer than 3 observations,
/// non-finite observations, or zero range.
pub fn shapiro_wilk(sample: &[f64]) -> Result<ShapiroResult> {
    let n = sample.len();
    if n < 3 {
        return Err(MetaboError::StatisticalPrecondition {
            test: "Shapiro-Wilk",
            reason: format!("needs at least 3 observations, got {}", n),
        });
    }
    if sample.iter().any(|v| !v.is_finite()) {
        return Err(MetaboError::StatisticalPrecondition {
            test: "Shapiro-Wilk",
            reason: "sample contains non-finite observations".to_string(),
        });
    }

    let mut x: Vec<f64> = sample.to_vec();
    x.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    if x[n - 1] - x[0] <= 0.0 {
        return Err(MetaboError::StatisticalPrecondition {
            test: "Shapiro-Wilk",
            reason: "sample has zero range".to_string(),
        });
    }

    let weights = sw_weights(n);
    let mean = x.iter().sum::<f64>() / n as f64;
    let ss: f64 = x.iter().map(|v| (v - mean) * (v - mean)).sum();
    let b: f64 = weights.iter().zip(&x).map(|(a, v)| a * v).sum();
    let statistic = ((b * b) / ss).min(1.0);
    let p_value = sw_p_value(statistic, n);

    Ok(ShapiroResult {
        statistic,
        p_value,
        verdict: Normality::from_p(p_value),
    })
}

/// Run the normality test for each group inside its own failure boundary.
///
/// A group that violates the test's preconditions is recorded as a failure
/// and does not abort the remaining groups.
pub fn shapiro_per_group(groups: &[SampleGroup]) -> NormalityReport {
    let mut rows = Vec::new();
    let mut failures = Vec::new();

    for group in groups {
        match shapiro_wilk(group.values()) {
            Ok(result) => rows.push(NormalityRow {
                group: group.name().to_string(),
                statistic: result.statistic,
                p_value: result.p_value,
                verdict: result.verdict,
            }),
            Err(e) => {
                warn!("normality test skipped for group '{}': {}", group.name(), e);
                failures.push((group.name().to_string(), e.to_string()));
            }
        }
    }

    NormalityReport { rows, failures }
}

/// Order-statistic weights, antisymmetric around the sample midpoint.
fn sw_weights(n: usize) -> Vec<f64> {
    if n == 3 {
        return vec![-FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2];
    }

    let normal = Normal::new(0.0, 1.0).unwrap();
    let nf = n as f64;

    // Blom scores for the expected order statistics
    let m: Vec<f64> = (1..=n)
        .map(|i| normal.inverse_cdf((i as f64 - 0.375) / (nf + 0.25)))
        .collect();
    let ssq_m: f64 = m.iter().map(|v| v * v).sum();

    let u = 1.0 / nf.sqrt();
    let a_n = m[n - 1] / ssq_m.sqrt()
        + 0.221157 * u
        - 0.147981 * u.powi(2)
        - 2.071190 * u.powi(3)
        + 4.434685 * u.powi(4)
        - 2.706056 * u.powi(5);

    let mut a = vec![0.0; n];
    a[n - 1] = a_n;
    a[0] = -a_n;

    if n > 5 {
        let a_n1 = m[n - 2] / ssq_m.sqrt()
            + 0.042981 * u
            - 0.293762 * u.powi(2)
            - 1.752461 * u.powi(3)
            + 5.682633 * u.powi(4)
            - 3.582633 * u.powi(5);
        a[n - 2] = a_n1;
        a[1] = -a_n1;

        let phi = (ssq_m - 2.0 * m[n - 1] * m[n - 1] - 2.0 * m[n - 2] * m[n - 2])
            / (1.0 - 2.0 * a_n * a_n - 2.0 * a_n1 * a_n1);
        let scale = phi.sqrt();
        for i in 2..n - 2 {
            a[i] = m[i] / scale;
        }
    } else {
        let phi = (ssq_m - 2.0 * m[n - 1] * m[n - 1]) / (1.0 - 2.0 * a_n * a_n);
        let scale = phi.sqrt();
        for i in 1..n - 1 {
            a[i] = m[i] / scale;
        }
    }

    a
}

/// Null-distribution p-value for W (Royston 1995).
fn sw_p_value(w: f64, n: usize) -> f64 {
    if n == 3 {
        // exact for n = 3
        let p = 6.0 / PI * (w.sqrt().asin() - 0.75_f64.sqrt().asin());
        return p.clamp(0.0, 1.0);
    }

    let normal = Normal::new(0.0, 1.0).unwrap();
    let nf = n as f64;
    let ln_one_minus_w = (1.0 - w).ln();

    let z = if n <= 11 {
        let g = -2.273 + 0.459 * nf;
        let mu = 0.5440 - 0.39978 * nf + 0.025054 * nf * nf - 0.0006714 * nf * nf * nf;
        let sigma = (1.3822 - 0.77857 * nf + 0.062767 * nf * nf - 0.0020322 * nf * nf * nf).exp();
        (-(g - ln_one_minus_w).ln() - mu) / sigma
    } else {
        let ln_n = nf.ln();
        let mu = -1.5861 - 0.31082 * ln_n - 0.083751 * ln_n * ln_n + 0.0038915 * ln_n.powi(3);
        let sigma = (-0.4803 - 0.082676 * ln_n + 0.0030302 * ln_n * ln_n).exp();
        (ln_one_minus_w - mu) / sigma
    };

    if z.is_nan() {
        return 1.0;
    }
    (1.0 - normal.cdf(z)).clamp(0.0, 1.0)
}
