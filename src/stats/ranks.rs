//! Rank assignment shared by the rank-based tests.

use std::cmp::Ordering;

/// Assign 1-based ranks, giving tied values the average of the ranks they
/// span.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(Ordering::Equal)
    });

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // ranks i+1 ..= j+1 collapse to their average
        let avg = (i + j + 2) as f64 / 2.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg;
        }
        i = j + 1;
    }
    ranks
}

/// Tie adjustment term Σ(t³ − t) over all tie groups.
///
/// Used by the Kruskal-Wallis correction factor and the Dunn variance term.
pub fn tie_adjustment(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mut adjustment = 0.0;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j + 1 < sorted.len() && sorted[j + 1] == sorted[i] {
            j += 1;
        }
        let t = (j - i + 1) as f64;
        adjustment += t * t * t - t;
        i = j + 1;
    }
    adjustment
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ranks_without_ties() {
        let ranks = average_ranks(&[30.0, 10.0, 20.0]);
        assert_eq!(ranks, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_ranks_with_ties() {
        // 1 1 2 3 -> ranks 1.5 1.5 3 4
        let ranks = average_ranks(&[1.0, 1.0, 2.0, 3.0]);
        assert_eq!(ranks, vec![1.5, 1.5, 3.0, 4.0]);
    }

    #[test]
    fn test_all_tied() {
        let ranks = average_ranks(&[5.0, 5.0, 5.0]);
        assert_eq!(ranks, vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_tie_adjustment() {
        // two tie groups of size 2: 2 * (8 - 2) = 12
        assert_relative_eq!(tie_adjustment(&[1.0, 1.0, 2.0, 2.0, 3.0]), 12.0);
        assert_relative_eq!(tie_adjustment(&[1.0, 2.0, 3.0]), 0.0);
    }
}
