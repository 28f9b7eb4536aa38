//! Statistical test suite: normality, omnibus comparison, post-hoc pairwise.

mod dunn;
mod kruskal;
mod ranks;
mod shapiro;

pub use dunn::{dunn_test, dunn_test_named, DunnResult, DunnRow};
pub use kruskal::{kruskal_wallis, KruskalResult};
pub use ranks::{average_ranks, tie_adjustment};
pub use shapiro::{shapiro_per_group, shapiro_wilk, NormalityReport, NormalityRow, ShapiroResult};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed significance threshold shared by every test.
pub const ALPHA: f64 = 0.05;

/// Normality verdict at the fixed 0.05 threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Normality {
    Normal,
    NotNormal,
}

impl Normality {
    /// A sample is called normal only when p strictly exceeds the threshold.
    pub fn from_p(p_value: f64) -> Self {
        if p_value > ALPHA {
            Normality::Normal
        } else {
            Normality::NotNormal
        }
    }
}

impl fmt::Display for Normality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Normality::Normal => write!(f, "Normal"),
            Normality::NotNormal => write!(f, "Not Normal"),
        }
    }
}

/// Significance verdict at the fixed 0.05 threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Significance {
    Significant,
    NotSignificant,
}

impl Significance {
    /// A difference is called significant only when p falls strictly below
    /// the threshold.
    pub fn from_p(p_value: f64) -> Self {
        if p_value < ALPHA {
            Significance::Significant
        } else {
            Significance::NotSignificant
        }
    }
}

impl fmt::Display for Significance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Significance::Significant => write!(f, "Significant"),
            Significance::NotSignificant => write!(f, "Not significant"),
        }
    }
}
