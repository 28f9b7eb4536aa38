//! Pipeline composition and execution for the metabolomics analysis.

mod runner;

pub use runner::{run_analysis, AnalysisConfig, AnalysisReport, StageError};
