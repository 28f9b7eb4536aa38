//! Metabolomics group-comparison statistics with KEGG pathway context.
//!
//! This library analyzes metabolite abundance tables across experimental
//! conditions and enriches the result with metabolic pathway lookups.
//!
//! # Overview
//!
//! The library is organized into small composable modules:
//!
//! - **data**: Tabular input and named observation groups
//! - **stats**: Normality (Shapiro-Wilk), omnibus comparison
//!   (Kruskal-Wallis), post-hoc pairwise comparison (Dunn, Bonferroni)
//! - **kegg**: Pathway database client and lookup seam
//! - **pathway**: Per-compound pathway resolution and frequency tally
//! - **plot**: Horizontal bar chart of pathway frequencies
//! - **seq**: DNA sequence statistics (counts, codons, transcription,
//!   translation)
//! - **pipeline**: Configuration and the orchestrated analysis run
//!
//! # Example
//!
//! ```no_run
//! use metabostat::prelude::*;
//!
//! let mut config = AnalysisConfig::new("metabolites.csv");
//! config.chart_path = Some("pathways.png".into());
//!
//! let client = KeggClient::new().unwrap();
//! let report = run_analysis(&config, Some(&client)).unwrap();
//! println!("{}", report);
//! ```

pub mod data;
pub mod error;
pub mod kegg;
pub mod pathway;
pub mod pipeline;
pub mod plot;
pub mod seq;
pub mod stats;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::data::{SampleGroup, SampleTable};
    pub use crate::error::{MetaboError, Result};
    pub use crate::kegg::{clean_ids, KeggClient, PathwayLookup, UNKNOWN_NAME};
    pub use crate::pathway::{resolve_pathways, PathwayFrequency, PathwayReport};
    pub use crate::pipeline::{run_analysis, AnalysisConfig, AnalysisReport, StageError};
    pub use crate::plot::plot_pathway_frequencies;
    pub use crate::seq::{CodonFrequency, DnaSequence, NucleotideCounts};
    pub use crate::stats::{
        dunn_test, dunn_test_named, kruskal_wallis, shapiro_per_group, shapiro_wilk, DunnResult,
        KruskalResult, Normality, NormalityReport, ShapiroResult, Significance, ALPHA,
    };
}
