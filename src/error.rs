//! Error types for the metabostat library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum MetaboError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("statistical precondition violated in {test}: {reason}")]
    StatisticalPrecondition { test: &'static str, reason: String },

    #[error("comparison requires at least {needed} non-empty groups, got {got}")]
    InsufficientGroups { needed: usize, got: usize },

    #[error("group/name count mismatch: {groups} groups but {names} names")]
    ShapeMismatch { groups: usize, names: usize },

    #[error("lookup for '{id}' unavailable: {reason}")]
    LookupUnavailable { id: String, reason: String },

    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("empty data: {0}")]
    EmptyData(String),

    #[error("invalid base '{base}' at position {position}")]
    InvalidSequence { position: usize, base: char },

    #[error("plot error: {0}")]
    Plot(String),

    #[error("pipeline error: {0}")]
    Pipeline(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, MetaboError>;
