//! Pipeline runner for the metabolomics group-comparison analysis.

use crate::data::{SampleGroup, SampleTable};
use crate::error::{MetaboError, Result};
use crate::kegg::{self, PathwayLookup};
use crate::pathway::{resolve_pathways, PathwayReport};
use crate::plot::plot_pathway_frequencies;
use crate::stats::{dunn_test, kruskal_wallis, shapiro_per_group};
use crate::stats::{DunnResult, KruskalResult, NormalityReport};
use log::{info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Column-name suffixes excluded from the analysis.
pub const SUFFIX_BLACKLIST: [&str; 2] = ["sc", "EXTRA"];

/// Sample columns follow a `<prefix>.<3-letter-code>_<replicate>` naming
/// convention; everything else is dropped before condition selection.
pub const SAMPLE_COLUMN_PATTERN: &str = r".*\.\w{3}_.*";

/// Explicit configuration for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Path to the metabolite table (CSV or TSV).
    pub data_path: PathBuf,
    /// First experimental condition, matched as a column-name substring.
    pub condition1: String,
    /// Second experimental condition, matched as a column-name substring.
    pub condition2: String,
    /// Label identifying the water-control columns.
    pub water_label: String,
    /// Name of the compound identifier column.
    pub kegg_column: String,
    /// Where to write the pathway frequency chart; `None` skips the chart.
    pub chart_path: Option<PathBuf>,
    /// Base URL of the pathway lookup service.
    pub kegg_base_url: String,
    /// Timeout in seconds for a single lookup request.
    pub kegg_timeout_secs: u64,
    /// Cap on the number of compounds resolved; `None` resolves all.
    pub max_compounds: Option<usize>,
}

impl AnalysisConfig {
    /// Configuration with the conventional defaults for the E. coli
    /// metabolite tables this tool was built around.
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            condition1: "asp".to_string(),
            condition2: "glu".to_string(),
            water_label: "h2o".to_string(),
            kegg_column: "KEGG ids".to_string(),
            chart_path: None,
            kegg_base_url: kegg::DEFAULT_BASE_URL.to_string(),
            kegg_timeout_secs: kegg::DEFAULT_TIMEOUT.as_secs(),
            max_compounds: None,
        }
    }

    /// Load from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(MetaboError::from)
    }

    /// Save to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(MetaboError::from)
    }
}

/// A stage that failed without aborting the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageError {
    pub stage: String,
    pub message: String,
}

/// Aggregated output of one analysis run: every stage's successes plus the
/// per-stage failures. The pipeline always completes; only a missing or
/// unreadable input table aborts it.
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub condition1: String,
    pub condition2: String,
    pub normality: NormalityReport,
    pub comparison: Option<KruskalResult>,
    pub posthoc: Option<DunnResult>,
    pub pathways: Option<PathwayReport>,
    pub chart: Option<PathBuf>,
    pub stage_errors: Vec<StageError>,
}

impl AnalysisReport {
    fn record(&mut self, stage: &str, error: &MetaboError) {
        warn!("stage '{}' failed: {}", stage, error);
        self.stage_errors.push(StageError {
            stage: stage.to_string(),
            message: error.to_string(),
        });
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Metabolomics Group Comparison")?;
        writeln!(f, "=============================")?;
        writeln!(f)?;
        writeln!(
            f,
            "Conditions: {} vs {} (water control)",
            self.condition1, self.condition2
        )?;
        writeln!(f)?;

        writeln!(f, "Normality (Shapiro-Wilk):")?;
        if self.normality.is_empty() {
            writeln!(f, "  no groups tested")?;
        } else {
            write!(f, "{}", self.normality)?;
        }
        writeln!(f)?;

        writeln!(f, "Omnibus comparison (Kruskal-Wallis):")?;
        match &self.comparison {
            Some(result) => writeln!(f, "  {}", result)?,
            None => writeln!(f, "  not run")?,
        }
        writeln!(f)?;

        writeln!(f, "Post-hoc (Dunn, Bonferroni-adjusted):")?;
        match &self.posthoc {
            Some(result) => write!(f, "{}", result)?,
            None => writeln!(f, "  not run")?,
        }
        writeln!(f)?;

        writeln!(f, "Metabolic pathways:")?;
        match &self.pathways {
            Some(report) => write!(f, "{}", report)?,
            None => writeln!(f, "  not resolved")?,
        }

        if let Some(chart) = &self.chart {
            writeln!(f)?;
            writeln!(f, "Chart written to {}", chart.display())?;
        }

        if !self.stage_errors.is_empty() {
            writeln!(f)?;
            writeln!(f, "Stage errors:")?;
            for error in &self.stage_errors {
                writeln!(f, "  {}: {}", error.stage, error.message)?;
            }
        }
        Ok(())
    }
}

/// Run the full analysis described by the configuration.
///
/// Stages: load table, filter columns, per-column normality, omnibus and
/// post-hoc comparison on per-condition row means, pathway resolution, and
/// optionally the frequency chart. Every stage after loading runs inside
/// its own failure boundary and a failure is recorded in the report instead
/// of aborting the run. Pass `None` as the lookup to skip pathway
/// resolution entirely.
pub fn run_analysis(
    config: &AnalysisConfig,
    lookup: Option<&dyn PathwayLookup>,
) -> Result<AnalysisReport> {
    // the one fatal condition: the input table cannot be read
    let table = SampleTable::from_path(&config.data_path)?;
    info!(
        "loaded {} rows x {} columns from {}",
        table.n_rows(),
        table.n_cols(),
        config.data_path.display()
    );

    let pattern = Regex::new(SAMPLE_COLUMN_PATTERN)
        .map_err(|e| MetaboError::Pipeline(format!("invalid column pattern: {}", e)))?;
    let filtered = table.drop_suffixes(&SUFFIX_BLACKLIST).retain_pattern(&pattern);

    let condition1_cols = filtered.columns_containing(&config.condition1);
    let condition2_cols = filtered.columns_containing(&config.condition2);
    // water controls are selected from the raw table; they do not follow
    // the sample naming convention
    let water_cols = table.columns_containing(&config.water_label);

    let mut report = AnalysisReport {
        condition1: config.condition1.clone(),
        condition2: config.condition2.clone(),
        normality: NormalityReport {
            rows: vec![],
            failures: vec![],
        },
        comparison: None,
        posthoc: None,
        pathways: None,
        chart: None,
        stage_errors: Vec::new(),
    };

    for (label, cols) in [
        (&config.water_label, &water_cols),
        (&config.condition1, &condition1_cols),
        (&config.condition2, &condition2_cols),
    ] {
        if cols.is_empty() {
            report.record(
                "columns",
                &MetaboError::MissingColumn(format!("no columns matching '{}'", label)),
            );
        }
    }

    // normality per replicate column, each column its own group
    let mut replicate_groups = Vec::new();
    for (source, cols) in [(&table, &water_cols), (&filtered, &condition1_cols), (&filtered, &condition2_cols)]
    {
        for name in cols.iter() {
            match source
                .numeric_column(name)
                .and_then(|col| SampleGroup::from_observations(name.clone(), col))
            {
                Ok(group) => replicate_groups.push(group),
                Err(e) => report.record("normality", &e),
            }
        }
    }
    report.normality = shapiro_per_group(&replicate_groups);

    // omnibus + post-hoc on the per-row mean of each column set
    match mean_groups(&table, &filtered, config, &water_cols, &condition1_cols, &condition2_cols) {
        Ok(groups) => {
            match kruskal_wallis(&groups) {
                Ok(result) => report.comparison = Some(result),
                Err(e) => report.record("comparison", &e),
            }
            match dunn_test(&groups) {
                Ok(result) => report.posthoc = Some(result),
                Err(e) => report.record("posthoc", &e),
            }
        }
        Err(e) => report.record("comparison", &e),
    }

    // pathway resolution, one compound per request
    if let Some(lookup) = lookup {
        match table.string_column(&config.kegg_column) {
            Ok(raw_ids) => {
                let mut ids = kegg::clean_ids(&raw_ids);
                if let Some(cap) = config.max_compounds {
                    if ids.len() > cap {
                        info!("resolving {} of {} compounds (--max-compounds)", cap, ids.len());
                        ids.truncate(cap);
                    }
                }
                report.pathways = Some(resolve_pathways(&ids, lookup));
            }
            Err(e) => report.record("pathways", &e),
        }
    } else {
        info!("pathway resolution skipped (offline)");
    }

    if let Some(chart_path) = &config.chart_path {
        let outcome = report
            .pathways
            .as_ref()
            .map(|pathways| plot_pathway_frequencies(pathways, chart_path));
        match outcome {
            Some(Ok(())) => report.chart = Some(chart_path.clone()),
            Some(Err(e)) => report.record("chart", &e),
            None => {}
        }
    }

    Ok(report)
}

fn mean_groups(
    table: &SampleTable,
    filtered: &SampleTable,
    config: &AnalysisConfig,
    water_cols: &[String],
    condition1_cols: &[String],
    condition2_cols: &[String],
) -> Result<Vec<SampleGroup>> {
    let water = SampleGroup::from_observations("H2O", table.row_means(water_cols)?)?;
    let condition1 = SampleGroup::from_observations(
        config.condition1.clone(),
        filtered.row_means(condition1_cols)?,
    )?;
    let condition2 = SampleGroup::from_observations(
        config.condition2.clone(),
        filtered.row_means(condition2_cols)?,
    )?;
    Ok(vec![water, condition1, condition2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_yaml_roundtrip() {
        let mut config = AnalysisConfig::new("data.csv");
        config.chart_path = Some(PathBuf::from("chart.png"));
        config.max_compounds = Some(25);

        let yaml = config.to_yaml().unwrap();
        let loaded = AnalysisConfig::from_yaml(&yaml).unwrap();
        assert_eq!(loaded.condition1, "asp");
        assert_eq!(loaded.condition2, "glu");
        assert_eq!(loaded.chart_path, Some(PathBuf::from("chart.png")));
        assert_eq!(loaded.max_compounds, Some(25));
    }

    #[test]
    fn test_missing_input_is_fatal() {
        let config = AnalysisConfig::new("/nonexistent/metabolites.csv");
        assert!(run_analysis(&config, None).is_err());
    }
}
