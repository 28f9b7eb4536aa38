//! Pathway resolution and frequency aggregation across compounds.

use crate::kegg::{PathwayLookup, UNKNOWN_NAME};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Resolved pathways for one compound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundPathways {
    /// Compound identifier as queried.
    pub compound: String,
    /// Display name, or the sentinel when the name lookup failed.
    pub name: String,
    /// Associated pathway identifiers, deduplicated per compound.
    pub pathways: Vec<String>,
}

/// A compound whose pathway lookup failed entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupFailure {
    pub id: String,
    pub reason: String,
}

/// Occurrence count for one pathway across all queried compounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathwayFrequency {
    /// Pathway identifier.
    pub pathway: String,
    /// Display name, or the sentinel when the name lookup failed.
    pub name: String,
    /// Number of compounds associated with this pathway.
    pub count: usize,
}

/// Full pathway-analysis output: per-compound resolutions, per-compound
/// failures, and the aggregated frequency table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathwayReport {
    pub compounds: Vec<CompoundPathways>,
    pub failures: Vec<LookupFailure>,
    /// Sorted by count descending, then pathway id ascending.
    pub frequencies: Vec<PathwayFrequency>,
}

impl PathwayReport {
    /// Total number of (compound, pathway) associations counted.
    pub fn total_associations(&self) -> usize {
        self.frequencies.iter().map(|f| f.count).sum()
    }
}

impl fmt::Display for PathwayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for compound in &self.compounds {
            writeln!(
                f,
                "  {} ({}): {} pathway(s)",
                compound.compound,
                compound.name,
                compound.pathways.len()
            )?;
        }
        if !self.frequencies.is_empty() {
            writeln!(f, "  Frequencies:")?;
            for freq in &self.frequencies {
                writeln!(f, "    {} ({}): {}", freq.pathway, freq.name, freq.count)?;
            }
        }
        for failure in &self.failures {
            writeln!(f, "  {}: lookup failed ({})", failure.id, failure.reason)?;
        }
        Ok(())
    }
}

/// Resolve names and pathway sets for a list of compound ids and tally how
/// often each pathway occurs.
///
/// Every lookup runs inside its own failure boundary: a failed name lookup
/// degrades to the sentinel name, a failed pathway lookup records a failure
/// row, and neither stops the remaining compounds. Each unique pathway is
/// counted once per compound.
pub fn resolve_pathways(ids: &[String], lookup: &dyn PathwayLookup) -> PathwayReport {
    let mut compounds = Vec::new();
    let mut failures = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for id in ids {
        let name = match lookup.compound_name(id) {
            Ok(name) => name,
            Err(e) => {
                warn!("compound name lookup failed for '{}': {}", id, e);
                UNKNOWN_NAME.to_string()
            }
        };

        match lookup.compound_pathways(id) {
            Ok(pathways) => {
                for pathway in &pathways {
                    *counts.entry(pathway.clone()).or_insert(0) += 1;
                }
                compounds.push(CompoundPathways {
                    compound: id.clone(),
                    name,
                    pathways,
                });
            }
            Err(e) => {
                warn!("pathway lookup failed for '{}': {}", id, e);
                failures.push(LookupFailure {
                    id: id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    // each distinct pathway appears once in the tally, so every name is
    // resolved exactly once
    let mut frequencies: Vec<PathwayFrequency> = counts
        .into_iter()
        .map(|(pathway, count)| {
            let name = match lookup.pathway_name(&pathway) {
                Ok(name) => name,
                Err(e) => {
                    warn!("pathway name lookup failed for '{}': {}", pathway, e);
                    UNKNOWN_NAME.to_string()
                }
            };
            PathwayFrequency {
                pathway,
                name,
                count,
            }
        })
        .collect();

    frequencies.sort_by(|a, b| b.count.cmp(&a.count).then(a.pathway.cmp(&b.pathway)));

    info!(
        "resolved {} compounds ({} failures), {} distinct pathways",
        compounds.len(),
        failures.len(),
        frequencies.len()
    );

    PathwayReport {
        compounds,
        failures,
        frequencies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MetaboError, Result};

    /// In-memory lookup double with a configurable failing compound.
    struct MockLookup {
        pathways: HashMap<&'static str, Vec<&'static str>>,
        failing: Option<&'static str>,
    }

    impl MockLookup {
        fn new() -> Self {
            let mut pathways = HashMap::new();
            pathways.insert("C1", vec!["map1", "map2"]);
            pathways.insert("C2", vec!["map1"]);
            pathways.insert("C3", vec!["map1", "map3"]);
            Self {
                pathways,
                failing: None,
            }
        }
    }

    impl PathwayLookup for MockLookup {
        fn compound_name(&self, id: &str) -> Result<String> {
            if id == "C3" {
                return Err(MetaboError::LookupUnavailable {
                    id: id.to_string(),
                    reason: "no NAME field".to_string(),
                });
            }
            Ok(format!("name-of-{}", id))
        }

        fn compound_pathways(&self, id: &str) -> Result<Vec<String>> {
            if self.failing == Some(id) {
                return Err(MetaboError::LookupUnavailable {
                    id: id.to_string(),
                    reason: "HTTP 404".to_string(),
                });
            }
            self.pathways
                .get(id)
                .map(|p| p.iter().map(|s| s.to_string()).collect())
                .ok_or_else(|| MetaboError::LookupUnavailable {
                    id: id.to_string(),
                    reason: "unknown compound".to_string(),
                })
        }

        fn pathway_name(&self, id: &str) -> Result<String> {
            if id == "map3" {
                return Err(MetaboError::LookupUnavailable {
                    id: id.to_string(),
                    reason: "HTTP 500".to_string(),
                });
            }
            Ok(format!("pathway-{}", id))
        }
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_frequency_tally() {
        let report = resolve_pathways(&ids(&["C1", "C2", "C3"]), &MockLookup::new());
        assert_eq!(report.compounds.len(), 3);
        assert!(report.failures.is_empty());

        // map1 in all three compounds, then map2/map3 tie broken by id
        assert_eq!(report.frequencies[0].pathway, "map1");
        assert_eq!(report.frequencies[0].count, 3);
        assert_eq!(report.frequencies[1].pathway, "map2");
        assert_eq!(report.frequencies[2].pathway, "map3");
    }

    #[test]
    fn test_counts_sum_to_associations() {
        let report = resolve_pathways(&ids(&["C1", "C2", "C3"]), &MockLookup::new());
        let associations: usize = report.compounds.iter().map(|c| c.pathways.len()).sum();
        assert_eq!(report.total_associations(), associations);
        assert_eq!(report.total_associations(), 5);
    }

    #[test]
    fn test_failed_lookup_does_not_stop_processing() {
        let mut lookup = MockLookup::new();
        lookup.failing = Some("C2");

        let report = resolve_pathways(&ids(&["C1", "C2", "C3"]), &lookup);
        assert_eq!(report.compounds.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id, "C2");
        // C3 was processed after the failure
        assert!(report.compounds.iter().any(|c| c.compound == "C3"));
        // map1 now counted for C1 and C3 only
        assert_eq!(report.frequencies[0].count, 2);
    }

    #[test]
    fn test_name_failures_degrade_to_sentinel() {
        let report = resolve_pathways(&ids(&["C3"]), &MockLookup::new());
        assert_eq!(report.compounds[0].name, UNKNOWN_NAME);
        let map3 = report
            .frequencies
            .iter()
            .find(|f| f.pathway == "map3")
            .unwrap();
        assert_eq!(map3.name, UNKNOWN_NAME);
    }

    #[test]
    fn test_empty_input() {
        let report = resolve_pathways(&[], &MockLookup::new());
        assert!(report.compounds.is_empty());
        assert!(report.frequencies.is_empty());
        assert_eq!(report.total_associations(), 0);
    }
}
