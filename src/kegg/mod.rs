//! KEGG REST lookups for compound names and metabolic pathways.

use crate::error::{MetaboError, Result};
use std::time::Duration;

/// Base URL of the public KEGG REST service.
pub const DEFAULT_BASE_URL: &str = "https://rest.kegg.jp";

/// Default timeout for a single lookup request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Sentinel display name used when a lookup fails or returns no name.
pub const UNKNOWN_NAME: &str = "unknown";

/// Key -> value / key -> set lookups against the pathway database.
///
/// The seam between the analysis pipeline and the external service;
/// implemented by [`KeggClient`] and by in-memory doubles in tests.
pub trait PathwayLookup {
    /// Display name of a compound.
    fn compound_name(&self, id: &str) -> Result<String>;

    /// Pathway identifiers associated with a compound, deduplicated,
    /// first-seen order.
    fn compound_pathways(&self, id: &str) -> Result<Vec<String>>;

    /// Display name of a pathway.
    fn pathway_name(&self, id: &str) -> Result<String>;
}

/// Blocking HTTP client for the KEGG REST API.
pub struct KeggClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl KeggClient {
    /// Client against the public KEGG service with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Client against an arbitrary base URL with an explicit timeout.
    pub fn with_config(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MetaboError::Pipeline(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn fetch(&self, path: &str, id: &str) -> Result<String> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| MetaboError::LookupUnavailable {
                id: id.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetaboError::LookupUnavailable {
                id: id.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        response.text().map_err(|e| MetaboError::LookupUnavailable {
            id: id.to_string(),
            reason: e.to_string(),
        })
    }
}

impl PathwayLookup for KeggClient {
    fn compound_name(&self, id: &str) -> Result<String> {
        let body = self.fetch(&format!("get/{}", id), id)?;
        parse_name_field(&body).ok_or_else(|| MetaboError::LookupUnavailable {
            id: id.to_string(),
            reason: "entry has no NAME field".to_string(),
        })
    }

    fn compound_pathways(&self, id: &str) -> Result<Vec<String>> {
        let body = self.fetch(&format!("link/pathway/{}", id), id)?;
        Ok(parse_pathway_links(&body))
    }

    fn pathway_name(&self, id: &str) -> Result<String> {
        let body = self.fetch(&format!("get/{}", id), id)?;
        if let Some(name) = parse_name_field(&body) {
            return Ok(name);
        }
        // some pathway entries carry the name on the line after ENTRY
        body.lines()
            .nth(1)
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .ok_or_else(|| MetaboError::LookupUnavailable {
                id: id.to_string(),
                reason: "entry has no NAME field".to_string(),
            })
    }
}

/// Prepare raw identifier cells for lookup requests.
///
/// Trims whitespace, drops empty entries, and percent-encodes embedded
/// spaces.
pub fn clean_ids(ids: &[String]) -> Vec<String> {
    ids.iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(|id| id.replace(' ', "%20"))
        .collect()
}

/// Extract the first NAME field from a KEGG flat-file entry.
pub fn parse_name_field(body: &str) -> Option<String> {
    body.lines()
        .find(|line| line.starts_with("NAME"))
        .map(|line| {
            line.trim_start_matches("NAME")
                .trim()
                .trim_end_matches(';')
                .to_string()
        })
        .filter(|name| !name.is_empty())
}

/// Extract linked pathway identifiers from a `link/pathway` response.
///
/// Each line is `<compound>\t<pathway>`; duplicates are removed while
/// preserving first-seen order.
pub fn parse_pathway_links(body: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut pathways = Vec::new();
    for line in body.lines() {
        let mut parts = line.split('\t');
        let (Some(_), Some(pathway)) = (parts.next(), parts.next()) else {
            continue;
        };
        let pathway = pathway.trim();
        if !pathway.is_empty() && seen.insert(pathway.to_string()) {
            pathways.push(pathway.to_string());
        }
    }
    pathways
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_ids() {
        let ids = vec![
            " C00031 ".to_string(),
            "".to_string(),
            "path map00010".to_string(),
        ];
        assert_eq!(clean_ids(&ids), vec!["C00031", "path%20map00010"]);
    }

    #[test]
    fn test_parse_name_field() {
        let body = "ENTRY       C00031   Compound\nNAME        D-Glucose;\n            Grape sugar\nFORMULA     C6H12O6\n";
        assert_eq!(parse_name_field(body), Some("D-Glucose".to_string()));
    }

    #[test]
    fn test_parse_name_field_absent() {
        assert_eq!(parse_name_field("ENTRY  X\nFORMULA  C\n"), None);
    }

    #[test]
    fn test_parse_pathway_links_dedup() {
        let body = "cpd:C00031\tpath:map00010\ncpd:C00031\tpath:map00030\ncpd:C00031\tpath:map00010\n";
        assert_eq!(
            parse_pathway_links(body),
            vec!["path:map00010", "path:map00030"]
        );
    }

    #[test]
    fn test_parse_pathway_links_skips_malformed() {
        let body = "no-tab-here\ncpd:C00031\tpath:map00052\n\n";
        assert_eq!(parse_pathway_links(body), vec!["path:map00052"]);
    }
}
