//! Tabular metabolite data with named columns.

use crate::error::{MetaboError, Result};
use csv::ReaderBuilder;
use log::debug;
use regex::Regex;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A table of named columns holding raw string cells.
///
/// Columns are either numeric sample columns (parsed on demand, with empty
/// cells and `NA`/`NaN` treated as missing) or identifier columns such as
/// "KEGG ids".
#[derive(Debug, Clone)]
pub struct SampleTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl SampleTable {
    /// Build a table from a header and data rows.
    ///
    /// Every row must have exactly one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if columns.is_empty() {
            return Err(MetaboError::EmptyData("table has no columns".to_string()));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(MetaboError::Pipeline(format!(
                    "row {} has {} cells, expected {}",
                    i,
                    row.len(),
                    columns.len()
                )));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Load a table from a CSV or TSV file.
    ///
    /// The delimiter is chosen by extension: `.tsv`/`.tab` files are
    /// tab-separated, everything else comma-separated.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let delimiter = match path.extension().and_then(|e| e.to_str()) {
            Some("tsv") | Some("tab") => b'\t',
            _ => b',',
        };
        let file = File::open(path)?;
        Self::from_reader(file, delimiter)
    }

    /// Load a table from any reader with an explicit delimiter.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        if rows.is_empty() {
            return Err(MetaboError::EmptyData("table has no data rows".to_string()));
        }

        Self::new(columns, rows)
    }

    /// Column names in file order.
    #[inline]
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Number of data rows.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| MetaboError::MissingColumn(name.to_string()))
    }

    fn subset(&self, keep: &[usize]) -> Self {
        let columns = keep.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Self { columns, rows }
    }

    /// Drop columns whose name ends with any of the given suffixes.
    pub fn drop_suffixes(&self, suffixes: &[&str]) -> Self {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !suffixes.iter().any(|s| self.columns[i].ends_with(s)))
            .collect();
        self.subset(&keep)
    }

    /// Keep only columns whose name matches the pattern.
    pub fn retain_pattern(&self, pattern: &Regex) -> Self {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| pattern.is_match(&self.columns[i]))
            .collect();
        self.subset(&keep)
    }

    /// Names of columns whose name contains the given substring.
    pub fn columns_containing(&self, substring: &str) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.contains(substring))
            .cloned()
            .collect()
    }

    /// Parse a column as numeric observations.
    ///
    /// Empty cells, `NA`, `NaN` and unparsable text become missing.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        Ok(self
            .rows
            .iter()
            .map(|row| parse_cell(&row[idx], name))
            .collect())
    }

    /// Non-empty trimmed cells of an identifier column.
    pub fn string_column(&self, name: &str) -> Result<Vec<String>> {
        let idx = self.column_index(name)?;
        Ok(self
            .rows
            .iter()
            .map(|row| row[idx].trim().to_string())
            .filter(|c| !c.is_empty())
            .collect())
    }

    /// Per-row mean across the named columns, skipping missing cells.
    ///
    /// A row with no observed value in any of the columns yields `None`.
    pub fn row_means(&self, names: &[String]) -> Result<Vec<Option<f64>>> {
        let indices: Vec<usize> = names
            .iter()
            .map(|n| self.column_index(n))
            .collect::<Result<_>>()?;

        Ok(self
            .rows
            .iter()
            .map(|row| {
                let observed: Vec<f64> = indices
                    .iter()
                    .filter_map(|&i| parse_cell(&row[i], &self.columns[i]))
                    .collect();
                if observed.is_empty() {
                    None
                } else {
                    Some(observed.iter().sum::<f64>() / observed.len() as f64)
                }
            })
            .collect())
    }
}

fn parse_cell(cell: &str, column: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("na") || cell.eq_ignore_ascii_case("nan") {
        return None;
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        Ok(_) => None,
        Err(_) => {
            debug!("unparsable cell '{}' in column '{}' treated as missing", cell, column);
            None
        }
    }
}
