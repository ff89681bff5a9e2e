//! Raw instrument export table
//!
//! A string-typed, ordered table exactly as read from the instrument CSV,
//! before any column selection or value coercion.

use std::collections::HashSet;

use crate::error::{QpcrError, Result};

/// Prefix given to header cells that carry no name
pub const UNNAMED_PREFIX: &str = "Unnamed";

/// One instrument measurement row after column selection
#[derive(Debug, Clone, PartialEq)]
pub struct RawReading {
    /// Sample identifier (may be a control or a water blank)
    pub sample: String,
    /// Detector / gene identifier
    pub detector: String,
    /// Ct value, NaN when missing
    pub ct: f64,
}

impl RawReading {
    pub fn new(sample: &str, detector: &str, ct: f64) -> Self {
        Self {
            sample: sample.to_string(),
            detector: detector.to_string(),
            ct,
        }
    }
}

/// Give every header cell a unique name.
///
/// Empty cells become `Unnamed: {index}` and repeated names get `.1`, `.2`, ...
/// appended, so a Fluidigm export with two `Name` columns yields `Name` and `Name.1`.
fn mangle_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut result = Vec::with_capacity(raw.len());

    for (i, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("{}: {}", UNNAMED_PREFIX, i)
        } else {
            name
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        if candidate != base {
            log::debug!("Duplicate header '{}' renamed to '{}'", base, candidate);
        }
        seen.insert(candidate.clone());
        result.push(candidate);
    }
    result
}

/// Ordered table with named columns, all cells kept as text
#[derive(Debug, Clone)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table from a header row and data rows.
    ///
    /// Rows shorter than the header are padded with empty cells; rows longer
    /// than the header are rejected.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let headers = mangle_headers(headers);
        let n_cols = headers.len();

        let mut padded = Vec::with_capacity(rows.len());
        for (i, mut row) in rows.into_iter().enumerate() {
            if row.len() > n_cols {
                return Err(QpcrError::InvalidFormat {
                    reason: format!(
                        "Data row {} has {} fields, header has {}",
                        i + 1,
                        row.len(),
                        n_cols
                    ),
                });
            }
            row.resize(n_cols, String::new());
            padded.push(row);
        }

        Ok(Self {
            headers,
            rows: padded,
        })
    }

    /// Column names after mangling
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.headers.len()
    }

    /// Get column index by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Get all cells of a named column
    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| QpcrError::MissingColumn {
                column: name.to_string(),
            })?;
        Ok(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }

    /// Remove placeholder columns that the export emits without a header
    pub fn drop_unnamed(&self) -> Self {
        let keep: Vec<usize> = (0..self.headers.len())
            .filter(|&j| !self.headers[j].starts_with(UNNAMED_PREFIX))
            .collect();

        if keep.len() < self.headers.len() {
            log::debug!(
                "Dropping {} unnamed column(s)",
                self.headers.len() - keep.len()
            );
        }

        Self {
            headers: keep.iter().map(|&j| self.headers[j].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| keep.iter().map(|&j| row[j].clone()).collect())
                .collect(),
        }
    }
}
