//! Canonical sample x detector matrix of Ct values

use std::collections::HashSet;
use std::fmt::Write as _;

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{QpcrError, Result};
use crate::stats::round_to;

/// Highest Ct the instrument reports as a real detection
pub const MAX_VALID_CT: f64 = 50.0;

/// Return the first duplicated name, if any
fn first_duplicate(names: &[String]) -> Option<&str> {
    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.as_str()) {
            return Some(name.as_str());
        }
    }
    None
}

/// A matrix of Ct values from a qPCR run
/// Rows are samples, columns are `gene_replicate` detectors.
/// Missing readings are stored as NaN.
#[derive(Debug, Clone)]
pub struct CtMatrix {
    /// Ct values (samples x columns)
    values: Array2<f64>,
    /// Sample identifiers (row labels)
    sample_ids: Vec<String>,
    /// Unique detector identifiers (column labels)
    column_ids: Vec<String>,
}

impl CtMatrix {
    /// Create a new Ct matrix, validating shape and label uniqueness
    pub fn new(
        values: Array2<f64>,
        sample_ids: Vec<String>,
        column_ids: Vec<String>,
    ) -> Result<Self> {
        let (n_samples, n_columns) = values.dim();

        if sample_ids.len() != n_samples {
            return Err(QpcrError::DimensionMismatch {
                expected: format!("{} sample IDs", n_samples),
                got: format!("{} sample IDs", sample_ids.len()),
            });
        }

        if column_ids.len() != n_columns {
            return Err(QpcrError::DimensionMismatch {
                expected: format!("{} column IDs", n_columns),
                got: format!("{} column IDs", column_ids.len()),
            });
        }

        if let Some(dup) = first_duplicate(&sample_ids) {
            return Err(QpcrError::InvalidMatrix {
                reason: format!("Duplicate sample '{}'", dup),
            });
        }

        if let Some(dup) = first_duplicate(&column_ids) {
            return Err(QpcrError::InvalidMatrix {
                reason: format!("Duplicate column '{}'", dup),
            });
        }

        if values.iter().any(|x| x.is_infinite()) {
            return Err(QpcrError::InvalidMatrix {
                reason: "Ct values must be finite or missing".to_string(),
            });
        }

        // Hand-edited matrices may carry undetected readings; keep them but say so
        if values
            .iter()
            .any(|&x| !x.is_nan() && (x <= 0.0 || x > MAX_VALID_CT))
        {
            log::warn!(
                "Some Ct values lie outside (0, {}]. They will be used as-is.",
                MAX_VALID_CT
            );
        }

        Ok(Self {
            values,
            sample_ids,
            column_ids,
        })
    }

    /// Get the number of samples
    pub fn n_samples(&self) -> usize {
        self.values.nrows()
    }

    /// Get the number of detector columns
    pub fn n_columns(&self) -> usize {
        self.values.ncols()
    }

    /// Get the Ct values as a view
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Get sample IDs
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Get column IDs
    pub fn column_ids(&self) -> &[String] {
        &self.column_ids
    }

    /// Get sample index by ID
    pub fn sample_index(&self, sample_id: &str) -> Option<usize> {
        self.sample_ids.iter().position(|id| id == sample_id)
    }

    /// Get column index by ID
    pub fn column_index(&self, column_id: &str) -> Option<usize> {
        self.column_ids.iter().position(|id| id == column_id)
    }

    /// Get the Ct values of one column
    pub fn column(&self, column_idx: usize) -> ArrayView1<'_, f64> {
        self.values.column(column_idx)
    }

    /// Get a single Ct value, `None` when missing
    pub fn get(&self, sample_idx: usize, column_idx: usize) -> Option<f64> {
        let v = self.values[[sample_idx, column_idx]];
        if v.is_nan() {
            None
        } else {
            Some(v)
        }
    }

    /// Number of cells holding a Ct value
    pub fn n_present(&self) -> usize {
        self.values.iter().filter(|x| !x.is_nan()).count()
    }

    /// Copy of the matrix with every value rounded to `decimals` places
    pub fn rounded(&self, decimals: i32) -> Self {
        Self {
            values: self.values.mapv(|x| round_to(x, decimals)),
            sample_ids: self.sample_ids.clone(),
            column_ids: self.column_ids.clone(),
        }
    }

    /// Subset to the first `n` samples
    pub fn head(&self, n: usize) -> Self {
        let n = n.min(self.n_samples());
        let indices: Vec<usize> = (0..n).collect();
        Self {
            values: self.values.select(Axis(0), &indices),
            sample_ids: self.sample_ids[..n].to_vec(),
            column_ids: self.column_ids.clone(),
        }
    }

    /// Render the first `n` samples as an aligned text table
    pub fn preview(&self, n: usize) -> String {
        let head = self.head(n);

        let mut header = vec!["Sample".to_string()];
        header.extend(head.column_ids.iter().cloned());

        let mut lines: Vec<Vec<String>> = vec![header];
        for (i, sample) in head.sample_ids.iter().enumerate() {
            let mut line = vec![sample.clone()];
            line.extend(head.values.row(i).iter().map(|&v| {
                if v.is_nan() {
                    "NaN".to_string()
                } else {
                    v.to_string()
                }
            }));
            lines.push(line);
        }

        let n_cols = lines[0].len();
        let widths: Vec<usize> = (0..n_cols)
            .map(|j| lines.iter().map(|l| l[j].chars().count()).max().unwrap_or(0))
            .collect();

        let mut out = String::new();
        for line in &lines {
            let cells: Vec<String> = line
                .iter()
                .enumerate()
                .map(|(j, cell)| {
                    if j == 0 {
                        format!("{:<w$}", cell, w = widths[j])
                    } else {
                        format!("{:>w$}", cell, w = widths[j])
                    }
                })
                .collect();
            let _ = writeln!(out, "{}", cells.join("  ").trim_end());
        }
        let _ = write!(
            out,
            "[{} rows x {} columns]",
            self.n_samples(),
            self.n_columns()
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_ct_matrix_creation() {
        let values = array![[22.1, f64::NAN], [23.0, 24.5]];
        let matrix = CtMatrix::new(values, ids(&["S1", "S2"]), ids(&["GeneA_1", "GeneA_2"]))
            .unwrap();
        assert_eq!(matrix.n_samples(), 2);
        assert_eq!(matrix.n_columns(), 2);
        assert_eq!(matrix.n_present(), 3);
        assert_eq!(matrix.get(0, 1), None);
        assert_eq!(matrix.get(1, 1), Some(24.5));
        assert_eq!(matrix.sample_index("S2"), Some(1));
        assert_eq!(matrix.column_index("GeneA_3"), None);
    }

    #[test]
    fn test_duplicate_labels_rejected() {
        let values = array![[22.1, 22.3]];
        let result = CtMatrix::new(values.clone(), ids(&["S1"]), ids(&["GeneA_1", "GeneA_1"]));
        assert!(matches!(result, Err(QpcrError::InvalidMatrix { .. })));

        let values = array![[22.1], [22.3]];
        let result = CtMatrix::new(values, ids(&["S1", "S1"]), ids(&["GeneA_1"]));
        assert!(matches!(result, Err(QpcrError::InvalidMatrix { .. })));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let values = array![[22.1, 22.3]];
        let result = CtMatrix::new(values, ids(&["S1"]), ids(&["GeneA_1"]));
        assert!(matches!(result, Err(QpcrError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_rounded_keeps_missing() {
        let values = array![[22.126, f64::NAN]];
        let matrix = CtMatrix::new(values, ids(&["S1"]), ids(&["A_1", "A_2"]))
            .unwrap()
            .rounded(2);
        assert!((matrix.values()[[0, 0]] - 22.13).abs() < 1e-12);
        assert!(matrix.values()[[0, 1]].is_nan());
    }

    #[test]
    fn test_preview_limits_rows() {
        let values = array![[22.1], [23.0], [24.0]];
        let matrix = CtMatrix::new(values, ids(&["S1", "S2", "S3"]), ids(&["GeneA_1"])).unwrap();
        let text = matrix.preview(2);
        assert!(text.contains("S1"));
        assert!(text.contains("S2"));
        assert!(!text.contains("S3"));
        assert!(text.ends_with("[3 rows x 1 columns]"));
    }
}
