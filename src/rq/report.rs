//! Per-gene ddCt computation and report assembly

use serde::{Deserialize, Serialize};

use super::panel::GenePanel;
use super::ControlSet;
use crate::data::CtMatrix;
use crate::error::{QpcrError, Result};
use crate::stats::{finite, nan_mean, round2};

/// Role of a sample in the ddCt calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SampleType {
    Control,
    Sample,
}

impl std::fmt::Display for SampleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleType::Control => write!(f, "Control"),
            SampleType::Sample => write!(f, "Sample"),
        }
    }
}

/// One cell of a rendered report row
#[derive(Debug, Clone, PartialEq)]
pub enum ReportCell {
    Text(String),
    Number(f64),
    Empty,
}

impl From<Option<f64>> for ReportCell {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) => ReportCell::Number(v),
            None => ReportCell::Empty,
        }
    }
}

/// Report line for one sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    pub sample: String,
    pub sample_type: SampleType,
    /// Housekeeping Ct per replicate column
    pub housekeeping_ct: Vec<Option<f64>>,
    pub housekeeping_mean: Option<f64>,
    /// Target Ct per replicate column
    pub target_ct: Vec<Option<f64>>,
    pub target_mean: Option<f64>,
    pub dct: Option<f64>,
    /// Control mean dCt, only on the first control's row
    pub mean_dct: Option<f64>,
    pub ddct: Option<f64>,
    /// RQ rounded to 2 decimals
    pub rq: Option<f64>,
    /// Control mean RQ, only on the first control's row
    pub mean_rq: Option<f64>,
    /// Normalized RQ rounded to 2 decimals
    pub rq_norm: Option<f64>,
    /// Control mean normalized RQ, only on the first control's row
    pub mean_rq_norm: Option<f64>,
}

impl ReportRow {
    /// Cells in the same order as [`GeneReport::header`]
    pub fn cells(&self) -> Vec<ReportCell> {
        let mut cells = vec![
            ReportCell::Text(self.sample.clone()),
            ReportCell::Text(self.sample_type.to_string()),
        ];
        cells.extend(self.housekeeping_ct.iter().map(|&v| ReportCell::from(v)));
        cells.push(self.housekeeping_mean.into());
        cells.extend(self.target_ct.iter().map(|&v| ReportCell::from(v)));
        cells.push(self.target_mean.into());
        cells.push(self.dct.into());
        cells.push(self.mean_dct.into());
        cells.push(self.ddct.into());
        cells.push(self.rq.into());
        cells.push(self.mean_rq.into());
        cells.push(self.rq_norm.into());
        cells.push(self.mean_rq_norm.into());
        cells
    }
}

/// Relative expression report for one target gene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneReport {
    pub gene: String,
    pub housekeeping: String,
    pub housekeeping_columns: Vec<String>,
    pub target_columns: Vec<String>,
    /// Rows with all controls first
    pub rows: Vec<ReportRow>,
    pub control_dct_mean: f64,
    pub rq_control_mean: f64,
    /// Self-check value, 1.00 for a consistent computation
    pub control_rq_norm_mean: f64,
}

impl GeneReport {
    /// Column titles, starting with the sample label
    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["Sample".to_string(), "Type".to_string()];
        header.extend(self.housekeeping_columns.iter().cloned());
        header.push(format!("{} Mean", self.housekeeping));
        header.extend(self.target_columns.iter().cloned());
        header.push(format!("{} Mean", self.gene));
        header.extend(
            [
                "dCt",
                "Mean dCt",
                "ddCt",
                "RQ",
                "Mean RQ",
                "RQ (norm.)",
                "Mean RQ (norm.)",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        header
    }

    /// Find the row of a sample
    pub fn row(&self, sample: &str) -> Option<&ReportRow> {
        self.rows.iter().find(|r| r.sample == sample)
    }

    /// Whether the normalized control mean rounds to 1.00
    pub fn passes_self_check(&self) -> bool {
        (self.control_rq_norm_mean - 1.0).abs() < 1e-9
    }
}

/// Per-sample mean over the given columns, rounded to 2 decimals (NaN if no values)
pub fn row_means(matrix: &CtMatrix, columns: &[usize]) -> Vec<f64> {
    let values = matrix.values();
    (0..matrix.n_samples())
        .map(|i| {
            nan_mean(columns.iter().map(|&j| values[[i, j]]))
                .map(round2)
                .unwrap_or(f64::NAN)
        })
        .collect()
}

/// Mean over the control samples, rounded to 2 decimals
fn control_mean(values: &[f64], controls: &ControlSet, gene: &str, quantity: &str) -> Result<f64> {
    nan_mean(controls.indices().iter().map(|&i| values[i]))
        .map(round2)
        .ok_or_else(|| QpcrError::EmptyMean {
            gene: gene.to_string(),
            quantity: quantity.to_string(),
        })
}

/// Compute the ddCt report of one target gene
///
/// `housekeeping_mean` holds the rounded per-sample housekeeping means,
/// shared by all genes of a run.
pub fn compute_gene_report(
    matrix: &CtMatrix,
    panel: &GenePanel,
    gene: &str,
    housekeeping_mean: &[f64],
    controls: &ControlSet,
) -> Result<GeneReport> {
    let column_ids = matrix.column_ids();
    let target_columns = panel.target_columns_for(gene, column_ids);
    if target_columns.is_empty() {
        return Err(QpcrError::InvalidInput {
            reason: format!("No Ct columns for target gene '{}'", gene),
        });
    }

    let target_mean = row_means(matrix, &target_columns);

    let dct: Vec<f64> = target_mean
        .iter()
        .zip(housekeeping_mean)
        .map(|(t, h)| t - h)
        .collect();
    let control_dct_mean = control_mean(&dct, controls, gene, "mean control dCt")?;

    let ddct: Vec<f64> = dct.iter().map(|d| d - control_dct_mean).collect();
    let rq: Vec<f64> = ddct.iter().map(|dd| (-dd).exp2()).collect();
    let rq_control_mean = control_mean(&rq, controls, gene, "mean control RQ")?;

    let rq_norm: Vec<f64> = rq.iter().map(|r| r / rq_control_mean).collect();
    let control_rq_norm_mean = control_mean(&rq_norm, controls, gene, "mean normalized control RQ")?;

    if (control_rq_norm_mean - 1.0).abs() > 1e-9 {
        log::warn!(
            "{}: mean normalized RQ of controls is {:.2}, expected 1.00",
            gene,
            control_rq_norm_mean
        );
    }

    let first_control = controls.first();
    let mut rows: Vec<ReportRow> = matrix
        .sample_ids()
        .iter()
        .enumerate()
        .map(|(i, sample)| {
            let is_first = i == first_control;
            ReportRow {
                sample: sample.clone(),
                sample_type: if controls.contains(i) {
                    SampleType::Control
                } else {
                    SampleType::Sample
                },
                housekeeping_ct: panel
                    .housekeeping_columns()
                    .iter()
                    .map(|&j| matrix.get(i, j))
                    .collect(),
                housekeeping_mean: finite(housekeeping_mean[i]),
                target_ct: target_columns.iter().map(|&j| matrix.get(i, j)).collect(),
                target_mean: finite(target_mean[i]),
                dct: finite(dct[i]),
                mean_dct: is_first.then_some(control_dct_mean).and_then(finite),
                ddct: finite(ddct[i]),
                rq: finite(round2(rq[i])),
                mean_rq: is_first.then_some(rq_control_mean).and_then(finite),
                rq_norm: finite(round2(rq_norm[i])),
                mean_rq_norm: is_first.then_some(control_rq_norm_mean).and_then(finite),
            }
        })
        .collect();

    // stable: original order kept within each group
    rows.sort_by_key(|r| r.sample_type);

    Ok(GeneReport {
        gene: gene.to_string(),
        housekeeping: panel.housekeeping().to_string(),
        housekeeping_columns: panel
            .housekeeping_columns()
            .iter()
            .map(|&j| column_ids[j].clone())
            .collect(),
        target_columns: target_columns.iter().map(|&j| column_ids[j].clone()).collect(),
        rows,
        control_dct_mean,
        rq_control_mean,
        control_rq_norm_mean,
    })
}
