//! Relative quantification (RQ) by the ddCt method
//!
//! For every target gene:
//! dCt = mean(target Ct) - mean(housekeeping Ct),
//! ddCt = dCt - mean(dCt of controls),
//! RQ = 2^(-ddCt), normalized by the mean RQ of the controls.

mod panel;
mod report;

pub use panel::{gene_of, GenePanel};
pub use report::{compute_gene_report, row_means, GeneReport, ReportCell, ReportRow, SampleType};

use crate::data::CtMatrix;
use crate::error::{QpcrError, Result};

/// Parameters for the RQ calculation
#[derive(Debug, Clone, Default)]
pub struct RqParams {
    /// Control sample identifiers; the first one carries the summary values
    pub controls: Vec<String>,
    /// Housekeeping gene, matched as a substring of column names
    pub housekeeping: String,
}

impl RqParams {
    pub fn new(controls: Vec<String>, housekeeping: &str) -> Self {
        Self {
            controls,
            housekeeping: housekeeping.trim().to_string(),
        }
    }

    /// Build from free text: whitespace separated controls and a housekeeping name
    pub fn from_text(controls: &str, housekeeping: &str) -> Self {
        Self::new(
            controls.split_whitespace().map(String::from).collect(),
            housekeeping,
        )
    }
}

/// Control samples resolved against a Ct matrix
#[derive(Debug, Clone)]
pub struct ControlSet {
    ids: Vec<String>,
    indices: Vec<usize>,
}

impl ControlSet {
    /// Look up every control in the matrix, failing with all unknown names
    pub fn resolve(matrix: &CtMatrix, controls: &[String]) -> Result<Self> {
        let mut ids: Vec<String> = Vec::with_capacity(controls.len());
        for c in controls {
            if !ids.contains(c) {
                ids.push(c.clone());
            }
        }

        if ids.is_empty() {
            return Err(QpcrError::NoControls);
        }

        let missing: Vec<String> = ids
            .iter()
            .filter(|id| matrix.sample_index(id).is_none())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(QpcrError::UnknownControls { missing });
        }

        let indices = ids
            .iter()
            .filter_map(|id| matrix.sample_index(id))
            .collect();

        Ok(Self { ids, indices })
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Matrix row indices, in the order the controls were given
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Row index of the first listed control
    pub fn first(&self) -> usize {
        self.indices[0]
    }

    pub fn contains(&self, sample_idx: usize) -> bool {
        self.indices.contains(&sample_idx)
    }
}

/// Compute one report per target gene, in sorted gene order
pub fn calculate_rq(matrix: &CtMatrix, params: &RqParams) -> Result<Vec<GeneReport>> {
    let controls = ControlSet::resolve(matrix, &params.controls)?;
    let panel = GenePanel::discover(matrix.column_ids(), &params.housekeeping)?;

    if panel.genes().is_empty() {
        return Err(QpcrError::EmptyData {
            reason: format!(
                "No target genes left besides housekeeping gene '{}'",
                params.housekeeping
            ),
        });
    }

    log::info!(
        "Computing RQ for {} gene(s) against {} control(s), housekeeping '{}'",
        panel.genes().len(),
        controls.ids().len(),
        panel.housekeeping()
    );

    let housekeeping_mean = row_means(matrix, panel.housekeeping_columns());
    if housekeeping_mean.iter().any(|v| v.is_nan()) {
        log::warn!(
            "Some samples have no housekeeping Ct; their dCt will be missing"
        );
    }

    panel
        .genes()
        .iter()
        .map(|gene| {
            log::debug!("Computing report for {}", gene);
            compute_gene_report(matrix, &panel, gene, &housekeeping_mean, &controls)
        })
        .collect()
}
