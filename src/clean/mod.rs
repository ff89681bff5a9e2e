//! Cleaning of raw instrument exports into a canonical Ct matrix
//!
//! The pipeline is a fixed sequence of table transformations:
//! 1. Select (and for Fluidigm, rename) the sample, detector and Ct columns
//! 2. Drop unnamed placeholder columns
//! 3. Drop water blanks
//! 4. Coerce Ct to numbers, invalid or undetected readings become missing
//! 5. Number technical replicates per (sample, detector)
//! 6. Pivot to one row per sample and one column per numbered detector

mod replicates;

pub use replicates::{assign_replicates, pivot_readings, ReplicateReading};

use crate::data::{CtMatrix, RawReading, RawTable};
use crate::error::{QpcrError, Result};

/// Sample names marking water blanks (including a frequent typo)
pub const BLANK_SAMPLES: [&str; 2] = ["H2O", "H20"];

/// Ct values above this are "not detected"
pub const MAX_CT: f64 = 50.0;

/// Instrument export layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Generic qPCR export with `Sample`, `Detector`, `Ct` columns
    #[default]
    Generic,
    /// Fluidigm export with `Name`, `Name.1`, `Value` columns
    Fluidigm,
}

impl ExportFormat {
    /// Number of preamble lines before the header row
    pub fn skip_rows(self) -> usize {
        match self {
            ExportFormat::Generic => 36,
            ExportFormat::Fluidigm => 11,
        }
    }

    /// Source column names holding sample, detector and Ct, in that order
    pub fn source_columns(self) -> [&'static str; 3] {
        match self {
            ExportFormat::Generic => ["Sample", "Detector", "Ct"],
            ExportFormat::Fluidigm => ["Name", "Name.1", "Value"],
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Generic => write!(f, "generic"),
            ExportFormat::Fluidigm => write!(f, "fluidigm"),
        }
    }
}

/// Parameters for the cleaning pipeline
#[derive(Debug, Clone)]
pub struct CleanParams {
    /// Layout of the instrument export
    pub format: ExportFormat,
    /// Sample names dropped as water blanks (exact match)
    pub blank_samples: Vec<String>,
    /// Ct values strictly above this become missing
    pub max_ct: f64,
}

impl Default for CleanParams {
    fn default() -> Self {
        Self {
            format: ExportFormat::default(),
            blank_samples: BLANK_SAMPLES.iter().map(|s| s.to_string()).collect(),
            max_ct: MAX_CT,
        }
    }
}

impl CleanParams {
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }
}

/// Parse a Ct cell. Anything that is not a number in (0, max_ct] is missing.
pub fn parse_ct(text: &str, max_ct: f64) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 && v <= max_ct => v,
        _ => f64::NAN,
    }
}

/// Select the sample, detector and Ct columns and coerce Ct values
pub fn select_readings(table: &RawTable, params: &CleanParams) -> Result<Vec<RawReading>> {
    let table = table.drop_unnamed();
    let [sample_col, detector_col, ct_col] = params.format.source_columns();

    let samples = table.column(sample_col)?;
    let detectors = table.column(detector_col)?;
    let cts = table.column(ct_col)?;

    let mut readings = Vec::with_capacity(samples.len());
    let mut n_invalid = 0usize;

    for ((sample, detector), ct_text) in samples.iter().zip(&detectors).zip(&cts) {
        let sample = sample.trim();
        let detector = detector.trim();
        if sample.is_empty() || detector.is_empty() {
            log::debug!(
                "Skipping row without sample/detector (sample='{}', detector='{}')",
                sample,
                detector
            );
            continue;
        }

        let ct = parse_ct(ct_text, params.max_ct);
        if ct.is_nan() {
            n_invalid += 1;
            log::debug!(
                "Ct '{}' for {}/{} treated as missing",
                ct_text.trim(),
                sample,
                detector
            );
        }
        readings.push(RawReading::new(sample, detector, ct));
    }

    if n_invalid > 0 {
        log::info!("{} Ct value(s) missing, invalid or undetected", n_invalid);
    }

    Ok(readings)
}

/// Drop readings whose sample is a water blank
pub fn filter_blanks(readings: Vec<RawReading>, blank_samples: &[String]) -> Vec<RawReading> {
    let before = readings.len();
    let kept: Vec<RawReading> = readings
        .into_iter()
        .filter(|r| !blank_samples.iter().any(|b| *b == r.sample))
        .collect();

    if kept.len() < before {
        log::info!("Removed {} water blank reading(s)", before - kept.len());
    }
    kept
}

/// Run the complete cleaning pipeline on a raw export
pub fn clean_table(table: &RawTable, params: &CleanParams) -> Result<CtMatrix> {
    log::info!(
        "Cleaning {} rows ({} export)",
        table.n_rows(),
        params.format
    );

    let readings = select_readings(table, params)?;
    let readings = filter_blanks(readings, &params.blank_samples);

    if readings.is_empty() {
        return Err(QpcrError::EmptyData {
            reason: "No readings left after removing blanks".to_string(),
        });
    }

    let numbered = assign_replicates(&readings);
    let matrix = pivot_readings(&numbered)?;

    log::info!(
        "Cleaned matrix: {} samples x {} detectors",
        matrix.n_samples(),
        matrix.n_columns()
    );
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_ct() {
        assert_eq!(parse_ct("22.1", MAX_CT), 22.1);
        assert_eq!(parse_ct(" 50 ", MAX_CT), 50.0);
        assert!(parse_ct("51.2", MAX_CT).is_nan());
        assert!(parse_ct("Undetermined", MAX_CT).is_nan());
        assert!(parse_ct("", MAX_CT).is_nan());
        assert!(parse_ct("-3", MAX_CT).is_nan());
        assert!(parse_ct("inf", MAX_CT).is_nan());
    }

    #[test]
    fn test_generic_scenario() {
        let raw = table(
            &["Well", "Sample", "Detector", "Ct", ""],
            &[
                &["A1", "S1", "GeneA", "22.1", ""],
                &["A2", "S1", "GeneA", "22.3", ""],
                &["A3", "H2O", "GeneA", "30.0", ""],
            ],
        );
        let matrix = clean_table(&raw, &CleanParams::default()).unwrap();

        assert_eq!(matrix.sample_ids(), &["S1"]);
        assert_eq!(matrix.column_ids(), &["GeneA_1", "GeneA_2"]);
        assert_eq!(matrix.get(0, 0), Some(22.1));
        assert_eq!(matrix.get(0, 1), Some(22.3));
    }

    #[test]
    fn test_both_blank_spellings_removed() {
        let raw = table(
            &["Sample", "Detector", "Ct"],
            &[
                &["H2O", "GeneA", "30.0"],
                &["H20", "GeneA", "31.0"],
                &["S1", "GeneA", "22.0"],
            ],
        );
        let matrix = clean_table(&raw, &CleanParams::default()).unwrap();
        assert_eq!(matrix.sample_ids(), &["S1"]);
    }

    #[test]
    fn test_undetected_ct_is_missing() {
        let raw = table(
            &["Sample", "Detector", "Ct"],
            &[&["S1", "GeneA", "51.2"], &["S2", "GeneA", "24.0"]],
        );
        let matrix = clean_table(&raw, &CleanParams::default()).unwrap();
        assert_eq!(matrix.sample_ids(), &["S1", "S2"]);
        assert_eq!(matrix.get(0, 0), None);
        assert_eq!(matrix.get(1, 0), Some(24.0));
        assert!(matrix
            .values()
            .iter()
            .all(|&v| v.is_nan() || v <= MAX_CT));
    }

    #[test]
    fn test_fluidigm_columns_renamed() {
        let raw = table(
            &["ID", "Name", "Type", "Name", "Type", "Value"],
            &[
                &["S01-A01", "Ctrl1", "Unknown", "Gapdh", "Test", "18.5"],
                &["S01-A02", "Ctrl1", "Unknown", "Il6", "Test", "999"],
                &["S02-A01", "H2O", "NTC", "Gapdh", "Test", "999"],
            ],
        );
        let matrix = clean_table(&raw, &CleanParams::new(ExportFormat::Fluidigm)).unwrap();
        assert_eq!(matrix.sample_ids(), &["Ctrl1"]);
        assert_eq!(matrix.column_ids(), &["Gapdh_1", "Il6_1"]);
        assert_eq!(matrix.get(0, 0), Some(18.5));
        assert_eq!(matrix.get(0, 1), None);
    }

    #[test]
    fn test_missing_required_column() {
        let raw = table(&["Sample", "Ct"], &[&["S1", "22.0"]]);
        let result = clean_table(&raw, &CleanParams::default());
        assert!(matches!(result, Err(QpcrError::MissingColumn { column }) if column == "Detector"));
    }

    #[test]
    fn test_only_blanks_is_empty_data() {
        let raw = table(&["Sample", "Detector", "Ct"], &[&["H2O", "GeneA", "30.0"]]);
        let result = clean_table(&raw, &CleanParams::default());
        assert!(matches!(result, Err(QpcrError::EmptyData { .. })));
    }

    #[test]
    fn test_cleaning_is_deterministic() {
        let raw = table(
            &["Sample", "Detector", "Ct"],
            &[
                &["S2", "GeneB", "25.0"],
                &["S1", "GeneA", "22.0"],
                &["S2", "GeneA", "23.0"],
                &["S1", "GeneA", "22.4"],
            ],
        );
        let first = clean_table(&raw, &CleanParams::default()).unwrap();
        let second = clean_table(&raw, &CleanParams::default()).unwrap();
        assert_eq!(first.sample_ids(), second.sample_ids());
        assert_eq!(first.column_ids(), second.column_ids());
        for (a, b) in first.values().iter().zip(second.values().iter()) {
            assert!(a.to_bits() == b.to_bits());
        }
    }
}
