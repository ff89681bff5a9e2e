//! Technical replicate numbering and pivoting to a Ct matrix

use std::collections::{BTreeSet, HashMap};

use ndarray::Array2;

use crate::data::{CtMatrix, RawReading};
use crate::error::{QpcrError, Result};

/// A reading whose detector carries its replicate number, e.g. `GeneA_2`
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicateReading {
    pub sample: String,
    pub unique_detector: String,
    pub ct: f64,
}

/// Number readings 1, 2, ... within each (sample, detector) group in encounter order
pub fn assign_replicates(readings: &[RawReading]) -> Vec<ReplicateReading> {
    let mut counters: HashMap<(&str, &str), usize> = HashMap::new();

    readings
        .iter()
        .map(|r| {
            let count = counters
                .entry((r.sample.as_str(), r.detector.as_str()))
                .or_insert(0);
            *count += 1;
            ReplicateReading {
                sample: r.sample.clone(),
                unique_detector: format!("{}_{}", r.detector, count),
                ct: r.ct,
            }
        })
        .collect()
}

/// Reshape numbered readings into a samples x detectors matrix.
///
/// Samples and detectors are sorted; combinations without a reading stay missing.
pub fn pivot_readings(readings: &[ReplicateReading]) -> Result<CtMatrix> {
    let samples: BTreeSet<&str> = readings.iter().map(|r| r.sample.as_str()).collect();
    let columns: BTreeSet<&str> = readings
        .iter()
        .map(|r| r.unique_detector.as_str())
        .collect();

    let sample_pos: HashMap<&str, usize> = samples.iter().enumerate().map(|(i, &s)| (s, i)).collect();
    let column_pos: HashMap<&str, usize> = columns.iter().enumerate().map(|(j, &c)| (c, j)).collect();

    let mut values = Array2::from_elem((samples.len(), columns.len()), f64::NAN);
    let mut filled = Array2::from_elem((samples.len(), columns.len()), false);

    for r in readings {
        let i = sample_pos[r.sample.as_str()];
        let j = column_pos[r.unique_detector.as_str()];
        if filled[[i, j]] {
            return Err(QpcrError::InvalidMatrix {
                reason: format!(
                    "Duplicate entry for sample '{}' and detector '{}'",
                    r.sample, r.unique_detector
                ),
            });
        }
        filled[[i, j]] = true;
        values[[i, j]] = r.ct;
    }

    CtMatrix::new(
        values,
        samples.into_iter().map(String::from).collect(),
        columns.into_iter().map(String::from).collect(),
    )
}
