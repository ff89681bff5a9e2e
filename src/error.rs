//! Error types for qpcr_rq

use thiserror::Error;

/// Main error type for cleaning and RQ operations
#[derive(Error, Debug)]
pub enum QpcrError {
    #[error("Invalid input format: {reason}")]
    InvalidFormat { reason: String },

    #[error("Required column '{column}' not found in input")]
    MissingColumn { column: String },

    #[error("Invalid Ct matrix: {reason}")]
    InvalidMatrix { reason: String },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: String, got: String },

    #[error("No control samples given")]
    NoControls,

    #[error("Control sample(s) not found in Ct matrix: {}", .missing.join(", "))]
    UnknownControls { missing: Vec<String> },

    #[error("Housekeeping gene '{name}' does not match any column of the Ct matrix")]
    UnknownHousekeeping { name: String },

    #[error("Cannot compute {quantity} for gene '{gene}': no values available")]
    EmptyMean { gene: String, quantity: String },

    #[error("Empty data: {reason}")]
    EmptyData { reason: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Excel export error: {0}")]
    XlsxError(#[from] rust_xlsxwriter::XlsxError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl QpcrError {
    /// True for errors caused by user-supplied identifiers that do not match the data
    pub fn is_lookup_error(&self) -> bool {
        matches!(
            self,
            QpcrError::NoControls
                | QpcrError::UnknownControls { .. }
                | QpcrError::UnknownHousekeeping { .. }
        )
    }
}

/// Result type alias for qpcr_rq operations
pub type Result<T> = std::result::Result<T, QpcrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_controls_message_names_samples() {
        let err = QpcrError::UnknownControls {
            missing: vec!["C9".to_string(), "C10".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Control sample(s) not found in Ct matrix: C9, C10"
        );
        assert!(err.is_lookup_error());
    }

    #[test]
    fn test_io_error_is_not_lookup_error() {
        let err: QpcrError = std::io::Error::new(std::io::ErrorKind::NotFound, "x").into();
        assert!(!err.is_lookup_error());
    }
}
