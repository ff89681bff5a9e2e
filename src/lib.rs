//! qpcr_rq: qPCR Ct matrix cleaning and relative quantification in Rust
//!
//! Two pipelines connected only through the canonical Ct matrix:
//! the cleaner turns an instrument export into a sample x gene matrix of Ct
//! values, and the RQ calculation derives per-gene relative expression
//! (ddCt method) against control samples and a housekeeping gene.
//!
//! # Example
//!
//! ```ignore
//! use qpcr_rq::prelude::*;
//!
//! // Clean a Fluidigm export
//! let matrix = run_cleaner("chip7.csv", &CleanParams::new(ExportFormat::Fluidigm))?;
//! write_ct_matrix("chip7_ct.csv", &matrix)?;
//!
//! // Relative expression against two controls
//! let matrix = load_ct_matrix("chip7_ct.csv")?;
//! let params = RqParams::from_text("Ctrl1 Ctrl2", "Gapdh");
//! let reports = calculate_rq(&matrix, &params)?;
//! write_reports_xlsx("Auswertung.xlsx", &reports)?;
//! ```

pub mod clean;
pub mod cli;
pub mod data;
pub mod error;
pub mod io;
pub mod rq;
pub mod stats;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::clean::{clean_table, CleanParams, ExportFormat};
    pub use crate::data::{CtMatrix, RawReading, RawTable};
    pub use crate::error::{QpcrError, Result};
    pub use crate::io::{
        read_ct_matrix, read_raw_export, write_ct_matrix, write_ct_matrix_xlsx,
        write_regional_csv, write_reports_json, write_reports_xlsx,
    };
    pub use crate::rq::{calculate_rq, GeneReport, ReportRow, RqParams, SampleType};
    pub use crate::{load_ct_matrix, run_cleaner};
}

use std::path::Path;

use prelude::*;

/// Decimal places Ct values are rounded to before the RQ calculation
pub const CT_DECIMALS: i32 = 2;

/// Read an instrument export and run the cleaning pipeline on it
pub fn run_cleaner<P: AsRef<Path>>(path: P, params: &CleanParams) -> Result<CtMatrix> {
    let table = read_raw_export(path, params.format.skip_rows())?;
    clean_table(&table, params)
}

/// Load a Ct matrix for the RQ calculation, rounded to two decimals
pub fn load_ct_matrix<P: AsRef<Path>>(path: P) -> Result<CtMatrix> {
    let matrix = read_ct_matrix(path)?;
    log::info!(
        "  {} samples, {} detector columns",
        matrix.n_samples(),
        matrix.n_columns()
    );
    Ok(matrix.rounded(CT_DECIMALS))
}
