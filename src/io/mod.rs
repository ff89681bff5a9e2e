//! Input/Output operations for instrument exports, Ct matrices and reports

mod csv;
mod xlsx;

pub use self::csv::{
    parse_raw_export, read_ct_matrix, read_raw_export, write_ct_matrix, write_regional_csv,
};
pub use self::xlsx::{sanitize_sheet_name, write_ct_matrix_xlsx, write_reports_xlsx};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::Result;
use crate::rq::GeneReport;

/// Default name of the cleaned CSV export
pub fn default_cleaned_csv_name(date: NaiveDate) -> String {
    format!("{} Cleaned_Fluidigm_data.csv", date.format("%Y-%m-%d"))
}

/// Default base name of the RQ workbook
pub fn default_report_name(date: NaiveDate) -> String {
    format!("Auswertung Realtime {}", date.format("%Y-%m-%d"))
}

/// `name` without `suffix`, compared ASCII case-insensitively
fn strip_suffix_ignore_case<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    let split = name.len().checked_sub(suffix.len())?;
    if name.is_char_boundary(split) && name[split..].eq_ignore_ascii_case(suffix) {
        Some(&name[..split])
    } else {
        None
    }
}

/// Append `.{extension}` unless the name already ends with it (case-insensitive).
///
/// Base names may contain dots of their own, e.g. `Auswertung 07.03.2024`.
pub fn with_default_extension(name: &str, extension: &str) -> PathBuf {
    let suffix = format!(".{}", extension);
    if strip_suffix_ignore_case(name, &suffix).is_some() {
        PathBuf::from(name)
    } else {
        PathBuf::from(format!("{}{}", name, suffix))
    }
}

/// Sheet name of the cleaned Excel export, built from the user's base name
pub fn cleaned_sheet_name(excel_name: &str) -> String {
    let base = strip_suffix_ignore_case(excel_name, ".xlsx").unwrap_or(excel_name);
    format!("Cleaned {}", base)
}

/// Write all gene reports as pretty-printed JSON
pub fn write_reports_json<P: AsRef<Path>>(path: P, reports: &[GeneReport]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, reports)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
