//! CSV reading and writing for instrument exports and Ct matrices

use std::fs;
use std::io::Write;
use std::path::Path;

use ndarray::Array2;

use crate::data::{CtMatrix, RawTable};
use crate::error::{QpcrError, Result};

/// Decode file bytes, falling back to Latin-1 for exports that are not UTF-8
fn decode_text(bytes: Vec<u8>) -> String {
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            log::debug!("Input is not valid UTF-8, decoding as Latin-1");
            err.into_bytes().iter().map(|&b| b as char).collect()
        }
    };
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

/// Skip the first `n` lines, `None` if the text is shorter
fn skip_lines(text: &str, n: usize) -> Option<&str> {
    let mut rest = text;
    for _ in 0..n {
        let pos = rest.find('\n')?;
        rest = &rest[pos + 1..];
    }
    Some(rest)
}

/// Read an instrument export, skipping the preamble before the header row
pub fn read_raw_export<P: AsRef<Path>>(path: P, skip_rows: usize) -> Result<RawTable> {
    let path = path.as_ref();
    log::info!("Reading instrument export: {}", path.display());
    let text = decode_text(fs::read(path)?);
    parse_raw_export(&text, skip_rows)
}

/// Parse instrument export text: `skip_rows` preamble lines, a header row, then data rows
pub fn parse_raw_export(text: &str, skip_rows: usize) -> Result<RawTable> {
    let body = skip_lines(text, skip_rows).ok_or_else(|| QpcrError::InvalidFormat {
        reason: format!("Expected at least {} preamble lines before the header", skip_rows),
    })?;

    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());
    let mut records = reader.records();

    let header = records.next().ok_or_else(|| QpcrError::EmptyData {
        reason: "No header row after the preamble".to_string(),
    })??;
    let headers: Vec<String> = header.iter().map(String::from).collect();

    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        rows.push(record.iter().map(String::from).collect());
    }

    log::debug!("Export has {} columns and {} rows", headers.len(), rows.len());
    RawTable::new(headers, rows)
}

/// Read a Ct matrix: first column is the sample, remaining columns are detectors.
///
/// Both the canonical layout (`,` separated, `.` decimal) and the regional
/// layout (`;` separated, `,` decimal) are accepted; the header decides.
pub fn read_ct_matrix<P: AsRef<Path>>(path: P) -> Result<CtMatrix> {
    let path = path.as_ref();
    log::info!("Loading Ct matrix from: {}", path.display());
    let text = decode_text(fs::read(path)?);
    parse_ct_matrix(&text)
}

fn parse_ct_matrix(text: &str) -> Result<CtMatrix> {
    if text.trim().is_empty() {
        return Err(QpcrError::EmptyData {
            reason: "Empty Ct matrix file".to_string(),
        });
    }
    let regional = header_field_count(text, b';') > header_field_count(text, b',');
    let delimiter = if regional { b';' } else { b',' };

    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let header = reader.headers()?.clone();
    if header.len() < 2 {
        return Err(QpcrError::InvalidFormat {
            reason: "Ct matrix needs a sample column and at least one detector column"
                .to_string(),
        });
    }
    let column_ids: Vec<String> = header.iter().skip(1).map(|s| s.trim().to_string()).collect();
    let n_columns = column_ids.len();

    let mut sample_ids = Vec::new();
    let mut flat: Vec<f64> = Vec::new();

    for (line, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != n_columns + 1 {
            return Err(QpcrError::InvalidFormat {
                reason: format!(
                    "Row {} has {} columns, expected {}",
                    line + 1,
                    record.len(),
                    n_columns + 1
                ),
            });
        }

        sample_ids.push(record[0].trim().to_string());
        for (j, field) in record.iter().skip(1).enumerate() {
            flat.push(parse_value(field, regional).ok_or_else(|| {
                QpcrError::InvalidFormat {
                    reason: format!(
                        "Invalid Ct value '{}' in row {}, column '{}'",
                        field,
                        line + 1,
                        column_ids[j]
                    ),
                }
            })?);
        }
    }

    if sample_ids.is_empty() {
        return Err(QpcrError::EmptyData {
            reason: "No samples found in Ct matrix".to_string(),
        });
    }

    let values = Array2::from_shape_vec((sample_ids.len(), n_columns), flat).map_err(|e| {
        QpcrError::InvalidFormat {
            reason: e.to_string(),
        }
    })?;

    CtMatrix::new(values, sample_ids, column_ids)
}

/// Number of fields in the first record when split by `delimiter` (quotes respected)
fn header_field_count(text: &str, delimiter: u8) -> usize {
    ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes())
        .records()
        .next()
        .and_then(|record| record.ok())
        .map_or(0, |record| record.len())
}

/// Parse a matrix cell; empty cells are missing
fn parse_value(field: &str, regional: bool) -> Option<f64> {
    let field = field.trim();
    if field.is_empty() {
        return Some(f64::NAN);
    }
    if regional {
        field.replace(',', ".").parse().ok()
    } else {
        field.parse().ok()
    }
}

/// Shortest representation that still reads back as a float
fn format_canonical(v: f64) -> String {
    if v.is_nan() {
        return String::new();
    }
    let s = v.to_string();
    if s.contains(['.', 'e', 'E']) {
        s
    } else {
        format!("{}.0", s)
    }
}

/// Two decimals with a decimal comma
fn format_regional(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        format!("{:.2}", v).replace('.', ",")
    }
}

fn write_matrix<W: Write>(writer: W, matrix: &CtMatrix, regional: bool) -> Result<()> {
    let mut writer = ::csv::WriterBuilder::new()
        .delimiter(if regional { b';' } else { b',' })
        .from_writer(writer);

    let mut header = vec!["Sample".to_string()];
    header.extend(matrix.column_ids().iter().cloned());
    writer.write_record(&header)?;

    let values = matrix.values();
    for (i, sample) in matrix.sample_ids().iter().enumerate() {
        let mut record = vec![sample.clone()];
        record.extend(values.row(i).iter().map(|&v| {
            if regional {
                format_regional(v)
            } else {
                format_canonical(v)
            }
        }));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write a Ct matrix in the canonical layout read by the RQ calculation
pub fn write_ct_matrix<P: AsRef<Path>>(path: P, matrix: &CtMatrix) -> Result<()> {
    let file = fs::File::create(path)?;
    write_matrix(file, matrix, false)
}

/// Write a Ct matrix for spreadsheets with regional settings:
/// `;` separated, decimal comma, two decimals
pub fn write_regional_csv<P: AsRef<Path>>(path: P, matrix: &CtMatrix) -> Result<()> {
    let file = fs::File::create(path)?;
    write_matrix(file, matrix, true)
}
