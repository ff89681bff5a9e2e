//! Excel workbook export of cleaned matrices and gene reports

use std::collections::HashSet;
use std::path::Path;

use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, Worksheet};

use crate::data::CtMatrix;
use crate::error::{QpcrError, Result};
use crate::rq::{GeneReport, ReportCell};

/// Excel's limit on sheet name length
const MAX_SHEET_NAME: usize = 31;

/// Make `name` acceptable as an Excel sheet name
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if "[]:*?/\\".contains(c) { '_' } else { c })
        .take(MAX_SHEET_NAME)
        .collect();
    let cleaned = cleaned.trim_matches('\'').to_string();
    if cleaned.is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}

/// Sanitize and make unique among `used` (Excel compares case-insensitively)
fn unique_sheet_name(name: &str, used: &mut HashSet<String>) -> String {
    let base = sanitize_sheet_name(name);
    let mut candidate = base.clone();
    let mut n = 2;
    while used.contains(&candidate.to_lowercase()) {
        let suffix = format!("~{}", n);
        let keep = MAX_SHEET_NAME - suffix.chars().count();
        candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
        n += 1;
    }
    if candidate != name {
        log::debug!("Sheet '{}' written as '{}'", name, candidate);
    }
    used.insert(candidate.to_lowercase());
    candidate
}

fn col(idx: usize) -> Result<ColNum> {
    ColNum::try_from(idx).map_err(|_| QpcrError::InvalidInput {
        reason: format!("Too many columns for an Excel sheet: {}", idx + 1),
    })
}

fn row(idx: usize) -> Result<RowNum> {
    RowNum::try_from(idx).map_err(|_| QpcrError::InvalidInput {
        reason: format!("Too many rows for an Excel sheet: {}", idx + 1),
    })
}

fn write_matrix_sheet(worksheet: &mut Worksheet, matrix: &CtMatrix, bold: &Format) -> Result<()> {
    worksheet.write_string_with_format(0, 0, "Sample", bold)?;
    for (j, column_id) in matrix.column_ids().iter().enumerate() {
        worksheet.write_string_with_format(0, col(j + 1)?, column_id, bold)?;
    }

    for (i, sample) in matrix.sample_ids().iter().enumerate() {
        let r = row(i + 1)?;
        worksheet.write_string_with_format(r, 0, sample, bold)?;
        for j in 0..matrix.n_columns() {
            if let Some(v) = matrix.get(i, j) {
                worksheet.write_number(r, col(j + 1)?, v)?;
            }
        }
    }
    worksheet.autofit();
    Ok(())
}

fn write_report_sheet(worksheet: &mut Worksheet, report: &GeneReport, bold: &Format) -> Result<()> {
    for (j, title) in report.header().iter().enumerate() {
        worksheet.write_string_with_format(0, col(j)?, title, bold)?;
    }

    for (i, report_row) in report.rows.iter().enumerate() {
        let r = row(i + 1)?;
        for (j, cell) in report_row.cells().into_iter().enumerate() {
            match cell {
                ReportCell::Text(text) if j == 0 => {
                    worksheet.write_string_with_format(r, col(j)?, &text, bold)?;
                }
                ReportCell::Text(text) => {
                    worksheet.write_string(r, col(j)?, &text)?;
                }
                ReportCell::Number(v) => {
                    worksheet.write_number(r, col(j)?, v)?;
                }
                ReportCell::Empty => {}
            }
        }
    }
    worksheet.autofit();
    Ok(())
}

/// Write a Ct matrix to a single-sheet workbook
pub fn write_ct_matrix_xlsx<P: AsRef<Path>>(
    path: P,
    matrix: &CtMatrix,
    sheet_name: &str,
) -> Result<()> {
    let bold = Format::new().set_bold();
    let mut workbook = Workbook::new();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sanitize_sheet_name(sheet_name))?;
    write_matrix_sheet(worksheet, matrix, &bold)?;

    workbook.save(path.as_ref())?;
    log::info!("Wrote Ct matrix workbook: {}", path.as_ref().display());
    Ok(())
}

/// Write one sheet per gene report, named after the gene, in the given order
pub fn write_reports_xlsx<P: AsRef<Path>>(path: P, reports: &[GeneReport]) -> Result<()> {
    if reports.is_empty() {
        return Err(QpcrError::EmptyData {
            reason: "No gene reports to write".to_string(),
        });
    }

    let bold = Format::new().set_bold();
    let mut workbook = Workbook::new();
    let mut used = HashSet::new();

    for report in reports {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(unique_sheet_name(&report.gene, &mut used))?;
        write_report_sheet(worksheet, report, &bold)?;
    }

    workbook.save(path.as_ref())?;
    log::info!(
        "Wrote {} gene sheet(s) to {}",
        reports.len(),
        path.as_ref().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::cleaned_sheet_name;
    use crate::rq::{calculate_rq, RqParams};
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use ndarray::array;
    use tempfile::tempdir;

    fn matrix() -> CtMatrix {
        CtMatrix::new(
            array![[18.0, 25.0, 29.0], [18.4, 27.0, f64::NAN]],
            vec!["C1".to_string(), "S1".to_string()],
            vec!["Gapdh_1".to_string(), "Il6_1".to_string(), "Tnf_1".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("Il6"), "Il6");
        assert_eq!(sanitize_sheet_name("a/b:c"), "a_b_c");
        assert_eq!(sanitize_sheet_name("'quoted'"), "quoted");
        assert_eq!(sanitize_sheet_name(""), "Sheet1");
        assert_eq!(
            sanitize_sheet_name("Cleaned a very long experiment name here")
                .chars()
                .count(),
            31
        );
    }

    #[test]
    fn test_unique_sheet_names() {
        let mut used = HashSet::new();
        assert_eq!(unique_sheet_name("Il6", &mut used), "Il6");
        assert_eq!(unique_sheet_name("IL6", &mut used), "IL6~2");
        assert_eq!(unique_sheet_name("il6", &mut used), "il6~3");
    }

    #[test]
    fn test_write_ct_matrix_xlsx() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chip7.v1.xlsx");
        write_ct_matrix_xlsx(&path, &matrix(), &cleaned_sheet_name("chip7.v1")).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Cleaned chip7.v1"]);

        let range = workbook.worksheet_range("Cleaned chip7.v1").unwrap();
        assert_eq!(range.get_value((0, 0)), Some(&Data::String("Sample".to_string())));
        assert_eq!(range.get_value((0, 2)), Some(&Data::String("Il6_1".to_string())));
        assert_eq!(range.get_value((2, 0)), Some(&Data::String("S1".to_string())));
        assert_eq!(range.get_value((2, 1)), Some(&Data::Float(18.4)));
        assert!(matches!(range.get_value((2, 3)), None | Some(Data::Empty)));
    }

    #[test]
    fn test_write_reports_xlsx() {
        let reports = calculate_rq(&matrix(), &RqParams::from_text("C1", "Gapdh")).unwrap();
        assert_eq!(reports.len(), 2);

        let dir = tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        write_reports_xlsx(&path, &reports).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Il6", "Tnf"]);

        let il6 = workbook.worksheet_range("Il6").unwrap();
        assert_eq!(il6.get_value((0, 1)), Some(&Data::String("Type".to_string())));
        assert_eq!(il6.get_value((0, 3)), Some(&Data::String("Gapdh Mean".to_string())));
        assert_eq!(il6.get_value((0, 5)), Some(&Data::String("Il6 Mean".to_string())));
        assert_eq!(il6.get_value((1, 0)), Some(&Data::String("C1".to_string())));
        assert_eq!(il6.get_value((1, 1)), Some(&Data::String("Control".to_string())));
        assert_eq!(il6.get_value((2, 1)), Some(&Data::String("Sample".to_string())));

        // Tnf was not detected in S1: no RQ cell
        let tnf = workbook.worksheet_range("Tnf").unwrap();
        assert_eq!(tnf.get_value((0, 9)), Some(&Data::String("RQ".to_string())));
        assert!(matches!(tnf.get_value((2, 9)), None | Some(Data::Empty)));
    }

    #[test]
    fn test_reports_written_in_given_order() {
        let mut reports = calculate_rq(&matrix(), &RqParams::from_text("C1", "Gapdh")).unwrap();
        reports.reverse();

        let dir = tempdir().unwrap();
        let path = dir.path().join("reversed.xlsx");
        write_reports_xlsx(&path, &reports).unwrap();

        let workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Tnf", "Il6"]);
    }

    #[test]
    fn test_write_no_reports_fails() {
        let dir = tempdir().unwrap();
        let result = write_reports_xlsx(dir.path().join("empty.xlsx"), &[]);
        assert!(matches!(result, Err(QpcrError::EmptyData { .. })));
    }
}
