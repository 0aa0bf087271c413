//! Workbook output for an evaluation report

use log::info;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::Path;

use super::report::EvaluationReport;
use crate::error::Result;

/// Header of the per-sample sheet
pub const HEADER: [&str; 6] = ["subject_id", "laterality", "SSIM", "PSNR", "MSE", "MAE"];

/// Write `report` to an `.xlsx` file
///
/// Sheet `metrics` holds the header and one row per sample; sheet `summary`
/// holds the four means and the sample count.
pub fn save_workbook(report: &EvaluationReport, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("metrics")?;
        for (col, title) in HEADER.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *title, &bold)?;
        }
        for (i, row) in report.rows.iter().enumerate() {
            let r = i as u32 + 1;
            sheet.write_string(r, 0, &row.subject_id)?;
            sheet.write_string(r, 1, &row.laterality)?;
            let s = &row.scores;
            for (col, value) in [(2, s.ssim), (3, s.psnr), (4, s.mse), (5, s.mae)] {
                write_score(sheet, r, col, value)?;
            }
        }
    }

    {
        let summary = &report.summary;
        let sheet = workbook.add_worksheet();
        sheet.set_name("summary")?;
        sheet.write_string_with_format(0, 0, "metric", &bold)?;
        sheet.write_string_with_format(0, 1, "mean", &bold)?;
        let lines = [
            ("PSNR", summary.psnr),
            ("SSIM", summary.ssim),
            ("MSE", summary.mse),
            ("MAE", summary.mae),
        ];
        for (i, (name, value)) in lines.into_iter().enumerate() {
            let r = i as u32 + 1;
            sheet.write_string(r, 0, name)?;
            write_score(sheet, r, 1, value)?;
        }
        sheet.write_string(5, 0, "samples")?;
        sheet.write_number(5, 1, summary.samples as f64)?;
    }

    workbook.save(path)?;
    info!("💾 Saved {} rows to {}", report.rows.len(), path.display());
    Ok(())
}

/// xlsx has no infinity, so identical images get the text `inf`
fn write_score(sheet: &mut Worksheet, row: u32, col: u16, value: f64) -> std::result::Result<(), XlsxError> {
    if value.is_finite() {
        sheet.write_number(row, col, value)?;
    } else {
        sheet.write_string(row, col, format!("{value}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::metrics::SampleScores;
    use crate::evaluation::report::{MetricRow, RunSummary};
    use std::fs;
    use std::io::Read;

    fn report() -> EvaluationReport {
        let rows = vec![
            MetricRow {
                subject_id: "10231".to_string(),
                laterality: "OS".to_string(),
                scores: SampleScores {
                    ssim: 0.9,
                    psnr: 28.13,
                    mse: 100.0,
                    mae: 10.0,
                },
            },
            MetricRow {
                subject_id: "10232".to_string(),
                laterality: "OD".to_string(),
                scores: SampleScores {
                    ssim: 1.0,
                    psnr: f64::INFINITY,
                    mse: 0.0,
                    mae: 0.0,
                },
            },
        ];
        let summary = RunSummary::from_rows(&rows).unwrap();
        EvaluationReport { rows, summary }
    }

    fn read_part(path: &Path, part: &str) -> String {
        let mut archive = zip::ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
        let mut xml = String::new();
        archive.by_name(part).unwrap().read_to_string(&mut xml).unwrap();
        xml
    }

    fn shared_strings(xml: &str) -> Vec<String> {
        xml.split("<si>")
            .skip(1)
            .map(|si| {
                let body = &si[si.find("<t").unwrap()..];
                body[body.find('>').unwrap() + 1..body.find("</t>").unwrap()].to_string()
            })
            .collect()
    }

    /// Text of cell `r`, resolving shared strings
    fn cell(sheet: &str, strings: &[String], r: &str) -> String {
        let start = sheet
            .find(&format!("<c r=\"{r}\""))
            .unwrap_or_else(|| panic!("no cell {r}"));
        let cell = &sheet[start..];
        let cell = &cell[..cell.find("</c>").unwrap()];
        let value = &cell[cell.find("<v>").unwrap() + 3..cell.find("</v>").unwrap()];
        if cell.contains("t=\"s\"") {
            strings[value.parse::<usize>().unwrap()].clone()
        } else {
            value.to_string()
        }
    }

    #[test]
    fn test_save_workbook_writes_rows_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result_Pix2Pix_22.xlsx");

        save_workbook(&report(), &path).unwrap();

        let strings = shared_strings(&read_part(&path, "xl/sharedStrings.xml"));
        let metrics = read_part(&path, "xl/worksheets/sheet1.xml");

        let header: Vec<String> = ["A1", "B1", "C1", "D1", "E1", "F1"]
            .iter()
            .map(|r| cell(&metrics, &strings, r))
            .collect();
        assert_eq!(header, HEADER);

        assert_eq!(cell(&metrics, &strings, "A2"), "10231");
        assert_eq!(cell(&metrics, &strings, "B2"), "OS");
        assert_eq!(cell(&metrics, &strings, "D2"), "28.13");
        assert_eq!(cell(&metrics, &strings, "E2"), "100");
        assert_eq!(cell(&metrics, &strings, "B3"), "OD");
        // identical images
        assert_eq!(cell(&metrics, &strings, "D3"), "inf");
        assert!(metrics.contains("<row r=\"3\""));
        assert!(!metrics.contains("<row r=\"4\""));

        let summary = read_part(&path, "xl/worksheets/sheet2.xml");
        assert_eq!(cell(&summary, &strings, "A2"), "PSNR");
        assert_eq!(cell(&summary, &strings, "B2"), "inf");
        assert_eq!(cell(&summary, &strings, "A6"), "samples");
        assert_eq!(cell(&summary, &strings, "B6"), "2");
    }

    #[test]
    fn test_unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing/dir/out.xlsx");
        assert!(save_workbook(&report(), &path).is_err());
    }
}
