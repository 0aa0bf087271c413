//! Per-sample metric rows and the run-wide summary
//!
//! `evaluate` is pure: it takes decoded pairs and returns rows plus
//! averages. Reading files and writing the workbook happen elsewhere.

use log::debug;

use super::metrics::{score_sample, SampleScores, SsimParams};
use super::results::EvalSample;
use crate::dataset::record::DELIMITER;
use crate::error::{Error, Result};

/// One evaluated sample
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub subject_id: String,
    pub laterality: String,
    pub scores: SampleScores,
}

impl MetricRow {
    /// Subject id and laterality are tokens 0 and 2 of the file name
    pub fn from_file_name(name: &str, scores: SampleScores) -> Result<Self> {
        let tokens: Vec<&str> = name.split(DELIMITER).collect();
        if tokens.len() < 3 {
            return Err(Error::format(
                name,
                format!("expected at least 3 '{DELIMITER}'-separated tokens, found {}", tokens.len()),
            ));
        }
        Ok(Self {
            subject_id: tokens[0].to_string(),
            laterality: tokens[2].to_string(),
            scores,
        })
    }
}

/// Column-wise means over every row of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub samples: usize,
    pub ssim: f64,
    pub psnr: f64,
    pub mse: f64,
    pub mae: f64,
}

impl RunSummary {
    /// Averages of `rows`; no rows is `Error::EmptyDataset`, never NaN
    pub fn from_rows(rows: &[MetricRow]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::EmptyDataset("no samples were evaluated".to_string()));
        }
        let n = rows.len() as f64;
        let mean = |f: fn(&SampleScores) -> f64| rows.iter().map(|r| f(&r.scores)).sum::<f64>() / n;

        Ok(Self {
            samples: rows.len(),
            ssim: mean(|s| s.ssim),
            psnr: mean(|s| s.psnr),
            mse: mean(|s| s.mse),
            mae: mean(|s| s.mae),
        })
    }

    /// The four console lines, four decimals each
    pub fn console_lines(&self) -> [String; 4] {
        [
            format!("Average PSNR: {:.4}", self.psnr),
            format!("Average SSIM: {:.4}", self.ssim),
            format!("Average MSE: {:.4}", self.mse),
            format!("Average MAE: {:.4}", self.mae),
        ]
    }
}

/// Rows in input order plus their summary
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub rows: Vec<MetricRow>,
    pub summary: RunSummary,
}

/// Score every sample and average the results
///
/// The first failing sample (unreadable file, shape mismatch, malformed
/// name) stops the run and is returned; no partial report is produced.
pub fn evaluate<I>(samples: I, params: &SsimParams) -> Result<EvaluationReport>
where
    I: IntoIterator<Item = Result<EvalSample>>,
{
    let mut rows = Vec::new();

    for sample in samples {
        let sample = sample?;
        let scores = score_sample(&sample.name, &sample.real, &sample.generated, params)?;
        debug!(
            "{}: PSNR {:.4}, SSIM {:.4}, MSE {:.4}, MAE {:.4}",
            sample.name, scores.psnr, scores.ssim, scores.mse, scores.mae
        );
        rows.push(MetricRow::from_file_name(&sample.name, scores)?);
    }

    let summary = RunSummary::from_rows(&rows)?;
    Ok(EvaluationReport { rows, summary })
}
