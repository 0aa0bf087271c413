/// Evaluation of generated images against ground truth
///
/// This module handles:
/// - Similarity metrics: SSIM, PSNR, MSE, MAE (metrics.rs)
/// - Matching real/generated files in a results directory (results.rs)
/// - Per-sample rows and run-wide averages (report.rs)
/// - Writing the report as a workbook (workbook.rs)

pub mod metrics;
pub mod report;
pub mod results;
pub mod workbook;

pub use metrics::{mae, mse, psnr, ssim, Raster, SampleScores, Shape, SsimParams};
pub use report::{evaluate, EvaluationReport, MetricRow, RunSummary};
pub use results::{scan_results, EvalSample, ResultMarkers, ResultPair};
pub use workbook::save_workbook;
