//! Paired-image dataset loader and similarity evaluator for fundus photo to
//! visual field translation experiments.
//!
//! - [`dataset`] discovers `<subject>_FP_<eye>_<date>` / `<subject>_HVF_<eye>_<date>`
//!   pairs and turns them into tensors
//! - [`evaluation`] scores generated images against ground truth and writes
//!   the results to a workbook

pub mod color;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod imaging;

pub use config::Config;
pub use error::{Error, Result};
