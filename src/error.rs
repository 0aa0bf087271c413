//! Error types shared by the dataset loader and the evaluator
//!
//! Every variant that comes from the filesystem carries the offending path,
//! so an aborted run always says which file stopped it.

use std::path::PathBuf;
use thiserror::Error;

use crate::evaluation::metrics::{MetricError, Shape};

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum Error {
    /// A file name does not follow the `<subject>_<role>_<laterality>_<date>` schema
    #[error("malformed file name {name:?}: {reason}")]
    Format { name: String, reason: String },

    /// An expected file (target image, overlay, generated output) is not on disk
    #[error("missing file: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    /// Real and generated images differ in size or channel count
    #[error("image shapes do not match for {sample}: real {real}, generated {generated}")]
    ShapeMismatch {
        sample: String,
        real: Shape,
        generated: Shape,
    },

    #[error("metric computation failed for {sample}: {source}")]
    Metric {
        sample: String,
        #[source]
        source: MetricError,
    },

    #[error("cannot blend images of different sizes: {left:?} vs {right:?}")]
    BlendSize { left: (u32, u32), right: (u32, u32) },

    /// Nothing to load or evaluate
    #[error("no data: {0}")]
    EmptyDataset(String),

    #[error("index {index} out of range for dataset of {len} pairs")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse configuration {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn format(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Format {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
