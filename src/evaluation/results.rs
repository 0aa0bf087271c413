//! Matching ground-truth and generated files in a results directory

use log::{info, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::metrics::Raster;
use crate::error::{Error, Result};

/// Substrings that tell ground truth from generated output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultMarkers {
    pub real: String,
    pub generated: String,
}

impl Default for ResultMarkers {
    fn default() -> Self {
        Self {
            real: "_real_B".to_string(),
            generated: "_fake_B".to_string(),
        }
    }
}

/// A ground-truth file and the name its generated counterpart should have
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPair {
    pub real: PathBuf,
    pub generated: PathBuf,
}

/// A decoded pair ready for scoring
#[derive(Debug, Clone)]
pub struct EvalSample {
    /// File name of the ground-truth image; identifiers are parsed from it
    pub name: String,
    pub real: Raster,
    pub generated: Raster,
}

impl ResultPair {
    /// File name of the ground-truth image
    pub fn name(&self) -> String {
        self.real
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Decode both images; the generated one must exist
    pub fn load(&self) -> Result<EvalSample> {
        if !self.generated.is_file() {
            return Err(Error::MissingFile {
                path: self.generated.clone(),
            });
        }
        Ok(EvalSample {
            name: self.name(),
            real: Raster::open(&self.real)?,
            generated: Raster::open(&self.generated)?,
        })
    }
}

/// Every file in `dir` whose name contains the real marker, sorted by name
///
/// The generated name replaces each occurrence of the real marker with the
/// generated one. Its existence is checked when the pair is loaded. Linked
/// files are followed; names that are not UTF-8 are skipped with a warning.
pub fn scan_results(dir: &Path, markers: &ResultMarkers) -> Result<Vec<ResultPair>> {
    if !dir.is_dir() {
        return Err(Error::MissingFile {
            path: dir.to_path_buf(),
        });
    }

    let mut pairs = Vec::new();
    let entries = WalkDir::new(dir)
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            warn!("Skipping non UTF-8 file name {}", entry.path().display());
            continue;
        };
        if !name.contains(&markers.real) {
            continue;
        }
        let generated = name.replace(&markers.real, &markers.generated);
        pairs.push(ResultPair {
            real: entry.path().to_path_buf(),
            generated: dir.join(generated),
        });
    }

    info!("🔍 Found {} result pairs in {}", pairs.len(), dir.display());
    Ok(pairs)
}
