//! Pair discovery over a `root/<visit folder>/<files>` tree

use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::record::{ImagePair, SampleRecord, DELIMITER};
use crate::error::{Error, Result};

/// Role tokens that tell an input file from its target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMarkers {
    pub input: String,
    pub target: String,
}

impl RoleMarkers {
    pub fn new(input: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            target: target.into(),
        }
    }

    /// Substring an input file name must contain, e.g. `_FP_`
    fn input_needle(&self) -> String {
        format!("{DELIMITER}{}{DELIMITER}", self.input)
    }
}

impl Default for RoleMarkers {
    fn default() -> Self {
        Self::new("FP", "HVF")
    }
}

/// Find every (input, target) pair under `root`
///
/// Each direct sub-directory of `root` is one subject visit. Inside it, every
/// file containing the input marker is parsed and its target name is built by
/// swapping the role token; the pair is kept when that file exists next to it.
///
/// Entries are visited in file-name order, so the result is stable across runs.
/// A marker file that does not parse aborts discovery with `Error::Format`.
pub fn discover_pairs(root: &Path, markers: &RoleMarkers) -> Result<Vec<ImagePair>> {
    if !root.is_dir() {
        return Err(Error::MissingFile {
            path: root.to_path_buf(),
        });
    }

    info!("🔍 Scanning for pairs in {}", root.display());

    let mut pairs = Vec::new();
    let mut folders = 0usize;

    for entry in children(root) {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        folders += 1;
        pairs.extend(pairs_in_folder(entry.path(), markers)?);
    }

    info!("✅ Found {} pairs in {} folders", pairs.len(), folders);
    Ok(pairs)
}

/// Pairs inside a single visit folder
fn pairs_in_folder(folder: &Path, markers: &RoleMarkers) -> Result<Vec<ImagePair>> {
    let needle = markers.input_needle();
    let mut pairs = Vec::new();

    for entry in children(folder) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(file_name) = entry.file_name().to_str() else {
            warn!("Skipping non UTF-8 file name {}", entry.path().display());
            continue;
        };
        if !file_name.contains(&needle) {
            continue;
        }

        let record = SampleRecord::parse(file_name)?;

        let target = folder.join(record.with_role(&markers.target).file_name());
        if target.is_file() {
            pairs.push(ImagePair {
                input: entry.path().to_path_buf(),
                target,
            });
        } else {
            debug!("No target for {} (looked for {})", file_name, target.display());
        }
    }

    Ok(pairs)
}

/// Direct children of `dir`, sorted by file name
///
/// Links are followed, so linked visit folders and images count like real ones.
fn children(dir: &Path) -> impl Iterator<Item = walkdir::Result<DirEntry>> {
    WalkDir::new(PathBuf::from(dir))
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
}
