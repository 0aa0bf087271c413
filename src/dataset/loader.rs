//! Indexed access to discovered pairs as model-ready samples

use image::DynamicImage;
use log::{debug, info};
use std::path::{Path, PathBuf};

use super::discovery::{discover_pairs, RoleMarkers};
use super::record::ImagePair;
use crate::config::DatasetConfig;
use crate::error::{Error, Result};
use crate::imaging::{load_image, prepare_target, BlendParams, StandardTransform, Tensor, Transform};

/// One loaded pair
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Transformed fundus photo
    pub input: Tensor,
    /// Transformed, overlay-blended visual field map
    pub target: Tensor,
    pub input_path: PathBuf,
    pub target_path: PathBuf,
}

/// Dataset of (fundus photo, visual field map) pairs
///
/// Pairs are discovered once when the dataset is opened; images are decoded
/// on every `get`, nothing is cached.
#[derive(Debug)]
pub struct PairedDataset<T> {
    root: PathBuf,
    pairs: Vec<ImagePair>,
    overlay: PathBuf,
    blend: BlendParams,
    transform: T,
}

impl PairedDataset<StandardTransform> {
    /// Open with the transform described by `cfg.transform`
    pub fn with_default_transform(cfg: &DatasetConfig) -> Result<Self> {
        Self::open(cfg, StandardTransform::from(cfg.transform))
    }
}

impl<T: Transform> PairedDataset<T> {
    /// Discover pairs under `cfg.dataroot/cfg.phase`
    ///
    /// Zero pairs is an error: an empty dataset is almost always a wrong path.
    pub fn open(cfg: &DatasetConfig, transform: T) -> Result<Self> {
        cfg.validate()?;
        let root = cfg.phase_root();
        let markers = RoleMarkers::new(&cfg.input_marker, &cfg.target_marker);
        let pairs = discover_pairs(&root, &markers)?;
        if pairs.is_empty() {
            return Err(Error::EmptyDataset(format!(
                "no {}/{} pairs under {}",
                markers.input,
                markers.target,
                root.display()
            )));
        }

        info!("📁 Dataset {} ready with {} pairs", root.display(), pairs.len());

        Ok(Self {
            root,
            pairs,
            overlay: cfg.overlay_path.clone(),
            blend: BlendParams::from(cfg),
            transform,
        })
    }

    /// Build from an already known list of pairs
    pub fn from_pairs(pairs: Vec<ImagePair>, overlay: PathBuf, blend: BlendParams, transform: T) -> Self {
        Self {
            root: PathBuf::new(),
            pairs,
            overlay,
            blend,
            transform,
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[ImagePair] {
        &self.pairs
    }

    /// Directory the pairs were discovered in (empty for `from_pairs`)
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load, blend and transform the pair at `index`
    pub fn get(&self, index: usize) -> Result<Sample> {
        let pair = self.pairs.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.pairs.len(),
        })?;

        let input = load_image(&pair.input)?;
        let target = prepare_target(&pair.target, &self.overlay, &self.blend)?;

        let input = self.transform.apply(&input)?;
        let target = self.transform.apply(&DynamicImage::ImageRgb8(target))?;

        debug!(
            "Loaded sample {}: input {:?}, target {:?}",
            index,
            input.shape(),
            target.shape()
        );

        Ok(Sample {
            input,
            target,
            input_path: pair.input.clone(),
            target_path: pair.target.clone(),
        })
    }

    /// Every sample in discovery order
    pub fn iter(&self) -> impl Iterator<Item = Result<Sample>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }
}
