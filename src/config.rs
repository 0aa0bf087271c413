//! Run configuration for the dataset loader and the evaluator
//!
//! Every path and marker that used to be hard-coded lives here with a
//! documented default. The whole struct round-trips through JSON and
//! `#[serde(default)]` lets a config file name only the fields it changes.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::color::ChannelOrder;
use crate::error::{Error, Result};

/// Top-level configuration
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub dataset: DatasetConfig,
    pub evaluation: EvaluationConfig,
}

/// Where the paired images live and how targets are prepared
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DatasetConfig {
    /// Dataset root; pairs are discovered under `dataroot/phase`
    pub dataroot: PathBuf,

    /// Split sub-directory (e.g. "train", "test")
    pub phase: String,

    /// Role token of input (fundus photo) files
    pub input_marker: String,

    /// Role token of target (visual field) files
    pub target_marker: String,

    /// Cross-hair reference graphic blended into every target
    pub overlay_path: PathBuf,

    /// Square edge length targets and overlay are resized to
    pub target_size: u32,

    /// Blend weight of the target image
    pub target_weight: f32,

    /// Blend weight of the overlay
    pub overlay_weight: f32,

    /// Channel order the target and overlay files were written in
    pub target_channel_order: ChannelOrder,

    pub transform: TransformConfig,
}

/// Parameters of the default tensor transform
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct TransformConfig {
    /// Images are first resized to `load_size x load_size`
    pub load_size: u32,

    /// Then centre-cropped to `crop_size x crop_size`
    pub crop_size: u32,

    /// Mirror horizontally
    pub flip: bool,

    /// Map `[0, 1]` to `[-1, 1]` (mean 0.5, std 0.5)
    pub normalize: bool,
}

/// Where generated results live and how they are matched
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Flat directory holding `*_real_B*` / `*_fake_B*` files
    pub results_dir: PathBuf,

    /// Workbook path; `None` means `result_<results dir name>.xlsx`
    pub output: Option<PathBuf>,

    /// Substring that marks ground-truth files
    pub real_marker: String,

    /// Replacement for `real_marker` that names the generated file
    pub generated_marker: String,

    /// SSIM window edge length (odd, at least 3)
    pub ssim_window: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            dataroot: PathBuf::from("./datasets"),
            phase: "train".to_string(),
            input_marker: "FP".to_string(),
            target_marker: "HVF".to_string(),
            overlay_path: PathBuf::from("gray_cross.jpg"),
            target_size: 256,
            target_weight: 0.8,
            overlay_weight: 0.2,
            target_channel_order: ChannelOrder::Rgb,
            transform: TransformConfig::default(),
        }
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            load_size: 286,
            crop_size: 256,
            flip: false,
            normalize: true,
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("./results/Pix2Pix_22"),
            output: None,
            real_marker: "_real_B".to_string(),
            generated_marker: "_fake_B".to_string(),
            ssim_window: 3,
        }
    }
}

impl Config {
    /// Serialize to pretty JSON
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config = Self::from_json(&text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field for values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        self.dataset.validate()?;
        self.evaluation.validate()
    }
}

impl DatasetConfig {
    /// Directory the pairs are discovered in
    pub fn phase_root(&self) -> PathBuf {
        self.dataroot.join(&self.phase)
    }

    pub fn validate(&self) -> Result<()> {
        check_markers(&self.input_marker, &self.target_marker)?;
        if self.input_marker.contains('_') || self.target_marker.contains('_') {
            return Err(Error::Config("role markers must not contain '_'".to_string()));
        }
        if self.target_size == 0 {
            return Err(Error::Config("target_size must be positive".to_string()));
        }
        for (name, weight) in [("target_weight", self.target_weight), ("overlay_weight", self.overlay_weight)] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::Config(format!("{name} must be a finite non-negative number")));
            }
        }
        let t = &self.transform;
        if t.load_size == 0 || t.crop_size == 0 {
            return Err(Error::Config("transform sizes must be positive".to_string()));
        }
        if t.crop_size > t.load_size {
            return Err(Error::Config(format!(
                "crop_size {} exceeds load_size {}",
                t.crop_size, t.load_size
            )));
        }
        Ok(())
    }
}

impl EvaluationConfig {
    /// Workbook path, falling back to `result_<results dir name>.xlsx`
    pub fn output_path(&self) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }
        let name = self
            .results_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "evaluation".to_string());
        PathBuf::from(format!("result_{name}.xlsx"))
    }

    pub fn validate(&self) -> Result<()> {
        check_markers(&self.real_marker, &self.generated_marker)?;
        if self.ssim_window < 3 || self.ssim_window % 2 == 0 {
            return Err(Error::Config(format!(
                "ssim_window must be odd and at least 3, got {}",
                self.ssim_window
            )));
        }
        Ok(())
    }
}

fn check_markers(first: &str, second: &str) -> Result<()> {
    if first.is_empty() || second.is_empty() {
        return Err(Error::Config("markers must not be empty".to_string()));
    }
    if first == second {
        return Err(Error::Config(format!("markers must differ, both are {first:?}")));
    }
    Ok(())
}
