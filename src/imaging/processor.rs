//! Image loading and target preparation
//!
//! Targets (visual field maps) are normalised to RGB, resized to a fixed
//! square and composited with the cross-hair overlay before the tensor
//! transform sees them. Input photos are passed through untouched.

use image::{imageops::FilterType, DynamicImage, RgbImage};
use log::debug;
use std::fs;
use std::path::Path;

use crate::color::{add_weighted, to_canonical_rgb, ChannelOrder};
use crate::config::DatasetConfig;
use crate::error::{Error, Result};

/// Default edge length of prepared targets
pub const TARGET_SIZE: u32 = 256;

/// How a target is resized and composited with the overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendParams {
    /// Square edge length for target and overlay
    pub size: u32,
    pub target_weight: f32,
    pub overlay_weight: f32,
    pub channel_order: ChannelOrder,
}

impl Default for BlendParams {
    fn default() -> Self {
        Self {
            size: TARGET_SIZE,
            target_weight: 0.8,
            overlay_weight: 0.2,
            channel_order: ChannelOrder::Rgb,
        }
    }
}

impl From<&DatasetConfig> for BlendParams {
    fn from(cfg: &DatasetConfig) -> Self {
        Self {
            size: cfg.target_size,
            target_weight: cfg.target_weight,
            overlay_weight: cfg.overlay_weight,
            channel_order: cfg.target_channel_order,
        }
    }
}

/// Decode an image file with its native color type
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    if !path.is_file() {
        return Err(Error::MissingFile {
            path: path.to_path_buf(),
        });
    }
    image::open(path).map_err(|source| Error::Image {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode, normalise to RGB and resize to `size x size` (bilinear)
pub fn load_rgb_resized(path: &Path, size: u32, order: ChannelOrder) -> Result<RgbImage> {
    let rgb = to_canonical_rgb(load_image(path)?, order);
    Ok(image::imageops::resize(&rgb, size, size, FilterType::Triangle))
}

/// Load a target and blend the overlay into it
///
/// `result = target_weight * target + overlay_weight * overlay`, both resized
/// to `params.size` first.
pub fn prepare_target(target: &Path, overlay: &Path, params: &BlendParams) -> Result<RgbImage> {
    let target_img = load_rgb_resized(target, params.size, params.channel_order)?;
    let overlay_img = load_rgb_resized(overlay, params.size, params.channel_order)?;

    debug!(
        "Blending {} with overlay {} ({}/{})",
        target.display(),
        overlay.display(),
        params.target_weight,
        params.overlay_weight
    );

    add_weighted(&target_img, params.target_weight, &overlay_img, params.overlay_weight, 0.0)
}

/// Write an image to disk, creating the parent directory if needed
pub fn save_preview(image: &RgbImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    image.save(path).map_err(|source| Error::Image {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("📸 Saved preview: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_prepare_target_blends_and_resizes() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("1_HVF_OS_20190101.png");
        let overlay = dir.path().join("gray_cross.png");
        RgbImage::from_pixel(64, 48, Rgb([100, 100, 100])).save(&target).unwrap();
        RgbImage::from_pixel(32, 32, Rgb([200, 200, 200])).save(&overlay).unwrap();

        let params = BlendParams {
            size: 16,
            ..BlendParams::default()
        };
        let blended = prepare_target(&target, &overlay, &params).unwrap();

        assert_eq!(blended.dimensions(), (16, 16));
        assert_eq!(blended.get_pixel(0, 0).0, [120, 120, 120]);
        assert_eq!(blended.get_pixel(15, 15).0, [120, 120, 120]);
    }

    #[test]
    fn test_target_at_final_size_is_not_resampled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1_HVF_OS_20190101.png");
        let img = RgbImage::from_fn(TARGET_SIZE, TARGET_SIZE, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x * 7 + y * 13) % 256) as u8])
        });
        img.save(&path).unwrap();

        let loaded = load_rgb_resized(&path, TARGET_SIZE, ChannelOrder::Rgb).unwrap();
        assert_eq!(loaded, img);
    }

    #[test]
    fn test_bgr_targets_are_swapped_before_blending() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("t.png");
        let overlay = dir.path().join("o.png");
        RgbImage::from_pixel(8, 8, Rgb([0, 0, 250])).save(&target).unwrap();
        RgbImage::from_pixel(8, 8, Rgb([0, 0, 0])).save(&overlay).unwrap();

        let params = BlendParams {
            size: 8,
            target_weight: 1.0,
            overlay_weight: 0.0,
            channel_order: ChannelOrder::Bgr,
        };
        let blended = prepare_target(&target, &overlay, &params).unwrap();
        assert_eq!(blended.get_pixel(3, 3).0, [250, 0, 0]);
    }

    #[test]
    fn test_missing_overlay_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("t.png");
        RgbImage::new(8, 8).save(&target).unwrap();

        let err = prepare_target(&target, &dir.path().join("gray_cross.jpg"), &BlendParams::default())
            .unwrap_err();
        match err {
            Error::MissingFile { path } => assert!(path.ends_with("gray_cross.jpg")),
            other => panic!("expected missing file, got {other:?}"),
        }
    }

    #[test]
    fn test_undecodable_file_is_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        fs::write(&path, b"not a png").unwrap();
        assert!(matches!(load_image(&path), Err(Error::Image { .. })));
    }

    #[test]
    fn test_save_preview_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("previews/nested/out.png");
        save_preview(&RgbImage::new(4, 4), &path).unwrap();
        assert!(path.is_file());
    }
}
