//! Image similarity metrics between two equally shaped 8-bit rasters
//!
//! - MSE / MAE: mean squared / absolute per-sample difference
//! - PSNR: `20 log10(255) - 10 log10(MSE)`, `+inf` for identical images
//! - SSIM: uniform-window structural similarity, averaged per channel
//!
//! Differences are taken in `f64`, never in `u8`.

use image::{DynamicImage, GrayImage, RgbImage};
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::error::{Error, Result};
use crate::imaging::load_image;

/// Largest 8-bit sample value, used as PSNR peak and SSIM data range
pub const MAX_PIXEL_VALUE: f64 = 255.0;

/// Errors raised by the metric functions themselves
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MetricError {
    #[error("shape mismatch: {left} vs {right}")]
    ShapeMismatch { left: Shape, right: Shape },

    #[error("SSIM window {window} does not fit a {width}x{height} image")]
    WindowTooLarge { window: usize, width: u32, height: u32 },

    #[error("SSIM window must be odd and at least 3, got {0}")]
    InvalidWindow(usize),

    #[error("buffer of {actual} samples does not match shape {shape}")]
    BadBufferLength { shape: Shape, actual: usize },
}

/// Width, height and channel count of a raster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.channels)
    }
}

/// Interleaved 8-bit image buffer
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    shape: Shape,
    samples: Vec<u8>,
}

impl Raster {
    pub fn new(width: u32, height: u32, channels: u8, samples: Vec<u8>) -> std::result::Result<Self, MetricError> {
        let shape = Shape { width, height, channels };
        let expected = width as usize * height as usize * channels as usize;
        if expected == 0 || samples.len() != expected {
            return Err(MetricError::BadBufferLength {
                shape,
                actual: samples.len(),
            });
        }
        Ok(Self { shape, samples })
    }

    /// Decode a file as 3-channel 8-bit color
    pub fn open(path: &Path) -> Result<Self> {
        Ok(load_image(path)?.into_rgb8().into())
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// One channel as `f64`, row-major
    fn plane(&self, channel: usize) -> Vec<f64> {
        let step = self.shape.channels as usize;
        self.samples
            .iter()
            .skip(channel)
            .step_by(step)
            .map(|&v| v as f64)
            .collect()
    }
}

impl From<GrayImage> for Raster {
    fn from(img: GrayImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            shape: Shape { width, height, channels: 1 },
            samples: img.into_raw(),
        }
    }
}

impl From<RgbImage> for Raster {
    fn from(img: RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            shape: Shape { width, height, channels: 3 },
            samples: img.into_raw(),
        }
    }
}

impl From<DynamicImage> for Raster {
    fn from(img: DynamicImage) -> Self {
        img.into_rgb8().into()
    }
}

fn check_shapes(a: &Raster, b: &Raster) -> std::result::Result<(), MetricError> {
    if a.shape != b.shape {
        return Err(MetricError::ShapeMismatch {
            left: a.shape,
            right: b.shape,
        });
    }
    Ok(())
}

fn mean_of<F>(a: &Raster, b: &Raster, f: F) -> std::result::Result<f64, MetricError>
where
    F: Fn(f64) -> f64,
{
    check_shapes(a, b)?;
    let sum: f64 = a
        .samples
        .iter()
        .zip(&b.samples)
        .map(|(&x, &y)| f(x as f64 - y as f64))
        .sum();
    Ok(sum / a.samples.len() as f64)
}

/// Mean squared error
pub fn mse(a: &Raster, b: &Raster) -> std::result::Result<f64, MetricError> {
    mean_of(a, b, |d| d * d)
}

/// Mean absolute error
pub fn mae(a: &Raster, b: &Raster) -> std::result::Result<f64, MetricError> {
    mean_of(a, b, f64::abs)
}

/// PSNR from an already computed MSE
pub fn psnr_from_mse(mse: f64) -> f64 {
    if mse == 0.0 {
        return f64::INFINITY;
    }
    20.0 * MAX_PIXEL_VALUE.log10() - 10.0 * mse.log10()
}

/// Peak signal-to-noise ratio in dB
pub fn psnr(a: &Raster, b: &Raster) -> std::result::Result<f64, MetricError> {
    Ok(psnr_from_mse(mse(a, b)?))
}

/// SSIM parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SsimParams {
    /// Edge length of the square uniform window (odd)
    pub win_size: usize,
    pub k1: f64,
    pub k2: f64,
    pub data_range: f64,
}

impl Default for SsimParams {
    fn default() -> Self {
        Self::with_window(3)
    }
}

impl SsimParams {
    pub fn with_window(win_size: usize) -> Self {
        Self {
            win_size,
            k1: 0.01,
            k2: 0.03,
            data_range: MAX_PIXEL_VALUE,
        }
    }
}

/// Mean structural similarity
///
/// Each channel is scored separately and the channel scores are averaged.
/// Local statistics use a `win_size x win_size` uniform window with sample
/// covariance (`N / (N - 1)`); only positions where the window lies fully
/// inside the image contribute to the mean.
pub fn ssim(a: &Raster, b: &Raster, params: &SsimParams) -> std::result::Result<f64, MetricError> {
    check_shapes(a, b)?;
    let win = params.win_size;
    if win < 3 || win % 2 == 0 {
        return Err(MetricError::InvalidWindow(win));
    }
    let Shape { width, height, channels } = a.shape;
    if win > width as usize || win > height as usize {
        return Err(MetricError::WindowTooLarge {
            window: win,
            width,
            height,
        });
    }

    let total: f64 = (0..channels as usize)
        .map(|c| ssim_plane(&a.plane(c), &b.plane(c), width as usize, height as usize, params))
        .sum();
    Ok(total / channels as f64)
}

fn ssim_plane(x: &[f64], y: &[f64], width: usize, height: usize, params: &SsimParams) -> f64 {
    let win = params.win_size;
    let np = (win * win) as f64;
    let cov_norm = np / (np - 1.0);
    let c1 = (params.k1 * params.data_range).powi(2);
    let c2 = (params.k2 * params.data_range).powi(2);

    let mut total = 0.0;
    let mut count = 0usize;

    for top in 0..=(height - win) {
        for left in 0..=(width - win) {
            let (mut sx, mut sy, mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
            for row in top..top + win {
                let start = row * width + left;
                for (&p, &q) in x[start..start + win].iter().zip(&y[start..start + win]) {
                    sx += p;
                    sy += q;
                    sxx += p * p;
                    syy += q * q;
                    sxy += p * q;
                }
            }

            let (ux, uy) = (sx / np, sy / np);
            let vx = cov_norm * (sxx / np - ux * ux);
            let vy = cov_norm * (syy / np - uy * uy);
            let vxy = cov_norm * (sxy / np - ux * uy);

            let a1 = 2.0 * ux * uy + c1;
            let a2 = 2.0 * vxy + c2;
            let b1 = ux * ux + uy * uy + c1;
            let b2 = vx + vy + c2;

            total += (a1 * a2) / (b1 * b2);
            count += 1;
        }
    }

    total / count as f64
}

/// All four scores for one real/generated pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleScores {
    pub ssim: f64,
    pub psnr: f64,
    pub mse: f64,
    pub mae: f64,
}

/// Score a pair; fails on any shape mismatch before computing anything
pub fn score(real: &Raster, generated: &Raster, params: &SsimParams) -> std::result::Result<SampleScores, MetricError> {
    check_shapes(real, generated)?;
    let mse_value = mse(real, generated)?;
    Ok(SampleScores {
        ssim: ssim(real, generated, params)?,
        psnr: psnr_from_mse(mse_value),
        mse: mse_value,
        mae: mae(real, generated)?,
    })
}

/// Score a named pair, mapping failures to crate errors
pub(crate) fn score_sample(sample: &str, real: &Raster, generated: &Raster, params: &SsimParams) -> Result<SampleScores> {
    if real.shape() != generated.shape() {
        return Err(Error::ShapeMismatch {
            sample: sample.to_string(),
            real: real.shape(),
            generated: generated.shape(),
        });
    }
    score(real, generated, params).map_err(|source| Error::Metric {
        sample: sample.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::{Luma, Rgb};

    fn grey(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> Raster {
        GrayImage::from_fn(width, height, |x, y| Luma([f(x, y)])).into()
    }

    fn gradient() -> Raster {
        RgbImage::from_fn(8, 6, |x, y| Rgb([(x * 30) as u8, (y * 40) as u8, ((x + y) * 10) as u8])).into()
    }

    #[test]
    fn test_constant_offset_scenario() {
        let a = grey(4, 4, |x, y| (x * 10 + y * 20) as u8);
        let b = grey(4, 4, |x, y| (x * 10 + y * 20 + 10) as u8);

        assert_relative_eq!(mse(&a, &b).unwrap(), 100.0);
        assert_relative_eq!(mae(&a, &b).unwrap(), 10.0);
        let expected = 20.0 * 255f64.log10() - 10.0 * 100f64.log10();
        assert_relative_eq!(psnr(&a, &b).unwrap(), expected, epsilon = 1e-12);
        assert_relative_eq!(psnr(&a, &b).unwrap(), 28.1308, epsilon = 1e-4);
    }

    #[test]
    fn test_identical_images() {
        let a = gradient();
        assert_eq!(mse(&a, &a).unwrap(), 0.0);
        assert_eq!(mae(&a, &a).unwrap(), 0.0);
        assert_eq!(psnr(&a, &a).unwrap(), f64::INFINITY);
        assert_relative_eq!(ssim(&a, &a, &SsimParams::default()).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_metrics_are_symmetric() {
        let a = gradient();
        let b: Raster = RgbImage::from_fn(8, 6, |x, y| Rgb([(x * 29) as u8, (y * 41) as u8, 7])).into();
        let params = SsimParams::default();

        assert_relative_eq!(psnr(&a, &b).unwrap(), psnr(&b, &a).unwrap());
        assert_relative_eq!(mae(&a, &b).unwrap(), mae(&b, &a).unwrap());
        assert_relative_eq!(ssim(&a, &b, &params).unwrap(), ssim(&b, &a, &params).unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn test_single_pixel_change_is_detected() {
        let a = grey(5, 5, |_, _| 50);
        let b = grey(5, 5, |x, y| if (x, y) == (2, 2) { 51 } else { 50 });

        assert!(mse(&a, &b).unwrap() > 0.0);
        assert!(mae(&a, &b).unwrap() > 0.0);
        assert!(psnr(&a, &b).unwrap().is_finite());
        assert!(ssim(&a, &b, &SsimParams::default()).unwrap() < 1.0);
    }

    #[test]
    fn test_no_u8_wraparound() {
        let a = grey(3, 3, |_, _| 0);
        let b = grey(3, 3, |_, _| 255);
        assert_relative_eq!(mse(&a, &b).unwrap(), 255.0 * 255.0);
        assert_relative_eq!(mae(&a, &b).unwrap(), 255.0);
        assert_relative_eq!(psnr(&a, &b).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ssim_of_flat_images_matches_luminance_term() {
        // Variances vanish, so SSIM reduces to (2ab + C1) / (a^2 + b^2 + C1)
        let a = grey(4, 4, |_, _| 100);
        let b = grey(4, 4, |_, _| 110);
        let c1 = (0.01f64 * 255.0).powi(2);
        let expected = (2.0 * 100.0 * 110.0 + c1) / (100.0f64.powi(2) + 110.0f64.powi(2) + c1);

        assert_relative_eq!(ssim(&a, &b, &SsimParams::default()).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_ssim_single_window_by_hand() {
        // 3x3 image with a 3x3 window: exactly one window position
        let a = grey(3, 3, |x, _| [0u8, 0, 255][x as usize]);
        let b = grey(3, 3, |_, _| 0);

        let ux: f64 = 255.0 / 3.0;
        let vx = 9.0 / 8.0 * (255.0f64.powi(2) / 3.0 - ux * ux);
        let c1 = (0.01f64 * 255.0).powi(2);
        let c2 = (0.03f64 * 255.0).powi(2);
        let expected = (c1 * c2) / ((ux * ux + c1) * (vx + c2));

        assert_relative_eq!(ssim(&a, &b, &SsimParams::default()).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_ssim_averages_channels() {
        let a: Raster = RgbImage::from_pixel(4, 4, Rgb([100, 100, 100])).into();
        let b: Raster = RgbImage::from_pixel(4, 4, Rgb([100, 110, 100])).into();
        let c1 = (0.01f64 * 255.0).powi(2);
        let green = (2.0 * 100.0 * 110.0 + c1) / (100.0f64.powi(2) + 110.0f64.powi(2) + c1);

        let value = ssim(&a, &b, &SsimParams::default()).unwrap();
        assert_relative_eq!(value, (1.0 + green + 1.0) / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_shape_mismatch() {
        let a = grey(4, 4, |_, _| 0);
        let b = grey(4, 5, |_, _| 0);
        assert!(matches!(mse(&a, &b), Err(MetricError::ShapeMismatch { .. })));

        let rgb: Raster = RgbImage::new(4, 4).into();
        assert!(matches!(mae(&a, &rgb), Err(MetricError::ShapeMismatch { .. })));

        let err = score_sample("x_real_B.png", &a, &b, &SsimParams::default()).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_window_checks() {
        let a = grey(2, 8, |_, _| 0);
        assert!(matches!(
            ssim(&a, &a, &SsimParams::default()),
            Err(MetricError::WindowTooLarge { window: 3, .. })
        ));

        let b = grey(8, 8, |_, _| 0);
        assert!(matches!(
            ssim(&b, &b, &SsimParams::with_window(4)),
            Err(MetricError::InvalidWindow(4))
        ));
        assert!(ssim(&b, &b, &SsimParams::with_window(7)).is_ok());
    }

    #[test]
    fn test_raster_buffer_length() {
        assert!(Raster::new(2, 2, 3, vec![0; 12]).is_ok());
        assert!(matches!(
            Raster::new(2, 2, 3, vec![0; 11]),
            Err(MetricError::BadBufferLength { actual: 11, .. })
        ));
        assert!(Raster::new(0, 2, 1, Vec::new()).is_err());
    }
}
