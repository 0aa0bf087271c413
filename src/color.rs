//! Channel order and pixel blending utilities
//!
//! This module handles:
//! - Normalising decoded images to RGB channel order
//! - Weighted blending of two equally sized RGB images (overlay compositing)

use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Channel order of the pixel data stored in a file
///
/// Some exporters write BGR data into containers that decoders read as RGB.
/// `Bgr` tells the loader to swap red and blue back.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

/// Convert any decoded image to 8-bit RGB in canonical channel order
pub fn to_canonical_rgb(image: DynamicImage, order: ChannelOrder) -> RgbImage {
    let mut rgb = image.into_rgb8();
    if order == ChannelOrder::Bgr {
        swap_red_blue(&mut rgb);
    }
    rgb
}

/// Swap the first and third channel of every pixel in place
pub fn swap_red_blue(image: &mut RgbImage) {
    for pixel in image.pixels_mut() {
        pixel.0.swap(0, 2);
    }
}

/// Weighted sum of two images: `alpha * a + beta * b + gamma`
///
/// Computed per channel in `f32`, rounded half-to-even and saturated to the
/// 8-bit range. Both images must have the same dimensions.
pub fn add_weighted(a: &RgbImage, alpha: f32, b: &RgbImage, beta: f32, gamma: f32) -> Result<RgbImage> {
    let mismatch = || Error::BlendSize {
        left: a.dimensions(),
        right: b.dimensions(),
    };
    if a.dimensions() != b.dimensions() {
        return Err(mismatch());
    }

    let blended = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(&x, &y)| saturate_u8(alpha * x as f32 + beta * y as f32 + gamma))
        .collect::<Vec<u8>>();

    RgbImage::from_raw(a.width(), a.height(), blended).ok_or_else(mismatch)
}

fn saturate_u8(value: f32) -> u8 {
    value.round_ties_even().clamp(0.0, 255.0) as u8
}
