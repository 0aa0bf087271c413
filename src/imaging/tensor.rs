//! Model-ready tensors and the transform that produces them

use image::{imageops::FilterType, ColorType, DynamicImage};

use crate::config::TransformConfig;
use crate::error::Result;

/// Dense `f32` tensor in channel-height-width order
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: [usize; 3],
    data: Vec<f32>,
}

impl Tensor {
    /// Wrap a CHW buffer; `None` if the length does not match the shape
    pub fn from_chw(shape: [usize; 3], data: Vec<f32>) -> Option<Self> {
        (shape.iter().product::<usize>() == data.len()).then_some(Self { shape, data })
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn channels(&self) -> usize {
        self.shape[0]
    }

    pub fn height(&self) -> usize {
        self.shape[1]
    }

    pub fn width(&self) -> usize {
        self.shape[2]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Value at channel `c`, row `y`, column `x`
    pub fn get(&self, c: usize, y: usize, x: usize) -> Option<f32> {
        let [channels, height, width] = self.shape;
        if c >= channels || y >= height || x >= width {
            return None;
        }
        self.data.get((c * height + y) * width + x).copied()
    }
}

/// Turns a decoded image into a tensor
///
/// The loader applies the same transform to the input photo and to the
/// blended target.
pub trait Transform {
    fn apply(&self, image: &DynamicImage) -> Result<Tensor>;
}

impl<F> Transform for F
where
    F: Fn(&DynamicImage) -> Result<Tensor>,
{
    fn apply(&self, image: &DynamicImage) -> Result<Tensor> {
        self(image)
    }
}

/// Resize, centre crop, optional flip, scale to `[0, 1]`, optional normalise
///
/// Grey images (with or without alpha) give one channel, everything else
/// three; alpha is dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardTransform {
    pub load_size: u32,
    pub crop_size: u32,
    pub flip: bool,
    pub normalize: bool,
}

impl Default for StandardTransform {
    fn default() -> Self {
        TransformConfig::default().into()
    }
}

impl From<TransformConfig> for StandardTransform {
    fn from(cfg: TransformConfig) -> Self {
        Self {
            load_size: cfg.load_size,
            crop_size: cfg.crop_size,
            flip: cfg.flip,
            normalize: cfg.normalize,
        }
    }
}

impl Transform for StandardTransform {
    fn apply(&self, image: &DynamicImage) -> Result<Tensor> {
        let resized = image.resize_exact(self.load_size, self.load_size, FilterType::CatmullRom);

        let crop = self.crop_size.min(self.load_size);
        let offset = (self.load_size - crop) / 2;
        let mut cropped = resized.crop_imm(offset, offset, crop, crop);
        if self.flip {
            cropped = cropped.fliph();
        }

        let grey = matches!(image.color(), ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16);
        let (channels, raw) = if grey {
            (1, cropped.into_luma8().into_raw())
        } else {
            (3, cropped.into_rgb8().into_raw())
        };

        let side = crop as usize;
        let plane = side * side;
        let mut data = vec![0.0f32; channels * plane];
        for (i, px) in raw.chunks_exact(channels).enumerate() {
            for (c, &v) in px.iter().enumerate() {
                let scaled = v as f32 / 255.0;
                data[c * plane + i] = if self.normalize { (scaled - 0.5) / 0.5 } else { scaled };
            }
        }

        Ok(Tensor {
            shape: [channels, side, side],
            data,
        })
    }
}
