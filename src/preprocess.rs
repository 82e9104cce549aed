//! Image bytes to network input.
//!
//! Mirrors the training transform: exact resize to a square (no crop) with a
//! bilinear filter, then `ToTensor` scaling to `[0, 1]`. No mean/std
//! normalization was applied at training time, so none is applied here.

use candle_core::{DType, Device, Tensor};
use image::imageops::{self, FilterType};

use crate::error::DecodeError;
use crate::network::IN_CHANNELS;

pub const DEFAULT_IMAGE_SIZE: u32 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preprocessor {
    image_size: u32,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_SIZE)
    }
}

impl Preprocessor {
    pub fn new(image_size: u32) -> Self {
        Self { image_size }
    }

    /// Decode `bytes` into a `[1, 3, S, S]` f32 tensor on the CPU.
    pub fn preprocess(&self, bytes: &[u8]) -> Result<Tensor, DecodeError> {
        let decoded = image::load_from_memory(bytes)?;
        let rgb = decoded.to_rgb8();

        let size = self.image_size;
        let rgb = if rgb.dimensions() == (size, size) {
            rgb
        } else {
            imageops::resize(&rgb, size, size, FilterType::Triangle)
        };

        let side = size as usize;
        Tensor::from_vec(rgb.into_raw(), (side, side, IN_CHANNELS), &Device::Cpu)
            .and_then(|t| t.permute((2, 0, 1)))
            .and_then(|t| t.to_dtype(DType::F32))
            .and_then(|t| t / 255.)
            .and_then(|t| t.unsqueeze(0))
            .map_err(DecodeError::Layout)
    }
}
