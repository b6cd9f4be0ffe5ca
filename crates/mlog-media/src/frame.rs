//! Single-channel intensity frames.

use mlog_models::{ColorChannel, Resolution};

use crate::error::{MediaError, MediaResult};

/// A row-major grid of 8-bit intensity samples from one color channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    /// Wrap a row-major pixel buffer. The buffer must hold exactly
    /// `width * height` samples.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> MediaResult<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(MediaError::decode_failed(format!(
                "expected {} samples for {}x{}, got {}",
                expected,
                width,
                height,
                pixels.len()
            )));
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A frame with every sample set to `value`.
    pub fn filled(resolution: Resolution, value: u8) -> Self {
        Self {
            width: resolution.width,
            height: resolution.height,
            pixels: vec![value; resolution.pixel_count()],
        }
    }

    /// Extract one channel from a packed RGB buffer.
    pub fn from_rgb(width: u32, height: u32, rgb: &[u8], channel: ColorChannel) -> MediaResult<Self> {
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected {
            return Err(MediaError::decode_failed(format!(
                "expected {} RGB bytes for {}x{}, got {}",
                expected,
                width,
                height,
                rgb.len()
            )));
        }

        let offset = channel.rgb_offset();
        let pixels = rgb.chunks_exact(3).map(|px| px[offset]).collect();

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Decode an encoded still (PNG) and keep one channel.
    pub fn decode(bytes: &[u8], channel: ColorChannel) -> MediaResult<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| MediaError::decode_failed(e.to_string()))?
            .to_rgb8();

        let (width, height) = image.dimensions();
        Self::from_rgb(width, height, image.as_raw(), channel)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Sample at column `x`, row `y`.
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Mutable access to the sample buffer.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }
}
