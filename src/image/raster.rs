//! Decoded source images.

use image::{DynamicImage, RgbImage, RgbaImage};
use thiserror::Error;

/// Errors raised while turning source bytes into a [`RasterImage`].
#[derive(Debug, Error)]
pub enum MaskError {
    #[error("cannot decode source image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("source image has {channels} channel(s), need RGB or RGBA")]
    UnsupportedChannelLayout { channels: u8 },
}

/// Color channel layout of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelLayout {
    Rgb,
    Rgba,
}

/// Immutable 8-bit image, RGB or RGBA.
#[derive(Debug, Clone)]
pub struct RasterImage {
    width: u32,
    height: u32,
    layout: ChannelLayout,
    pixels: Vec<u8>,
}

impl RasterImage {
    /// Decode PNG, JPEG or WebP bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, MaskError> {
        let decoded = image::load_from_memory(bytes)?;
        Self::from_dynamic(decoded)
    }

    /// Accept any image with at least three color channels.
    ///
    /// Grayscale inputs are rejected instead of silently expanded, since
    /// the ink classifier depends on the blue channel.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self, MaskError> {
        let color = image.color();
        let channels = color.channel_count();
        if channels < 3 {
            return Err(MaskError::UnsupportedChannelLayout { channels });
        }
        Ok(if color.has_alpha() {
            Self::from_rgba(image.to_rgba8())
        } else {
            Self::from_rgb(image.to_rgb8())
        })
    }

    pub fn from_rgb(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            layout: ChannelLayout::Rgb,
            pixels: image.into_raw(),
        }
    }

    pub fn from_rgba(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            layout: ChannelLayout::Rgba,
            pixels: image.into_raw(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA copy, synthesizing an opaque alpha channel when absent.
    pub fn to_rgba(&self) -> RgbaImage {
        let rgba = match self.layout {
            ChannelLayout::Rgba => self.pixels.clone(),
            ChannelLayout::Rgb => self
                .pixels
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect(),
        };
        // Buffer length always matches width * height * 4.
        RgbaImage::from_raw(self.width, self.height, rgba)
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }
}
