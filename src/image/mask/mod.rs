//! Ink mask extraction.
//!
//! Isolates hand-drawn ink from a photographed or scanned page:
//!
//! 1. bounded Lanczos3 downscale (never upscales)
//! 2. paper color sampled from the top-left corner
//! 3. per-pixel test: far from the paper color AND blue-biased
//! 4. binary median cleanup
//!
//! The result only ever holds [`InkMask::INK`] and [`InkMask::BACKGROUND`].

mod classify;
mod median;
mod sample;

pub use sample::BackgroundSample;

use image::{RgbaImage, imageops::FilterType};

use crate::config::MaskConfig;
use crate::image::raster::{MaskError, RasterImage};

/// Binary ink bitmap, row-major, one byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InkMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl InkMask {
    pub const INK: u8 = 0;
    pub const BACKGROUND: u8 = 255;

    /// Build a mask from raw values; anything non-zero becomes background.
    pub fn from_raw(width: u32, height: u32, mut data: Vec<u8>) -> Option<Self> {
        if data.len() != width as usize * height as usize {
            return None;
        }
        for value in &mut data {
            if *value != Self::INK {
                *value = Self::BACKGROUND;
            }
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Mask from a predicate on pixel coordinates (`true` = ink).
    pub fn from_fn(width: u32, height: u32, is_ink: impl Fn(u32, u32) -> bool) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(if is_ink(x, y) {
                    Self::INK
                } else {
                    Self::BACKGROUND
                });
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn is_ink(&self, x: u32, y: u32) -> bool {
        x < self.width
            && y < self.height
            && self.data[y as usize * self.width as usize + x as usize] == Self::INK
    }

    pub fn ink_count(&self) -> usize {
        self.data.iter().filter(|v| **v == Self::INK).count()
    }

    /// The single value of a uniform (or empty) mask.
    pub fn uniform_value(&self) -> Option<u8> {
        let first = *self.data.first()?;
        self.data.iter().all(|v| *v == first).then_some(first)
    }
}

/// Decode source bytes and extract their ink mask.
pub fn extract_from_bytes(bytes: &[u8], config: &MaskConfig) -> Result<InkMask, MaskError> {
    let image = RasterImage::decode(bytes)?;
    Ok(extract(&image, config))
}

/// Extract the ink mask of a decoded page.
pub fn extract(image: &RasterImage, config: &MaskConfig) -> InkMask {
    let rgba = bound_size(image.to_rgba(), config.max_dimension);
    let (width, height) = rgba.dimensions();

    let background = BackgroundSample::from_corner(&rgba, config.sample_patch);
    crate::debug!(
        "mask";
        "{}x{} paper rgb({:.0}, {:.0}, {:.0})",
        width, height, background.r, background.g, background.b
    );

    let classified = classify::classify_pixels(&rgba, background, config);
    let data = median::median_filter(&classified, width, height, config.median_radius);

    InkMask {
        width,
        height,
        data,
    }
}

/// Shrink so neither side exceeds `max`, preserving aspect ratio.
fn bound_size(img: RgbaImage, max: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    if max == 0 || (w <= max && h <= max) {
        return img;
    }
    let scale = (max as f64 / w as f64).min(max as f64 / h as f64);
    let nw = ((w as f64 * scale).round() as u32).clamp(1, max);
    let nh = ((h as f64 * scale).round() as u32).clamp(1, max);
    image::imageops::resize(&img, nw, nh, FilterType::Lanczos3)
}
