//! Multi-format rasterization of normalized documents.
//!
//! Documents are rendered supersampled, downsampled with Lanczos3 in
//! premultiplied space, then demultiplied and encoded. No I/O happens here.

mod encode;

use std::fmt;

use image::RgbaImage;
use image::imageops::{self, FilterType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use encode::{encode_avif, encode_png};

use crate::config::RasterConfig;
use crate::image::color::ColorSlotAssignment;
use crate::image::svg::{Fit, RenderError, VectorDocument, render};

/// Derivative formats a collection can allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Vector,
    Lossless,
    Lossy,
}

impl OutputFormat {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Vector => "vector",
            Self::Lossless => "lossless",
            Self::Lossy => "lossy",
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Vector => "svg",
            Self::Lossless => "png",
            Self::Lossy => "avif",
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Vector => "image/svg+xml",
            Self::Lossless => "image/png",
            Self::Lossy => "image/avif",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum RasterizeError {
    #[error("{0} is not a raster format")]
    NotRaster(OutputFormat),

    #[error("raster size must be positive")]
    ZeroSize,

    #[error("render size {size} x {supersample} overflows")]
    TooLarge { size: u32, supersample: u32 },

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("encode failed: {0}")]
    Encode(String),
}

/// Render `doc` to a `size x size` straight-alpha image.
pub fn rasterize_pixels(
    doc: &VectorDocument,
    assignment: &ColorSlotAssignment,
    size: u32,
    config: &RasterConfig,
) -> Result<RgbaImage, RasterizeError> {
    if size == 0 {
        return Err(RasterizeError::ZeroSize);
    }
    let supersample = config.supersample.max(1);
    let render_size = size
        .checked_mul(supersample)
        .ok_or(RasterizeError::TooLarge { size, supersample })?;

    let rendered = render(doc, assignment, render_size, render_size, Fit::Contain)?;
    let premultiplied = RgbaImage::from_raw(render_size, render_size, rendered.data)
        .ok_or_else(|| RasterizeError::Encode("render buffer size mismatch".to_string()))?;

    let mut image = if supersample > 1 {
        imageops::resize(&premultiplied, size, size, FilterType::Lanczos3)
    } else {
        premultiplied
    };
    demultiply(&mut image);
    Ok(image)
}

/// Rasterize and encode one derivative.
pub fn rasterize(
    doc: &VectorDocument,
    assignment: &ColorSlotAssignment,
    format: OutputFormat,
    size: u32,
    config: &RasterConfig,
) -> Result<Vec<u8>, RasterizeError> {
    if format == OutputFormat::Vector {
        return Err(RasterizeError::NotRaster(format));
    }
    let image = rasterize_pixels(doc, assignment, size, config)?;
    match format {
        OutputFormat::Lossless => encode_png(&image),
        OutputFormat::Lossy => encode_avif(&image, config),
        OutputFormat::Vector => Err(RasterizeError::NotRaster(format)),
    }
}

/// Premultiplied → straight alpha; fully transparent pixels become zero.
fn demultiply(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        let a = pixel[3];
        if a == 0 {
            pixel.0 = [0, 0, 0, 0];
            continue;
        }
        for c in &mut pixel.0[..3] {
            let straight = (*c as f32 * 255.0 / a as f32).round();
            *c = straight.min(255.0) as u8;
        }
    }
}
