//! PNG and AVIF encoders for straight-alpha RGBA buffers.

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use ravif::{Img, RGBA8};

use super::RasterizeError;
use crate::config::RasterConfig;

/// True-color RGBA PNG, best compression, adaptive filtering.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, RasterizeError> {
    let mut out = Vec::new();
    PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| RasterizeError::Encode(e.to_string()))?;
    Ok(out)
}

/// AVIF at the configured quality and speed; alpha uses the same quality.
pub fn encode_avif(image: &RgbaImage, config: &RasterConfig) -> Result<Vec<u8>, RasterizeError> {
    let pixels: Vec<RGBA8> = image
        .as_raw()
        .chunks_exact(4)
        .map(|p| RGBA8::new(p[0], p[1], p[2], p[3]))
        .collect();
    let encoded = ravif::Encoder::new()
        .with_quality(config.lossy_quality)
        .with_alpha_quality(config.lossy_quality)
        .with_speed(config.lossy_speed)
        .encode_rgba(Img::new(
            pixels.as_slice(),
            image.width() as usize,
            image.height() as usize,
        ))
        .map_err(|e| RasterizeError::Encode(e.to_string()))?;
    Ok(encoded.avif_file)
}
