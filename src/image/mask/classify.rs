use image::RgbaImage;
use rayon::prelude::*;

use super::InkMask;
use super::sample::BackgroundSample;
use crate::config::MaskConfig;

const PARALLEL_PIXEL_THRESHOLD: usize = 32 * 1024;

struct InkClassifier {
    background: BackgroundSample,
    distance_threshold_sq: f32,
    blue_bias_threshold: f32,
}

impl InkClassifier {
    #[inline]
    fn classify(&self, out: &mut u8, pixel: &[u8]) {
        let (r, g, b) = (pixel[0] as f32, pixel[1] as f32, pixel[2] as f32);
        let dr = r - self.background.r;
        let dg = g - self.background.g;
        let db = b - self.background.b;
        let distance_sq = dr * dr + dg * dg + db * db;
        let blue_bias = b - r.max(g);

        *out = if distance_sq > self.distance_threshold_sq && blue_bias > self.blue_bias_threshold {
            InkMask::INK
        } else {
            InkMask::BACKGROUND
        };
    }
}

/// Per-pixel ink test against the sampled paper color.
///
/// Only the first three channels take part; alpha is ignored.
pub(super) fn classify_pixels(
    img: &RgbaImage,
    background: BackgroundSample,
    config: &MaskConfig,
) -> Vec<u8> {
    let len = img.width() as usize * img.height() as usize;
    let mut out = vec![InkMask::BACKGROUND; len];
    let threshold = config.distance_threshold.max(0.0);
    let classifier = InkClassifier {
        background,
        distance_threshold_sq: threshold * threshold,
        blue_bias_threshold: config.blue_bias_threshold,
    };
    let raw = img.as_raw();

    if len >= PARALLEL_PIXEL_THRESHOLD {
        out.par_iter_mut()
            .zip(raw.par_chunks_exact(4))
            .for_each(|(value, pixel)| classifier.classify(value, pixel));
    } else {
        for (value, pixel) in out.iter_mut().zip(raw.chunks_exact(4)) {
            classifier.classify(value, pixel);
        }
    }
    out
}
