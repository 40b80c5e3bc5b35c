//! `[raster]` section configuration.
//!
//! ```toml
//! [raster]
//! supersample = 4      # Render at size * supersample, then downsample
//! lossy_quality = 95.0 # AVIF quality (0-100)
//! lossy_speed = 1      # AVIF encoder speed (1 = slowest/best, 10 = fastest)
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    pub supersample: u32,
    pub lossy_quality: f32,
    pub lossy_speed: u8,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            supersample: 4,
            lossy_quality: 95.0,
            lossy_speed: 1,
        }
    }
}

impl RasterConfig {
    pub const SUPERSAMPLE: FieldPath = FieldPath::new("raster.supersample");
    pub const LOSSY_QUALITY: FieldPath = FieldPath::new("raster.lossy_quality");
    pub const LOSSY_SPEED: FieldPath = FieldPath::new("raster.lossy_speed");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        match self.supersample {
            0 => diag.error(Self::SUPERSAMPLE, "must be at least 1"),
            1 => diag.warn(Self::SUPERSAMPLE, "1 disables supersampling"),
            9.. => diag.error_with_hint(
                Self::SUPERSAMPLE,
                "factors above 8 exceed the render buffer budget",
                "4 is usually indistinguishable from higher factors",
            ),
            _ => {}
        }
        if !(0.0..=100.0).contains(&self.lossy_quality) {
            diag.error(Self::LOSSY_QUALITY, "must be between 0 and 100");
        }
        if !(1..=10).contains(&self.lossy_speed) {
            diag.error(Self::LOSSY_SPEED, "must be between 1 and 10");
        }
    }
}
