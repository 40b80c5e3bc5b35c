//! `[mask]` section configuration.
//!
//! Ink isolation thresholds for scanned pages.
//!
//! # Example
//!
//! ```toml
//! [mask]
//! max_dimension = 1600        # Longest side after bounded downscale
//! sample_patch = 12           # Top-left background sample patch side
//! distance_threshold = 52.0   # RGB distance from the paper color
//! blue_bias_threshold = 22.0  # B - max(R, G) required for ink
//! median_radius = 1           # 1 = 3x3 median cleanup, 0 = off
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    /// Neither side of the working image exceeds this (never upscaled).
    pub max_dimension: u32,

    /// Side of the top-left background sample patch, clamped to the image.
    pub sample_patch: u32,

    /// Minimum Euclidean RGB distance from the background sample.
    pub distance_threshold: f32,

    /// Minimum `B - max(R, G)` for a pixel to count as ink.
    pub blue_bias_threshold: f32,

    /// Radius of the binary median filter.
    pub median_radius: u32,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            max_dimension: 1600,
            sample_patch: 12,
            distance_threshold: 52.0,
            blue_bias_threshold: 22.0,
            median_radius: 1,
        }
    }
}

impl MaskConfig {
    pub const MAX_DIMENSION: FieldPath = FieldPath::new("mask.max_dimension");
    pub const SAMPLE_PATCH: FieldPath = FieldPath::new("mask.sample_patch");
    pub const DISTANCE_THRESHOLD: FieldPath = FieldPath::new("mask.distance_threshold");
    pub const BLUE_BIAS_THRESHOLD: FieldPath = FieldPath::new("mask.blue_bias_threshold");
    pub const MEDIAN_RADIUS: FieldPath = FieldPath::new("mask.median_radius");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.max_dimension == 0 {
            diag.error(Self::MAX_DIMENSION, "must be greater than 0");
        }
        if self.sample_patch == 0 {
            diag.error(Self::SAMPLE_PATCH, "must be greater than 0");
        }
        if !self.distance_threshold.is_finite() || self.distance_threshold < 0.0 {
            diag.error(Self::DISTANCE_THRESHOLD, "must be a non-negative number");
        }
        if !self.blue_bias_threshold.is_finite() {
            diag.error(Self::BLUE_BIAS_THRESHOLD, "must be a finite number");
        }
        if self.median_radius > 4 {
            diag.error_with_hint(
                Self::MEDIAN_RADIUS,
                format!("radius {} merges nearby strokes", self.median_radius),
                "use 0 or 1",
            );
        }
    }
}
