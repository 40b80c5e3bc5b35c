//! Per-collection style contract.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::image::Color;
use crate::image::rasterize::OutputFormat;

/// Formats, sizes and default color a collection publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleContract {
    pub allowed_formats: BTreeSet<OutputFormat>,
    pub allowed_sizes: BTreeSet<u32>,
    pub default_format: OutputFormat,
    pub default_size: u32,
    pub default_color: Color,
}

impl StyleContract {
    /// Check internal consistency; returns the first problem found.
    pub fn check(&self) -> Result<(), String> {
        if self.allowed_formats.is_empty() {
            return Err("allowed_formats is empty".to_string());
        }
        if self.allowed_sizes.contains(&0) {
            return Err("allowed_sizes contains 0".to_string());
        }
        if !self.allowed_formats.contains(&self.default_format) {
            return Err(format!(
                "default_format `{}` is not in allowed_formats",
                self.default_format
            ));
        }
        let has_raster = self.raster_formats().next().is_some();
        if has_raster && !self.allowed_sizes.contains(&self.default_size) {
            return Err(format!(
                "default_size {} is not in allowed_sizes",
                self.default_size
            ));
        }
        Ok(())
    }

    pub fn allows_format(&self, format: OutputFormat) -> bool {
        self.allowed_formats.contains(&format)
    }

    pub fn allows_size(&self, size: u32) -> bool {
        self.allowed_sizes.contains(&size)
    }

    pub fn raster_formats(&self) -> impl Iterator<Item = OutputFormat> + '_ {
        self.allowed_formats
            .iter()
            .copied()
            .filter(|format| *format != OutputFormat::Vector)
    }
}
