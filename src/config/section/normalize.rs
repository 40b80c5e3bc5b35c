//! `[normalize]` section configuration.
//!
//! ```toml
//! [normalize]
//! render_resolution = 4096  # Off-screen measurement raster side
//! alpha_threshold = 10      # Minimum alpha (0-255) counted as content
//! content_fraction = 0.8    # Share of the new frame taken by content
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub render_resolution: u32,
    pub alpha_threshold: u8,
    pub content_fraction: f64,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            render_resolution: 4096,
            alpha_threshold: 10,
            content_fraction: 0.8,
        }
    }
}

impl NormalizeConfig {
    pub const RENDER_RESOLUTION: FieldPath = FieldPath::new("normalize.render_resolution");
    pub const ALPHA_THRESHOLD: FieldPath = FieldPath::new("normalize.alpha_threshold");
    pub const CONTENT_FRACTION: FieldPath = FieldPath::new("normalize.content_fraction");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.render_resolution < 64 {
            diag.error(Self::RENDER_RESOLUTION, "must be at least 64");
        } else if self.render_resolution > 16384 {
            diag.warn(
                Self::RENDER_RESOLUTION,
                "measurement rasters above 16384 px use a lot of memory",
            );
        }
        if self.alpha_threshold == 0 {
            diag.error_with_hint(
                Self::ALPHA_THRESHOLD,
                "0 counts every pixel as content",
                "use a value between 1 and 255",
            );
        }
        if !(self.content_fraction > 0.0 && self.content_fraction < 1.0) {
            diag.error_with_hint(
                Self::CONTENT_FRACTION,
                "must be in (0, 1)",
                "0.8 leaves a 10% margin on each side",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.normalize.render_resolution, 4096);
        assert_eq!(config.normalize.alpha_threshold, 10);
        assert_eq!(config.normalize.content_fraction, 0.8);
    }

    #[test]
    fn test_fraction_bounds() {
        for (value, ok) in [("0.0", false), ("1.5", false), ("0.9", true), ("1.0", false), ("0.999", true)] {
            let config = test_parse_config(&format!("[normalize]\ncontent_fraction = {value}"));
            let mut diag = ConfigDiagnostics::new();
            config.normalize.validate(&mut diag);
            assert_eq!(!diag.has_errors(), ok, "failed for {value}");
        }
    }
}
