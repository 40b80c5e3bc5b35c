//! `[trace]` section configuration.
//!
//! Bitmap tracer parameters.
//!
//! # Example
//!
//! ```toml
//! [trace]
//! speckle_suppression_px = 2     # Drop regions with area below this
//! corner_threshold = 0.15        # Smoothness cutoff (alpha max)
//! optimize_curves = true         # Merge adjacent Bezier segments
//! optimization_tolerance = 0.08  # Max deviation when merging, in px
//! turn_policy = "minority"       # Ambiguous turn resolution
//! fill = "#000000"               # Literal ink color of the output
//! max_solver_iterations = 32     # Vertex solver budget per vertex
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::image::color::Color;

/// How the path walker resolves ambiguous (checkerboard) lattice corners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnPolicy {
    /// Prefer connecting ink regions.
    Black,
    /// Prefer connecting background regions.
    White,
    Left,
    Right,
    /// Follow the locally dominant color.
    Majority,
    /// Follow the locally rare color.
    #[default]
    Minority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Regions whose area is strictly below this many pixels are discarded.
    pub speckle_suppression_px: u32,

    /// Corner/curve cutoff; larger values produce smoother outlines.
    pub corner_threshold: f64,

    /// Join consecutive curve segments when the fit stays within tolerance.
    pub optimize_curves: bool,

    pub optimization_tolerance: f64,

    pub turn_policy: TurnPolicy,

    /// Literal fill of the traced path.
    pub fill: Color,

    /// Iteration budget for degenerate vertex placements.
    pub max_solver_iterations: u32,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            speckle_suppression_px: 2,
            corner_threshold: 0.15,
            optimize_curves: true,
            optimization_tolerance: 0.08,
            turn_policy: TurnPolicy::Minority,
            fill: Color::BLACK,
            max_solver_iterations: 32,
        }
    }
}

impl TraceConfig {
    pub const CORNER_THRESHOLD: FieldPath = FieldPath::new("trace.corner_threshold");
    pub const OPTIMIZATION_TOLERANCE: FieldPath = FieldPath::new("trace.optimization_tolerance");
    pub const MAX_SOLVER_ITERATIONS: FieldPath = FieldPath::new("trace.max_solver_iterations");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.corner_threshold.is_finite() || self.corner_threshold < 0.0 {
            diag.error_with_hint(
                Self::CORNER_THRESHOLD,
                "must be a non-negative number",
                "0 keeps every corner, 1.3334 smooths everything",
            );
        }
        if !self.optimization_tolerance.is_finite() || self.optimization_tolerance < 0.0 {
            diag.error(Self::OPTIMIZATION_TOLERANCE, "must be a non-negative number");
        }
        if self.max_solver_iterations == 0 {
            diag.error(Self::MAX_SOLVER_ITERATIONS, "must be greater than 0");
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
        assert_eq!(config.trace.speckle_suppression_px, 2);
        assert_eq!(config.trace.corner_threshold, 0.15);
        assert!(config.trace.optimize_curves);
        assert_eq!(config.trace.turn_policy, TurnPolicy::Minority);
        assert_eq!(config.trace.fill, Color::BLACK);
    }

    #[test]
    fn test_turn_policy_parsing() {
        let cases = [
            ("black", TurnPolicy::Black),
            ("white", TurnPolicy::White),
            ("left", TurnPolicy::Left),
            ("right", TurnPolicy::Right),
            ("majority", TurnPolicy::Majority),
            ("minority", TurnPolicy::Minority),
        ];
        for (input, expected) in cases {
            let config = test_parse_config(&format!("[trace]\nturn_policy = \"{input}\""));
            assert_eq!(config.trace.turn_policy, expected, "failed for {input}");
        }
    }

    #[test]
    fn test_fill_parsing() {
        let config = test_parse_config("[trace]\nfill = \"#112233\"");
        assert_eq!(config.trace.fill, Color::rgb(0x11, 0x22, 0x33));
    }

    #[test]
    fn test_validate_negative_threshold() {
        let config = test_parse_config("[trace]\ncorner_threshold = -1.0");
        let mut diag = ConfigDiagnostics::new();
        config.trace.validate(&mut diag);
        assert!(diag.has_errors());
    }
}
