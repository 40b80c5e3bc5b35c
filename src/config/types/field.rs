//! Dotted config field paths.

use std::fmt;

/// Dotted path of a config field, e.g. `trace.corner_threshold`.
///
/// Sections expose their fields as associated constants so diagnostics
/// name the real TOML key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(&'static str);

impl FieldPath {
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }

    pub const fn as_str(&self) -> &'static str {
        self.0
    }

    /// Leading TOML table (`trace` for `trace.fill`).
    pub fn section(&self) -> &'static str {
        self.0.split_once('.').map_or(self.0, |(section, _)| section)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
