//! Color values and theme color slots.
//!
//! Shared by the tracer (literal ink fill), the theme rewriter (slot
//! fallbacks) and the rasterizer (slot resolution).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string is not a `#rrggbb` color.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid color `{0}`, expected 6 hex digits like #2d5bff")]
pub struct ColorParseError(pub String);

/// An opaque sRGB color, always written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a hex color, with or without the leading `#`.
    ///
    /// Only the 6-digit form is accepted.
    pub fn parse_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    /// Channels normalized to 0.0-1.0.
    pub fn to_unit(self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s).ok_or_else(|| ColorParseError(s.to_string()))
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Named, substitutable color slot of a themeable document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColorSlot {
    Primary,
    Secondary,
}

impl ColorSlot {
    pub const ALL: [Self; 2] = [Self::Primary, Self::Secondary];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }

    /// CSS custom property bound to this slot (`--svg-primary`).
    pub const fn css_var(self) -> &'static str {
        match self {
            Self::Primary => "--svg-primary",
            Self::Secondary => "--svg-secondary",
        }
    }

    pub fn from_css_var(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.css_var() == name.trim())
    }
}

impl fmt::Display for ColorSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Concrete colors for the slots of a themeable document.
///
/// Unassigned slots resolve to the fallback recorded in the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColorSlotAssignment {
    primary: Option<Color>,
    secondary: Option<Color>,
}

impl ColorSlotAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assignment binding only the primary slot.
    pub fn primary(color: Color) -> Self {
        Self::new().with(ColorSlot::Primary, color)
    }

    pub fn with(mut self, slot: ColorSlot, color: Color) -> Self {
        match slot {
            ColorSlot::Primary => self.primary = Some(color),
            ColorSlot::Secondary => self.secondary = Some(color),
        }
        self
    }

    pub fn get(&self, slot: ColorSlot) -> Option<Color> {
        match slot {
            ColorSlot::Primary => self.primary,
            ColorSlot::Secondary => self.secondary,
        }
    }
}
