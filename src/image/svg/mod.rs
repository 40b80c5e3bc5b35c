//! Vector documents.
//!
//! # Modules
//!
//! - [`document`]: structured document model (frame, shapes, style rule)
//! - [`parse`] / [`write`]: text boundary, via quick-xml
//! - [`theme`]: literal colors → `--svg-primary` slot
//! - [`render`]: off-screen rendering with resvg
//! - [`bounds`]: rendered content bounds
//! - [`normalize`]: re-center and re-scale around content
//!
//! ```text
//! traced / uploaded SVG
//!         │
//!         ▼
//!    ┌───────┐
//!    │ theme │ ──► style rule binds the primary slot
//!    └───┬───┘
//!        ▼
//!  ┌───────────┐
//!  │ normalize │ ──► render ──► bounds ──► square viewBox
//!  └─────┬─────┘
//!        ▼
//!   rasterize (crate::image::rasterize)
//! ```

pub mod bounds;
pub mod document;
pub mod normalize;
pub mod parse;
pub mod render;
pub mod style;
pub mod theme;
pub mod write;

use thiserror::Error;

pub use document::{Frame, Shape, VectorDocument, format_number};
pub use normalize::{NormalizeError, normalize};
pub use parse::parse_document_bytes;
pub use render::{Fit, RenderError, render};
pub use theme::make_themeable;
pub use write::write_document;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("XML error at position {position}: {message}")]
    Xml { position: u64, message: String },

    #[error("document is not valid UTF-8")]
    InvalidUtf8,

    #[error("document has no root element")]
    Empty,

    #[error("root element is <{0}>, expected <svg>")]
    NotSvg(String),

    #[error("invalid {name} `{value}`")]
    InvalidAttribute { name: &'static str, value: String },

    #[error("only a single <style> rule is supported")]
    UnsupportedStyle,

    #[error("document has neither a viewBox nor numeric width/height")]
    MissingFrame,

    #[error("failed to write document: {0}")]
    Write(String),
}

/// Cheap check for SVG input by its first element.
pub fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(1024)]);
    let text = head.trim_start_matches('\u{feff}').trim_start();
    text.starts_with('<') && text.contains("<svg")
}
