//! Image pipeline stages.
//!
//! # Modules
//!
//! - [`raster`]: decoded source images
//! - [`mask`]: ink isolation (raster → binary mask)
//! - [`trace`]: bitmap tracing (mask → literal vector)
//! - [`svg`]: vector documents, theming and normalization
//! - [`rasterize`]: supersampled PNG / AVIF derivatives
//! - [`color`]: colors and theme slots

pub mod color;
pub mod mask;
pub mod raster;
pub mod rasterize;
pub mod svg;
pub mod trace;

pub use color::{Color, ColorSlotAssignment};
pub use raster::MaskError;
