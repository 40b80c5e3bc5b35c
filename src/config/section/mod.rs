//! Configuration section definitions.
//!
//! | Section       | Purpose                                      |
//! |---------------|----------------------------------------------|
//! | `[mask]`      | Ink isolation thresholds                     |
//! | `[trace]`     | Bitmap tracer parameters                     |
//! | `[normalize]` | Content-bounds measurement and framing       |
//! | `[raster]`    | Supersampling and lossy encoder settings     |
//! | `[batch]`     | Sequential or parallel asset processing      |
//! | `[storage]`   | Object storage root and public base URL      |
//! | `[catalog]`   | Catalog file location                        |

mod batch;
mod catalog;
mod mask;
mod normalize;
mod raster;
mod storage;
mod trace;

pub use batch::BatchConfig;
pub use catalog::CatalogConfig;
pub use mask::MaskConfig;
pub use normalize::NormalizeConfig;
pub use raster::RasterConfig;
pub use storage::StorageConfig;
pub use trace::{TraceConfig, TurnPolicy};
