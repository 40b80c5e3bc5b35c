//! Asset pipeline orchestration.
//!
//! ```text
//! source ─┬─ raster ─> mask ─> trace ─┐
//!         └─ svg ────> parse ─────────┴─> theme ─> normalize ─> rasterize × (format, size)
//! ```
//!
//! Each asset runs the chain independently against a read-only catalog
//! snapshot. Failures are recorded per asset; the batch never aborts.

pub mod error;
pub mod keys;
mod orchestrator;
mod report;

use std::fmt;

pub use orchestrator::Orchestrator;

use error::PipelineError;

use crate::catalog::{AssetRecord, Catalog, Collection, DerivativeSet};
use crate::image::ColorSlotAssignment;
use crate::image::rasterize::OutputFormat;
use crate::image::svg::VectorDocument;

/// Which catalog assets a batch covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Scope {
    #[default]
    All,
    /// Assets lacking at least one derivative their contract asks for.
    Missing,
    Collection(String),
}

impl Scope {
    pub fn includes(&self, asset: &AssetRecord, catalog: &Catalog) -> bool {
        match self {
            Self::All => true,
            Self::Collection(id) => asset.collection_id == *id,
            Self::Missing => match (&asset.derivatives, catalog.collection(&asset.collection_id)) {
                (Some(set), Some(collection)) => !is_complete(set, collection),
                _ => true,
            },
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all assets"),
            Self::Missing => f.write_str("assets with missing derivatives"),
            Self::Collection(id) => write!(f, "collection `{id}`"),
        }
    }
}

fn is_complete(set: &DerivativeSet, collection: &Collection) -> bool {
    let contract = &collection.style;
    !set.vector.is_empty()
        && !set.normalized_vector.is_empty()
        && contract.raster_formats().all(|format| {
            contract.allowed_sizes.iter().all(|&size| {
                set.rasters
                    .contains_key(&DerivativeSet::raster_name(size, format.extension()))
            })
        })
}

/// One raster derivative to produce from a normalized document.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub source: &'a VectorDocument,
    pub assignment: ColorSlotAssignment,
    pub format: OutputFormat,
    pub size: u32,
}

impl<'a> RenderRequest<'a> {
    /// Every raster format and size the collection publishes, colored with
    /// its default color.
    pub fn for_collection(source: &'a VectorDocument, collection: &Collection) -> Vec<Self> {
        let contract = &collection.style;
        let assignment = ColorSlotAssignment::primary(contract.default_color);
        contract
            .raster_formats()
            .flat_map(|format| {
                contract.allowed_sizes.iter().map(move |&size| Self {
                    source,
                    assignment,
                    format,
                    size,
                })
            })
            .collect()
    }

    pub fn validate(&self, collection: &Collection) -> Result<(), PipelineError> {
        if !collection.style.allows_format(self.format) {
            return Err(PipelineError::UnsupportedFormat {
                format: self.format,
                collection: collection.id.clone(),
            });
        }
        if !collection.style.allows_size(self.size) {
            return Err(PipelineError::UnsupportedSize {
                size: self.size,
                collection: collection.id.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::CATALOG;
    use crate::pipeline::error::ErrorKind;

    #[test]
    fn test_scope_missing() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let heron = &catalog.assets[0];
        let wren = &catalog.assets[1];

        assert!(Scope::All.includes(wren, &catalog));
        // heron has nothing yet, wren lacks the 256 and avif rasters
        assert!(Scope::Missing.includes(heron, &catalog));
        assert!(Scope::Missing.includes(wren, &catalog));

        let mut complete = wren.clone();
        let set = complete.derivatives.as_mut().unwrap();
        for size in [256, 512] {
            for ext in ["png", "avif"] {
                set.rasters
                    .insert(DerivativeSet::raster_name(size, ext), "r".to_string());
            }
        }
        assert!(!Scope::Missing.includes(&complete, &catalog));
    }

    #[test]
    fn test_scope_collection() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let heron = &catalog.assets[0];
        assert!(Scope::Collection("birds".to_string()).includes(heron, &catalog));
        assert!(!Scope::Collection("fish".to_string()).includes(heron, &catalog));
        assert_eq!(
            Scope::Collection("fish".to_string()).to_string(),
            "collection `fish`"
        );
    }

    #[test]
    fn test_requests_follow_contract() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let birds = catalog.collection("birds").unwrap();
        let doc = VectorDocument::default();

        let requests = RenderRequest::for_collection(&doc, birds);
        let tuples: Vec<_> = requests.iter().map(|r| (r.format, r.size)).collect();
        assert_eq!(
            tuples,
            vec![
                (OutputFormat::Lossless, 256),
                (OutputFormat::Lossless, 512),
                (OutputFormat::Lossy, 256),
                (OutputFormat::Lossy, 512),
            ]
        );
        assert!(requests.iter().all(|r| r.validate(birds).is_ok()));
        assert_eq!(
            requests[0].assignment,
            ColorSlotAssignment::primary(birds.style.default_color)
        );
    }

    #[test]
    fn test_request_outside_contract() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let birds = catalog.collection("birds").unwrap();
        let doc = VectorDocument::default();
        let mut request = RenderRequest::for_collection(&doc, birds)[0];

        request.size = 1024;
        let err = request.validate(birds).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedSizeError);

        request.size = 256;
        request.format = OutputFormat::Vector;
        assert!(request.validate(birds).is_ok());

        let mut vector_only = birds.clone();
        vector_only.style.allowed_formats.remove(&OutputFormat::Lossless);
        request.format = OutputFormat::Lossless;
        let err = request.validate(&vector_only).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormatError);
    }
}
