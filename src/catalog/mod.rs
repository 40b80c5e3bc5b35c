//! Catalog metadata.
//!
//! The catalog is loaded once into a read-only snapshot handed to the
//! orchestrator. Result URLs are attached to a copy after the batch.

mod contract;
mod file;

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use contract::StyleContract;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write catalog {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("collection `{collection}` has an invalid style contract: {reason}")]
    InvalidContract { collection: String, reason: String },

    #[error("duplicate {kind} id `{id}`")]
    DuplicateId { kind: &'static str, id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub style: StyleContract,
}

/// URLs of everything derived from one asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivativeSet {
    pub vector: String,
    pub normalized_vector: String,
    /// `"{size}.{extension}"` → URL
    #[serde(default)]
    pub rasters: BTreeMap<String, String>,
}

impl DerivativeSet {
    pub fn raster_name(size: u32, extension: &str) -> String {
        format!("{size}.{extension}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub source_image_url: String,
    pub collection_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivatives: Option<DerivativeSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub collections: Vec<Collection>,
    #[serde(default)]
    pub assets: Vec<AssetRecord>,
}

impl Catalog {
    /// Parse and check a catalog document.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.check()?;
        Ok(catalog)
    }

    fn check(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for collection in &self.collections {
            if !seen.insert(collection.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    kind: "collection",
                    id: collection.id.clone(),
                });
            }
            collection
                .style
                .check()
                .map_err(|reason| CatalogError::InvalidContract {
                    collection: collection.id.clone(),
                    reason,
                })?;
        }

        let mut seen = HashSet::new();
        for asset in &self.assets {
            if !seen.insert(asset.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    kind: "asset",
                    id: asset.id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn collection(&self, id: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == id)
    }

    /// Copy of the catalog with `results` attached to their assets.
    ///
    /// Assets without a new result keep their previous derivatives.
    pub fn with_derivatives<'a>(
        &self,
        results: impl IntoIterator<Item = (&'a str, &'a DerivativeSet)>,
    ) -> Self {
        let results: BTreeMap<_, _> = results.into_iter().collect();
        let mut updated = self.clone();
        for asset in &mut updated.assets {
            if let Some(set) = results.get(asset.id.as_str()) {
                asset.derivatives = Some((*set).clone());
            }
        }
        updated
    }
}
