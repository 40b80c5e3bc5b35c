//! `[storage]` section configuration.
//!
//! Derivatives are written below `root`. When `base_url` is set the
//! returned URLs are `{base_url}/{key}`, otherwise `file://` URLs.
//!
//! ```toml
//! [storage]
//! root = "public"
//! base_url = "https://cdn.example.com"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding stored objects (relative to the config file).
    pub root: PathBuf,

    pub base_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("public"),
            base_url: None,
        }
    }
}

impl StorageConfig {
    pub const BASE_URL: FieldPath = FieldPath::new("storage.base_url");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if let Some(base) = &self.base_url
            && url::Url::parse(base).is_err()
        {
            diag.error_with_hint(
                Self::BASE_URL,
                format!("`{base}` is not an absolute URL"),
                "include the scheme, e.g. https://cdn.example.com",
            );
        }
    }
}
