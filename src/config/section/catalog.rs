//! `[catalog]` section configuration.
//!
//! ```toml
//! [catalog]
//! path = "catalog.json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// JSON catalog of collections and assets (relative to the config file).
    pub path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("catalog.json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;
    use std::path::Path;

    #[test]
    fn test_catalog_path() {
        let config = test_parse_config("");
        assert_eq!(config.catalog.path, Path::new("catalog.json"));

        let config = test_parse_config("[catalog]\npath = \"data/assets.json\"");
        assert_eq!(config.catalog.path, Path::new("data/assets.json"));
    }
}
