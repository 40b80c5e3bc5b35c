use std::fs;
use std::path::Path;

use super::{Catalog, CatalogError};

impl Catalog {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Write the catalog as pretty JSON, replacing the file in one rename.
    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        let write_error = |source| CatalogError::Write {
            path: path.to_path_buf(),
            source,
        };

        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(write_error)?;
        fs::rename(&tmp, path).map_err(write_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::CATALOG;
    use crate::catalog::DerivativeSet;
    use tempfile::TempDir;

    #[test]
    fn test_load_save_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, CATALOG).unwrap();

        let catalog = Catalog::load(&path).unwrap();
        let set = DerivativeSet {
            vector: "file:///a.svg".to_string(),
            ..DerivativeSet::default()
        };
        catalog.with_derivatives([("heron", &set)]).save(&path).unwrap();

        let reloaded = Catalog::load(&path).unwrap();
        assert_eq!(reloaded.assets[0].derivatives.as_ref(), Some(&set));
        assert!(!dir.path().join("catalog.json.tmp").exists());
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Catalog::load(&dir.path().join("nope.json")),
            Err(CatalogError::Read { .. })
        ));
    }
}
