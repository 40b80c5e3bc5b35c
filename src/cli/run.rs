//! `run` command: process catalog assets and write results back.

use std::fs;

use anyhow::{Context, Result};

use super::{RunArgs, ScopeArgs};
use crate::catalog::Catalog;
use crate::config::PipelineConfig;
use crate::log;
use crate::pipeline::{Orchestrator, Scope};
use crate::storage::FsStorage;

impl From<&ScopeArgs> for Scope {
    fn from(args: &ScopeArgs) -> Self {
        if let Some(id) = &args.collection {
            Self::Collection(id.clone())
        } else if args.missing {
            Self::Missing
        } else {
            Self::All
        }
    }
}

/// Run the batch over the catalog.
///
/// Only an unreadable catalog (or a failed write-back) is an error; asset
/// failures end up in the report.
pub fn run_catalog(args: &RunArgs, config: &PipelineConfig) -> Result<()> {
    let catalog_path = &config.catalog.path;
    let catalog = Catalog::load(catalog_path)?;
    let storage = FsStorage::from_config(&config.storage);

    let report = Orchestrator::new(config, &catalog, &storage).run_batch(&Scope::from(&args.scope));
    report.print();
    log!("done"; "{}", report);

    if let Some(path) = &args.report {
        fs::write(path, report.to_json()?)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    if !report.successes.is_empty() {
        catalog
            .with_derivatives(report.successes.iter().map(|(id, set)| (id.as_str(), set)))
            .save(catalog_path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LOGO: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100"><circle cx="50" cy="50" r="20" fill="#123456"/></svg>"##;

    const CATALOG: &str = r##"{
  "collections": [
    {
      "id": "marks",
      "style": {
        "allowed_formats": ["vector", "lossless"],
        "allowed_sizes": [32],
        "default_format": "lossless",
        "default_size": 32,
        "default_color": "#14289f"
      }
    }
  ],
  "assets": [
    { "id": "logo", "source_image_url": "sources/logo.svg", "collection_id": "marks" },
    { "id": "lost", "source_image_url": "sources/lost.png", "collection_id": "marks" }
  ]
}"##;

    fn setup() -> (TempDir, PipelineConfig) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sources")).unwrap();
        fs::write(dir.path().join("sources/logo.svg"), LOGO).unwrap();
        fs::write(dir.path().join("catalog.json"), CATALOG).unwrap();

        let mut config = PipelineConfig::default();
        config.storage.root = dir.path().to_path_buf();
        config.catalog.path = dir.path().join("catalog.json");
        config.normalize.render_resolution = 400;
        config.raster.supersample = 2;
        (dir, config)
    }

    #[test]
    fn test_scope_from_args() {
        assert_eq!(Scope::from(&ScopeArgs::default()), Scope::All);
        let missing = ScopeArgs {
            missing: true,
            ..ScopeArgs::default()
        };
        assert_eq!(Scope::from(&missing), Scope::Missing);
        let collection = ScopeArgs {
            collection: Some("marks".to_string()),
            ..ScopeArgs::default()
        };
        assert_eq!(Scope::from(&collection), Scope::Collection("marks".to_string()));
    }

    #[test]
    fn test_run_writes_back_results() {
        let (dir, config) = setup();
        let args = RunArgs {
            scope: ScopeArgs::default(),
            parallel: None,
            report: Some(dir.path().join("report.json")),
        };
        run_catalog(&args, &config).unwrap();

        assert!(dir.path().join("assets/svg/logo.svg").exists());
        assert!(dir.path().join("assets/normalized/logo.svg").exists());
        assert!(dir.path().join("assets/normalized/logo-32.png").exists());

        let catalog = Catalog::load(&config.catalog.path).unwrap();
        let set = catalog.assets[0].derivatives.as_ref().unwrap();
        assert!(set.rasters["32.png"].starts_with("file://"));
        assert!(catalog.assets[1].derivatives.is_none());

        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("report.json")).unwrap())
                .unwrap();
        assert_eq!(report["failures"][0]["asset_id"], "lost");
        assert_eq!(report["failures"][0]["stage"], "fetch");
        assert_eq!(report["failures"][0]["kind"], "StorageError");
    }

    #[test]
    fn test_missing_catalog_is_fatal() {
        let (dir, mut config) = setup();
        config.catalog.path = dir.path().join("nope.json");
        let args = RunArgs {
            scope: ScopeArgs::default(),
            parallel: None,
            report: None,
        };
        assert!(run_catalog(&args, &config).is_err());
    }
}
