//! Batch driver.

use std::collections::BTreeMap;

use rayon::prelude::*;

use super::error::{AssetFailure, AtStage, PipelineError, Stage, StageError};
use super::report::BatchReport;
use super::{RenderRequest, Scope, keys};
use crate::catalog::{AssetRecord, Catalog, DerivativeSet};
use crate::config::PipelineConfig;
use crate::image::Color;
use crate::image::rasterize::{OutputFormat, rasterize};
use crate::image::svg::{
    VectorDocument, looks_like_svg, make_themeable, normalize, parse_document_bytes,
    write_document,
};
use crate::image::{mask, trace};
use crate::logger::ProgressLine;
use crate::storage::Storage;
use crate::{debug, log};

/// Runs catalog assets through the pipeline.
pub struct Orchestrator<'a, S: Storage> {
    config: &'a PipelineConfig,
    catalog: &'a Catalog,
    storage: &'a S,
}

impl<'a, S: Storage> Orchestrator<'a, S> {
    pub fn new(config: &'a PipelineConfig, catalog: &'a Catalog, storage: &'a S) -> Self {
        Self {
            config,
            catalog,
            storage,
        }
    }

    /// Process every asset in `scope`, sequentially or on the rayon pool.
    pub fn run_batch(&self, scope: &Scope) -> BatchReport {
        let assets: Vec<&AssetRecord> = self
            .catalog
            .assets
            .iter()
            .filter(|asset| scope.includes(asset, self.catalog))
            .collect();

        log!("run"; "{} asset{} in {}", assets.len(), if assets.len() == 1 { "" } else { "s" }, scope);

        let progress = ProgressLine::new("run", &[("assets", assets.len())]);
        let outcomes = if self.config.batch.parallel {
            self.run_parallel(&assets, &progress)
        } else {
            assets
                .iter()
                .map(|asset| self.process(asset, &progress))
                .collect()
        };
        progress.finish();

        let mut report = BatchReport::default();
        for (asset_id, outcome) in outcomes {
            report.record(asset_id, outcome);
        }
        report.sort();
        report
    }

    fn run_parallel<'b>(
        &self,
        assets: &[&'b AssetRecord],
        progress: &ProgressLine,
    ) -> Vec<(&'b str, Result<DerivativeSet, AssetFailure>)> {
        let run = || {
            assets
                .par_iter()
                .map(|asset| self.process(asset, progress))
                .collect::<Vec<_>>()
        };

        let threads = self.config.batch.threads;
        if threads == 0 {
            return run();
        }
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(run),
            Err(e) => {
                log!("warning"; "cannot build a {}-thread pool ({}), using the global pool", threads, e);
                run()
            }
        }
    }

    fn process<'b>(
        &self,
        asset: &'b AssetRecord,
        progress: &ProgressLine,
    ) -> (&'b str, Result<DerivativeSet, AssetFailure>) {
        let outcome = self
            .run_asset(asset)
            .map_err(|error| AssetFailure::new(&asset.id, error));

        match &outcome {
            Ok(set) => debug!("done"; "{} ({} raster{})", asset.id, set.rasters.len(), if set.rasters.len() == 1 { "" } else { "s" }),
            Err(failure) => log!("failed"; "{} at {}: {}", failure.asset_id, failure.stage, failure.message),
        }
        progress.inc("assets");
        (asset.id.as_str(), outcome)
    }

    /// Full chain for one asset. Every derivative is stored before the
    /// result set is returned.
    pub fn run_asset(&self, asset: &AssetRecord) -> Result<DerivativeSet, StageError> {
        let collection = self
            .catalog
            .collection(&asset.collection_id)
            .ok_or_else(|| PipelineError::UnknownCollection(asset.collection_id.clone()))
            .at(Stage::Catalog)?;
        let contract = &collection.style;

        let source = self
            .storage
            .fetch(&asset.source_image_url)
            .at(Stage::Fetch)?;

        // Both vectors are stored whatever the contract allows; they back
        // every raster and the catalog record.
        let themed = self.vectorize(&source, contract.default_color)?;
        let svg = write_document(&themed).at(Stage::Theme)?;
        let vector = self.store(&keys::vector(&asset.id), svg.as_bytes(), OutputFormat::Vector)?;

        let normalized = normalize(&themed, &self.config.normalize).at(Stage::Normalize)?;
        let svg = write_document(&normalized).at(Stage::Normalize)?;
        let normalized_vector = self.store(
            &keys::normalized_vector(&asset.id),
            svg.as_bytes(),
            OutputFormat::Vector,
        )?;

        let mut rasters = BTreeMap::new();
        for request in RenderRequest::for_collection(&normalized, collection) {
            request.validate(collection).at(Stage::Rasterize)?;
            let bytes = rasterize(
                request.source,
                &request.assignment,
                request.format,
                request.size,
                &self.config.raster,
            )
            .at(Stage::Rasterize)?;
            let url = self.store(
                &keys::raster(&asset.id, request.size, request.format),
                &bytes,
                request.format,
            )?;
            rasters.insert(
                DerivativeSet::raster_name(request.size, request.format.extension()),
                url,
            );
        }

        Ok(DerivativeSet {
            vector,
            normalized_vector,
            rasters,
        })
    }

    /// Source bytes to the canonical themeable document.
    ///
    /// Vector sources skip mask extraction and tracing.
    fn vectorize(&self, source: &[u8], fallback: Color) -> Result<VectorDocument, StageError> {
        let literal = if looks_like_svg(source) {
            parse_document_bytes(source).at(Stage::Parse)?
        } else {
            let ink = mask::extract_from_bytes(source, &self.config.mask).at(Stage::Mask)?;
            debug!("mask"; "{} ink pixels", ink.ink_count());
            trace::trace(&ink, &self.config.trace).at(Stage::Trace)?
        };
        Ok(make_themeable(literal, fallback))
    }

    fn store(&self, key: &str, bytes: &[u8], format: OutputFormat) -> Result<String, StageError> {
        self.storage
            .put(key, bytes, format.content_type())
            .at(Stage::Store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::image::svg::parse::parse_document;
    use crate::pipeline::error::ErrorKind;
    use crate::storage::MemoryStorage;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    const CATALOG: &str = r##"{
  "collections": [
    {
      "id": "marks",
      "style": {
        "allowed_formats": ["vector", "lossless", "lossy"],
        "allowed_sizes": [32, 64],
        "default_format": "lossless",
        "default_size": 64,
        "default_color": "#14289f"
      }
    }
  ],
  "assets": [
    { "id": "stroke", "source_image_url": "memory://sources/stroke.png", "collection_id": "marks" },
    { "id": "blank", "source_image_url": "memory://sources/blank.png", "collection_id": "marks" },
    { "id": "logo", "source_image_url": "memory://sources/logo.svg", "collection_id": "marks" },
    { "id": "stray", "source_image_url": "memory://sources/blank.png", "collection_id": "gone" }
  ]
}"##;

    const LOGO: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100"><rect x="25" y="25" width="50" height="50" fill="#000"/></svg>"##;

    fn config() -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.normalize.render_resolution = 400;
        config.raster.supersample = 2;
        config.raster.lossy_speed = 10;
        config
    }

    fn png(img: &RgbImage) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    /// Light gray page with one dark blue bar at x 50..150, y 60..90.
    fn stroke_page() -> RgbImage {
        RgbImage::from_fn(200, 150, |x, y| {
            if (50..150).contains(&x) && (60..90).contains(&y) {
                Rgb([20, 40, 160])
            } else {
                Rgb([225, 225, 225])
            }
        })
    }

    fn storage() -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage.insert("sources/stroke.png", png(&stroke_page()));
        storage.insert(
            "sources/blank.png",
            png(&RgbImage::from_pixel(200, 150, Rgb([225, 225, 225]))),
        );
        storage.insert("sources/logo.svg", LOGO.as_bytes().to_vec());
        storage
    }

    fn run(parallel: bool) -> (BatchReport, MemoryStorage) {
        let mut config = config();
        config.batch.parallel = parallel;
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let storage = storage();
        let report = Orchestrator::new(&config, &catalog, &storage).run_batch(&Scope::All);
        (report, storage)
    }

    #[test]
    fn test_batch_isolates_failures() {
        let (report, _) = run(false);
        assert_eq!(report.total(), 4);
        assert_eq!(report.success_count(), 2);

        let blank = report.failure("blank").unwrap();
        assert_eq!(blank.stage, Stage::Trace);
        assert_eq!(blank.kind, ErrorKind::TraceError);

        let stray = report.failure("stray").unwrap();
        assert_eq!(stray.stage, Stage::Catalog);
        assert_eq!(stray.kind, ErrorKind::UnknownCollection);
    }

    #[test]
    fn test_stroke_scenario() {
        let (report, storage) = run(false);
        let set = &report.successes["stroke"];

        assert_eq!(set.vector, "memory://assets/svg/stroke.svg");
        assert_eq!(set.normalized_vector, "memory://assets/normalized/stroke.svg");
        assert_eq!(
            set.rasters.keys().collect::<Vec<_>>(),
            vec!["32.avif", "32.png", "64.avif", "64.png"]
        );

        let canonical = String::from_utf8(storage.get("assets/svg/stroke.svg").unwrap()).unwrap();
        let canonical = parse_document(&canonical).unwrap();
        assert!(canonical.is_themeable());
        assert!(canonical.shape_count() >= 1);

        // Longer side of the bar is 100 px: 100 / 0.8 = 125, centered on (100, 75).
        let normalized = String::from_utf8(storage.get("assets/normalized/stroke.svg").unwrap()).unwrap();
        let view_box = parse_document(&normalized).unwrap().frame.view_box.unwrap();
        assert!((view_box.width - 125.0).abs() < 2.0, "{view_box}");
        assert_eq!(view_box.width, view_box.height);
        assert!((view_box.min_x + view_box.width / 2.0 - 100.0).abs() < 1.0, "{view_box}");
        assert!((view_box.min_y + view_box.height / 2.0 - 75.0).abs() < 1.0, "{view_box}");
    }

    #[test]
    fn test_stored_objects() {
        let (_, storage) = run(false);

        assert_eq!(
            storage.content_type("assets/svg/stroke.svg").as_deref(),
            Some("image/svg+xml")
        );
        assert_eq!(
            storage.content_type("assets/normalized/stroke-64.png").as_deref(),
            Some("image/png")
        );
        assert_eq!(
            storage.content_type("assets/normalized/stroke-32.avif").as_deref(),
            Some("image/avif")
        );

        let png = storage.get("assets/normalized/stroke-32.png").unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 32));

        // Nothing was written for the failed assets.
        assert!(
            storage
                .keys()
                .iter()
                .filter(|key| key.starts_with("assets/"))
                .all(|key| !key.contains("blank") && !key.contains("stray"))
        );
    }

    #[test]
    fn test_vector_source_skips_tracing() {
        let (report, storage) = run(false);
        assert!(report.successes.contains_key("logo"));

        let normalized = String::from_utf8(storage.get("assets/normalized/logo.svg").unwrap()).unwrap();
        let doc = parse_document(&normalized).unwrap();
        let view_box = doc.frame.view_box.unwrap();
        assert!((view_box.min_x - 18.75).abs() < 0.5, "{view_box}");
        assert!((view_box.width - 62.5).abs() < 0.5, "{view_box}");
        // The original rect survives instead of a traced path.
        assert_eq!(doc.shapes[0].tag, "rect");
    }

    #[test]
    fn test_raster_only_contract_still_stores_vectors() {
        let catalog = Catalog::from_json(
            r##"{
  "collections": [
    {
      "id": "icons",
      "style": {
        "allowed_formats": ["lossless"],
        "allowed_sizes": [32],
        "default_format": "lossless",
        "default_size": 32,
        "default_color": "#000000"
      }
    }
  ],
  "assets": [
    { "id": "logo", "source_image_url": "memory://sources/logo.svg", "collection_id": "icons" }
  ]
}"##,
        )
        .unwrap();
        let config = config();
        let storage = storage();
        let set = Orchestrator::new(&config, &catalog, &storage)
            .run_asset(&catalog.assets[0])
            .unwrap();

        assert_eq!(set.vector, "memory://assets/svg/logo.svg");
        assert_eq!(set.normalized_vector, "memory://assets/normalized/logo.svg");
        assert_eq!(set.rasters.keys().collect::<Vec<_>>(), vec!["32.png"]);
        assert!(storage.get("assets/svg/logo.svg").is_some());
        assert!(storage.get("assets/normalized/logo.svg").is_some());
        assert!(storage.get("assets/normalized/logo-32.avif").is_none());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (sequential, _) = run(false);
        let (parallel, _) = run(true);
        assert_eq!(sequential.successes, parallel.successes);
        assert_eq!(sequential.failures, parallel.failures);
    }

    #[test]
    fn test_missing_source_is_a_fetch_failure() {
        let config = config();
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let storage = MemoryStorage::new();
        let error = Orchestrator::new(&config, &catalog, &storage)
            .run_asset(&catalog.assets[0])
            .unwrap_err();
        assert_eq!(error.stage, Stage::Fetch);
        assert_eq!(error.error.kind(), ErrorKind::StorageError);
    }
}
