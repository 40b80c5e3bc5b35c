//! `process` command: one local image, no catalog.

use std::collections::BTreeSet;

use anyhow::{Context, Result, anyhow};

use super::ProcessArgs;
use crate::catalog::{AssetRecord, Catalog, Collection, StyleContract};
use crate::config::PipelineConfig;
use crate::image::rasterize::OutputFormat;
use crate::log;
use crate::pipeline::{Orchestrator, Scope};
use crate::storage::FsStorage;

const LOCAL_COLLECTION: &str = "local";

/// Run the pipeline on `args.image`, writing derivatives under the storage
/// root (the output directory).
pub fn process_image(args: &ProcessArgs, config: &PipelineConfig) -> Result<()> {
    let catalog = local_catalog(args)?;
    let storage = FsStorage::from_config(&config.storage);

    let report = Orchestrator::new(config, &catalog, &storage).run_batch(&Scope::All);
    report.print();

    for set in report.successes.values() {
        log!("process"; "vector {}", set.vector);
        log!("process"; "normalized {}", set.normalized_vector);
        for (name, url) in &set.rasters {
            log!("process"; "{} {}", name, url);
        }
    }
    log!("done"; "{}", report);
    Ok(())
}

/// Single-asset catalog for a local file; the asset id is the file stem.
fn local_catalog(args: &ProcessArgs) -> Result<Catalog> {
    let image = std::path::absolute(&args.image)
        .with_context(|| format!("Failed to resolve {}", args.image.display()))?;
    let id = image
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| anyhow!("cannot derive an asset id from {}", image.display()))?;

    let allowed_sizes: BTreeSet<u32> = args.sizes.iter().copied().collect();
    let style = StyleContract {
        allowed_formats: [OutputFormat::Vector, OutputFormat::Lossless, OutputFormat::Lossy]
            .into_iter()
            .collect(),
        default_size: allowed_sizes.last().copied().unwrap_or_default(),
        allowed_sizes,
        default_format: OutputFormat::Lossless,
        default_color: args.fill,
    };
    style
        .check()
        .map_err(|reason| anyhow!("invalid --sizes: {reason}"))?;

    Ok(Catalog {
        collections: vec![Collection {
            id: LOCAL_COLLECTION.to_string(),
            title: String::new(),
            style,
        }],
        assets: vec![AssetRecord {
            id: id.to_string(),
            title: None,
            source_image_url: image.display().to_string(),
            collection_id: LOCAL_COLLECTION.to_string(),
            derivatives: None,
        }],
    })
}
