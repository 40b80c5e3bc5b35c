//! Pipeline configuration management for `inkpress.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # One file per TOML section
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! └── mod.rs         # PipelineConfig (this file)
//! ```
//!
//! Every section is optional; a missing config file means all defaults.
//! Stages receive only their own section, never the whole config.

pub mod section;
pub mod types;

pub use section::{
    BatchConfig, CatalogConfig, MaskConfig, NormalizeConfig, RasterConfig, StorageConfig,
    TraceConfig, TurnPolicy,
};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::{
    cli::{Cli, Commands},
    debug, log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing inkpress.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory relative paths are resolved against (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub mask: MaskConfig,

    #[serde(default)]
    pub trace: TraceConfig,

    #[serde(default)]
    pub normalize: NormalizeConfig,

    #[serde(default)]
    pub raster: RasterConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl PipelineConfig {
    /// Load configuration for the parsed command line.
    ///
    /// A missing config file is not an error: defaults are used and paths
    /// resolve against the current directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        let config_path = if cli.config.is_absolute() {
            cli.config.clone()
        } else {
            cwd.join(&cli.config)
        };

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            debug!("config"; "{} not found, using defaults", config_path.display());
            Self::default()
        };

        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(cwd);
        config.config_path = config_path;
        config.root = root;
        config.normalize_paths();
        config.apply_command_options(cli);
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {field}");
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    fn apply_command_options(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.verbose);

        match &cli.command {
            Commands::Run { args } => {
                Self::update_option(&mut self.batch.parallel, args.parallel.as_ref());
            }
            Commands::Process { args } => {
                // Single asset: everything lands in the chosen output directory.
                let output = args.output.clone().unwrap_or_else(|| {
                    args.image
                        .parent()
                        .map(Path::to_path_buf)
                        .unwrap_or_default()
                });
                self.storage.root = std::path::absolute(&output).unwrap_or(output);
                self.storage.base_url = None;
            }
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve relative paths against the config directory.
    fn normalize_paths(&mut self) {
        self.storage.root = self.root.join(&self.storage.root);
        self.catalog.path = self.root.join(&self.catalog.path);
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate every section, reporting all problems at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.mask.validate(&mut diag);
        self.trace.validate(&mut diag);
        self.normalize.validate(&mut diag);
        self.raster.validate(&mut diag);
        self.storage.validate(&mut diag);

        diag.print_warnings();
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PipelineConfig {
    let (parsed, ignored) = PipelineConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
