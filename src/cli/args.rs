//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::image::color::Color;

/// Vectorize scanned ink illustrations into themeable SVG and raster derivatives
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: inkpress.toml)
    #[arg(short = 'C', long, global = true, default_value = "inkpress.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Print per-stage debug output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the pipeline over catalog assets
    #[command(visible_alias = "r")]
    Run {
        #[command(flatten)]
        args: RunArgs,
    },

    /// Run the pipeline on a single local image
    #[command(visible_alias = "p")]
    Process {
        #[command(flatten)]
        args: ProcessArgs,
    },
}

/// Which catalog assets a batch covers.
#[derive(clap::Args, Debug, Clone, Default)]
#[group(multiple = false)]
pub struct ScopeArgs {
    /// Process every asset (default)
    #[arg(short, long)]
    pub all: bool,

    /// Only assets missing at least one derivative
    #[arg(short, long)]
    pub missing: bool,

    /// Only assets of one collection
    #[arg(short = 'c', long, value_name = "ID")]
    pub collection: Option<String>,
}

/// `run` command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Process assets in parallel (overrides `batch.parallel`)
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub parallel: Option<bool>,

    /// Write the batch report (successes and failure records) as JSON
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub report: Option<PathBuf>,
}

/// `process` command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct ProcessArgs {
    /// Scanned image (PNG, JPEG or WebP)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub image: PathBuf,

    /// Output directory (default: next to the image)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Fill color for raster derivatives and the theme fallback
    #[arg(long = "fill", value_name = "HEX", default_value = "#2d5bff")]
    pub fill: Color,

    /// Raster sizes to render
    #[arg(short, long, value_delimiter = ',', default_value = "512,1024")]
    pub sizes: Vec<u32>,
}
