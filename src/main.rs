//! inkpress - vectorize scanned ink illustrations into themeable assets.

mod catalog;
mod cli;
mod config;
mod image;
mod logger;
mod pipeline;
mod storage;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PipelineConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = PipelineConfig::load(&cli)?;

    match &cli.command {
        Commands::Run { args } => cli::run::run_catalog(args, &config),
        Commands::Process { args } => cli::process::process_image(args, &config),
    }
}
