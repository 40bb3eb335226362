//! Vegetation index compositing runner.
//!
//! Composites the daily CMG tiles of one or more 8-day windows into a
//! best-pixel index raster, or writes the masked index of a single tile.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use compositor::CompositeConfig;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "vi-composite")]
#[command(about = "Best-pixel vegetation index compositing for MODIS/VIIRS tiles")]
struct Cli {
    /// Configuration file path (YAML)
    #[arg(short, long, env = "VI_CONFIG")]
    config: Option<PathBuf>,

    /// Product name, e.g. MOD09CMG (overrides config)
    #[arg(short, long)]
    product: Option<String>,

    /// Vegetation index, NDVI or GCVI (overrides config)
    #[arg(short, long)]
    index: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Composite the tiles of the window starting at each date
    Composite {
        /// First day of a compositing window (repeatable)
        #[arg(short, long = "date", required = true)]
        dates: Vec<NaiveDate>,

        /// Directory holding one tile directory per day
        #[arg(long)]
        tile_root: PathBuf,

        /// Directory the composites are written to
        #[arg(short, long)]
        output: PathBuf,

        /// Let snow observations win instead of excluding them
        #[arg(long)]
        keep_snow: bool,

        /// Replace existing composites
        #[arg(long)]
        overwrite: bool,
    },

    /// Write the masked index of a single tile
    Tile {
        /// Tile directory
        #[arg(short, long)]
        tile: PathBuf,

        /// Output raster path
        #[arg(short, long)]
        output: PathBuf,

        /// Also export the product's QA layer to this path
        #[arg(long)]
        qa: Option<PathBuf>,

        /// Replace existing rasters
        #[arg(long)]
        overwrite: bool,
    },
}

fn log_level(name: &str) -> Level {
    match name.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Config file, then environment, then command line.
fn load_config(cli: &Cli) -> Result<CompositeConfig> {
    let mut config = match &cli.config {
        Some(path) => CompositeConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => CompositeConfig::default(),
    };
    config.apply_env().context("reading VI_* environment")?;

    if let Some(product) = &cli.product {
        config.product = product.parse()?;
    }
    if let Some(index) = &cli.index {
        config.vegetation_index = index.parse()?;
    }
    match &cli.command {
        Commands::Composite {
            keep_snow,
            overwrite,
            ..
        } => {
            if *keep_snow {
                config.snow_mask = false;
            }
            config.output.overwrite |= *overwrite;
        }
        Commands::Tile { overwrite, .. } => config.output.overwrite |= *overwrite,
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(&cli.log_level))
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&cli)?;
    info!(
        product = %config.product,
        index = %config.vegetation_index,
        snow_mask = config.snow_mask,
        window_days = config.window_days,
        "Loaded configuration"
    );

    match &cli.command {
        Commands::Composite {
            dates,
            tile_root,
            output,
            ..
        } => commands::composite_dates(&config, tile_root, output, dates),
        Commands::Tile {
            tile, output, qa, ..
        } => commands::process_tile(&config, tile, output, qa.as_deref()),
    }
}
