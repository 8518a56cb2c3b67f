//! CLI interface for mb-forecast
//!
//! Provides subcommands for:
//! - `catalog`: refresh the item catalog from the item API
//! - `capture`: fetch sale histories and write Parquet training data
//! - `train`: fit the configured forecaster on fetched histories
//! - `predict`: one-shot prediction for a (world, item) pair
//! - `serve`: run the browser dashboard
//! - `status`: show artifact state
//! - `config`: show configuration

mod capture;
mod catalog;
mod predict;
mod serve;
mod train;

pub use capture::CaptureArgs;
pub use catalog::CatalogArgs;
pub use predict::PredictArgs;
pub use serve::ServeArgs;
pub use train::TrainArgs;

use crate::catalog::ItemCatalog;
use clap::{Parser, Subcommand};
use std::path::Path;

#[derive(Parser, Debug)]
#[command(name = "mb-forecast")]
#[command(about = "Market board price history forecasting")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Refresh the item catalog from the item API
    Catalog(CatalogArgs),
    /// Fetch sale histories and write Parquet training data
    Capture(CaptureArgs),
    /// Fit the configured forecaster on fetched histories
    Train(TrainArgs),
    /// Predict the next price for one item on one world
    Predict(PredictArgs),
    /// Run the browser dashboard
    Serve(ServeArgs),
    /// Show artifact state
    Status,
    /// Show configuration
    Config,
}

/// Resolve item arguments: numeric ids pass through, names go through the
/// catalog (loaded lazily, only when a name is present)
pub(crate) fn resolve_items(catalog_path: &Path, items: &[String]) -> anyhow::Result<Vec<u32>> {
    let mut catalog: Option<ItemCatalog> = None;
    let mut ids = Vec::with_capacity(items.len());

    for item in items {
        if let Ok(id) = item.parse::<u32>() {
            ids.push(id);
            continue;
        }

        if catalog.is_none() {
            catalog = Some(ItemCatalog::load(catalog_path).map_err(|e| {
                anyhow::anyhow!(
                    "item '{}' is not numeric and the catalog could not be loaded \
                     (run `mb-forecast catalog` first): {}",
                    item,
                    e
                )
            })?);
        }

        match catalog.as_ref().and_then(|c| c.get(item)) {
            Some(id) => ids.push(id),
            None => anyhow::bail!("item '{}' not found in the catalog", item),
        }
    }

    Ok(ids)
}
