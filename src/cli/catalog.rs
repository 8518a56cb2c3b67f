//! Catalog refresh command

use crate::catalog::CatalogClient;
use crate::config::Config;
use crate::telemetry::{record_latency, set_gauge, GaugeMetric, LatencyMetric};
use clap::Args;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Write the catalog somewhere other than the configured path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CatalogArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let client = CatalogClient::with_config(config.catalog.client_config());

        let start = Instant::now();
        let catalog = client.fetch_catalog().await?;
        record_latency(LatencyMetric::CatalogFetch, start.elapsed());
        set_gauge(GaugeMetric::CatalogItems, catalog.len() as f64);

        let path = self
            .output
            .clone()
            .unwrap_or_else(|| config.catalog.items_path.clone());
        catalog.save(&path)?;

        println!("Saved {} items to {}", catalog.len(), path.display());
        Ok(())
    }
}
