//! Train command: fetch histories and fit the configured forecaster

use crate::cli::resolve_items;
use crate::config::Config;
use crate::forecast::{build_forecaster, ArtifactStore};
use crate::market::MarketClient;
use crate::telemetry::{record_latency, set_gauge, GaugeMetric, LatencyMetric};
use clap::Args;
use std::sync::Arc;
use std::time::Instant;

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// World to fetch sale histories from
    #[arg(short, long)]
    pub world: String,

    /// Item names or numeric ids to train on
    #[arg(short, long, required = true, num_args = 1..)]
    pub items: Vec<String>,
}

impl TrainArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let item_ids = resolve_items(&config.catalog.items_path, &self.items)?;

        let client = MarketClient::with_config(config.market.client_config());
        let histories = client.histories(&self.world, &item_ids).await?;

        let total_sales: usize = histories.iter().map(|h| h.len()).sum();
        tracing::info!(
            world = %self.world,
            items = item_ids.len(),
            sales = total_sales,
            "Fetched training histories"
        );

        let store = Arc::new(ArtifactStore::new(&config.artifacts.dir));
        let forecaster = build_forecaster(&config.forecast, store);

        let start = Instant::now();
        let summary = forecaster.fit(&histories)?;
        record_latency(LatencyMetric::Training, start.elapsed());
        set_gauge(GaugeMetric::TrainingSamples, summary.samples as f64);

        if summary.samples == 0 {
            println!("Not enough data to train; existing model left untouched");
        } else {
            println!(
                "{} model {} on {} samples, artifacts saved to {}",
                summary.strategy,
                if summary.updated { "updated" } else { "trained" },
                summary.samples,
                config.artifacts.dir.display()
            );
        }
        Ok(())
    }
}
