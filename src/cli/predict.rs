//! Predict command: one-shot next-price estimate for a (world, item) pair

use crate::cli::resolve_items;
use crate::config::Config;
use crate::forecast::{build_forecaster, ArtifactStore, ForecastError, Prediction};
use crate::market::MarketClient;
use crate::telemetry::{record_latency, LatencyMetric};
use clap::Args;
use std::sync::Arc;
use std::time::Instant;

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// World the item sells on
    #[arg(short, long)]
    pub world: String,

    /// Item name or numeric id
    #[arg(short, long)]
    pub item: String,
}

impl PredictArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let item_id = resolve_items(&config.catalog.items_path, &[self.item.clone()])?[0];

        let client = MarketClient::with_config(config.market.client_config());
        let history = client.history(&self.world, item_id).await?;

        match history.stats() {
            Some(stats) => println!(
                "{} sales on {} | High: {} | Low: {} | Current: {}",
                history.len(),
                self.world,
                stats.max,
                stats.min,
                stats.current
            ),
            None => {
                println!("No sales found for item {} on {}", item_id, self.world);
                return Ok(());
            }
        }

        let store = Arc::new(ArtifactStore::new(&config.artifacts.dir));
        let forecaster = build_forecaster(&config.forecast, store);

        let start = Instant::now();
        match forecaster.predict(&history) {
            Ok(Prediction::Price(price)) => {
                record_latency(LatencyMetric::Prediction, start.elapsed());
                println!("Predicted next: {:.2}", price);
            }
            Ok(Prediction::InsufficientData { observed, required }) => {
                println!(
                    "No prediction available: {} sales recorded, {} needed",
                    observed, required
                );
            }
            Err(ForecastError::MissingArtifact { .. }) => {
                println!("No trained model yet; run `mb-forecast train` first");
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }
}
