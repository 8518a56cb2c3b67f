//! Capture command: fetch histories and write them as Parquet training data

use crate::cli::resolve_items;
use crate::config::Config;
use crate::data::{RecorderConfig, SalesRecorder};
use crate::market::MarketClient;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CaptureArgs {
    /// World to fetch sale histories from
    #[arg(short, long)]
    pub world: String,

    /// Item names or numeric ids to capture
    #[arg(short, long, required = true, num_args = 1..)]
    pub items: Vec<String>,

    /// Output directory override
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CaptureArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let item_ids = resolve_items(&config.catalog.items_path, &self.items)?;

        let mut recorder_config = RecorderConfig::from(&config.capture);
        if let Some(output) = &self.output {
            recorder_config.output_dir = output.clone();
        }
        let recorder = SalesRecorder::new(recorder_config);

        let client = MarketClient::with_config(config.market.client_config());
        let histories = client.histories(&self.world, &item_ids).await?;

        for history in &histories {
            tracing::info!(
                world = %history.world,
                item_id = history.item_id,
                sales = history.len(),
                "Captured history"
            );
            recorder.record_history(history).await;
        }

        let stats = recorder.close().await;
        println!(
            "Captured {} sales across {} items into {} file(s)",
            stats.records_written,
            histories.len(),
            stats.files_written
        );
        Ok(())
    }
}
