//! Serve command: run the browser dashboard

use crate::catalog::ItemCatalog;
use crate::config::Config;
use crate::dashboard::{self, AppState};
use crate::forecast::{build_forecaster, ArtifactStore};
use crate::market::MarketClient;
use crate::telemetry::{set_gauge, GaugeMetric};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Bind address override, e.g. "0.0.0.0:8050"
    #[arg(short, long)]
    pub bind: Option<String>,
}

impl ServeArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let catalog = match ItemCatalog::load(&config.catalog.items_path) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::warn!(
                    path = %config.catalog.items_path.display(),
                    error = %e,
                    "Item catalog not loaded; run `mb-forecast catalog` to fetch it"
                );
                ItemCatalog::default()
            }
        };
        set_gauge(GaugeMetric::CatalogItems, catalog.len() as f64);

        let store = Arc::new(ArtifactStore::new(&config.artifacts.dir));
        let state = AppState {
            catalog: Arc::new(catalog),
            market: Arc::new(MarketClient::with_config(config.market.client_config())),
            forecaster: build_forecaster(&config.forecast, store.clone()),
            store,
            forecast: config.forecast.clone(),
        };

        let bind = self
            .bind
            .clone()
            .unwrap_or_else(|| config.dashboard.bind_address.clone());
        dashboard::start_server(state, &bind).await
    }
}
