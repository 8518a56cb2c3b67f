//! Browser dashboard for price lookups and forecasts
//!
//! Serves one embedded HTML page plus a small JSON API: item search,
//! data-center listings, and per-world sale history with stats and the
//! configured forecaster's next-price estimate. The dashboard owns the
//! item catalog and the retrain-if-stale decision; the forecasting core
//! stays presentation-free.

mod handlers;
mod routes;
mod service;
mod worlds;

pub use routes::create_router;
pub use service::{build_world_panel, PanelPoint, WorldPanel};
pub use worlds::{worlds_of, DataCenter, DATA_CENTERS};

use crate::catalog::ItemCatalog;
use crate::config::ForecastConfig;
use crate::forecast::{ArtifactStore, Forecaster};
use crate::market::MarketDataSource;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Shared state behind every dashboard handler
#[derive(Clone)]
pub struct AppState {
    /// Immutable name-to-id lookup, loaded at startup
    pub catalog: Arc<ItemCatalog>,
    /// Sale-history source
    pub market: Arc<dyn MarketDataSource>,
    /// Configured forecaster variant
    pub forecaster: Arc<dyn Forecaster>,
    /// Artifact store backing the staleness check
    pub store: Arc<ArtifactStore>,
    /// Forecast knobs, including the retrain age
    pub forecast: ForecastConfig,
}

/// Start the dashboard server; runs until the process exits
pub async fn start_server(state: AppState, bind_address: &str) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = TcpListener::bind(bind_address).await?;
    tracing::info!(address = bind_address, "Dashboard listening");

    axum::serve(listener, app).await?;
    Ok(())
}
