//! Panel assembly: fetch, stats, retrain-if-stale, predict
//!
//! One panel per world. Training happens here, explicitly, when the saved
//! artifact is missing or older than the configured age; prediction failures
//! degrade to a note on the affected panel instead of failing the request.

use super::AppState;
use crate::forecast::{needs_retrain, ForecastError, Prediction};
use crate::market::{SaleHistory, SeriesStats};
use crate::telemetry::{record_latency, set_gauge, GaugeMetric, LatencyMetric};
use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Instant;

/// One (world, item) panel as rendered by the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct WorldPanel {
    pub world: String,
    pub item_id: u32,
    /// Sales oldest-first, for the price graph
    pub sales: Vec<PanelPoint>,
    /// Min/max/current over the fetched history, absent when no sales
    pub stats: Option<SeriesStats>,
    /// Next-price estimate in gil, absent when unavailable
    pub predicted_next: Option<Decimal>,
    /// Why a prediction (or the whole panel) is missing
    pub note: Option<String>,
}

/// One plotted sale
#[derive(Debug, Clone, Serialize)]
pub struct PanelPoint {
    pub timestamp: i64,
    pub price: Decimal,
}

/// Build the panel for one (world, item) pair
pub async fn build_world_panel(state: &AppState, world: &str, item_id: u32) -> WorldPanel {
    let fetch_start = Instant::now();
    let history = match state.market.fetch_history(world, item_id).await {
        Ok(history) => history,
        Err(e) => {
            tracing::warn!(world, item_id, error = %e, "History fetch failed");
            return WorldPanel {
                world: world.to_string(),
                item_id,
                sales: Vec::new(),
                stats: None,
                predicted_next: None,
                note: Some(format!("fetch failed: {}", e)),
            };
        }
    };
    record_latency(LatencyMetric::HistoryFetch, fetch_start.elapsed());
    set_gauge(GaugeMetric::HistoryLength, history.len() as f64);

    let stats = history.stats();
    let sales = history
        .points
        .iter()
        .map(|p| PanelPoint {
            timestamp: p.timestamp.timestamp(),
            price: p.price,
        })
        .collect();

    let (predicted_next, note) = forecast_for(state, &history).await;

    WorldPanel {
        world: world.to_string(),
        item_id,
        sales,
        stats,
        predicted_next,
        note,
    }
}

/// Train if stale, then predict; map outcomes onto (price, note)
async fn forecast_for(state: &AppState, history: &SaleHistory) -> (Option<Decimal>, Option<String>) {
    if history.is_empty() {
        return (None, Some("no sales found".to_string()));
    }

    if needs_retrain(&state.forecast, &state.store) {
        let train_start = Instant::now();
        match state.forecaster.fit(std::slice::from_ref(history)) {
            Ok(summary) => {
                record_latency(LatencyMetric::Training, train_start.elapsed());
                set_gauge(GaugeMetric::TrainingSamples, summary.samples as f64);
                tracing::info!(
                    strategy = summary.strategy,
                    samples = summary.samples,
                    updated = summary.updated,
                    world = %history.world,
                    item_id = history.item_id,
                    "Retrained stale model"
                );
            }
            Err(ForecastError::InsufficientData { observed, required }) => {
                return (
                    None,
                    Some(format!(
                        "not enough sales to train ({} of {})",
                        observed, required
                    )),
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Training failed");
                return (None, Some(format!("training failed: {}", e)));
            }
        }
    }

    let predict_start = Instant::now();
    match state.forecaster.predict(history) {
        Ok(Prediction::Price(price)) => {
            record_latency(LatencyMetric::Prediction, predict_start.elapsed());
            (Some(price), None)
        }
        Ok(Prediction::InsufficientData { observed, required }) => (
            None,
            Some(format!(
                "not enough sales to predict ({} of {})",
                observed, required
            )),
        ),
        Err(ForecastError::MissingArtifact { .. }) => {
            (None, Some("no trained model yet".to_string()))
        }
        Err(ForecastError::InsufficientData { observed, required }) => (
            None,
            Some(format!(
                "not enough sales to predict ({} of {})",
                observed, required
            )),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Prediction failed");
            (None, Some(format!("prediction failed: {}", e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemCatalog;
    use crate::config::ForecastConfig;
    use crate::forecast::{build_forecaster, ArtifactStore};
    use crate::market::{MarketDataSource, PricePoint};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;

    /// Canned history source for handler tests
    struct StubMarket {
        prices: Vec<i64>,
    }

    #[async_trait]
    impl MarketDataSource for StubMarket {
        async fn fetch_history(&self, world: &str, item_id: u32) -> anyhow::Result<SaleHistory> {
            let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
            let points = self
                .prices
                .iter()
                .enumerate()
                .map(|(i, p)| PricePoint {
                    timestamp: base + Duration::hours(i as i64),
                    price: Decimal::from(*p),
                })
                .collect();
            Ok(SaleHistory::new(world, item_id, points))
        }
    }

    fn state_with(prices: Vec<i64>, dir: &std::path::Path) -> AppState {
        let store = Arc::new(ArtifactStore::new(dir));
        let forecast = ForecastConfig::default();
        AppState {
            catalog: Arc::new(ItemCatalog::default()),
            market: Arc::new(StubMarket { prices }),
            forecaster: build_forecaster(&forecast, store.clone()),
            store,
            forecast,
        }
    }

    #[tokio::test]
    async fn test_panel_trains_then_predicts() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(vec![100, 200, 150, 300, 250, 400, 380, 420], dir.path());

        let panel = build_world_panel(&state, "Leviathan", 5057).await;

        assert_eq!(panel.world, "Leviathan");
        assert_eq!(panel.sales.len(), 8);
        assert!(panel.stats.is_some());
        assert!(panel.predicted_next.is_some(), "note: {:?}", panel.note);
        assert!(state.store.sequence_exists());
    }

    #[tokio::test]
    async fn test_panel_short_history_gets_note_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(vec![100, 200], dir.path());

        let panel = build_world_panel(&state, "Leviathan", 5057).await;

        assert_eq!(panel.sales.len(), 2);
        assert!(panel.stats.is_some());
        assert!(panel.predicted_next.is_none());
        assert!(panel.note.unwrap().contains("not enough sales"));
    }

    #[tokio::test]
    async fn test_panel_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(vec![], dir.path());

        let panel = build_world_panel(&state, "Leviathan", 5057).await;

        assert!(panel.sales.is_empty());
        assert!(panel.stats.is_none());
        assert_eq!(panel.note.as_deref(), Some("no sales found"));
    }
}
