//! Prometheus metrics

use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Item catalog refresh
    CatalogFetch,
    /// One sale-history fetch
    HistoryFetch,
    /// One forecaster fit call
    Training,
    /// One forecaster predict call
    Prediction,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Items in the loaded catalog
    CatalogItems,
    /// Sales in the last fetched history
    HistoryLength,
    /// Training windows/rows in the last fit
    TrainingSamples,
    /// Seconds since the artifact was last written
    ArtifactAgeSecs,
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let name = match metric {
        LatencyMetric::CatalogFetch => "mbforecast_catalog_fetch_latency_ms",
        LatencyMetric::HistoryFetch => "mbforecast_history_fetch_latency_ms",
        LatencyMetric::Training => "mbforecast_training_latency_ms",
        LatencyMetric::Prediction => "mbforecast_prediction_latency_ms",
    };

    metrics::histogram!(name).record(duration.as_millis() as f64);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let name = match metric {
        GaugeMetric::CatalogItems => "mbforecast_catalog_items",
        GaugeMetric::HistoryLength => "mbforecast_history_length",
        GaugeMetric::TrainingSamples => "mbforecast_training_samples",
        GaugeMetric::ArtifactAgeSecs => "mbforecast_artifact_age_secs",
    };

    metrics::gauge!(name).set(value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_latency_without_recorder() {
        // No global recorder installed in tests; must not panic
        record_latency(LatencyMetric::Prediction, Duration::from_millis(5));
    }

    #[test]
    fn test_set_gauge_without_recorder() {
        set_gauge(GaugeMetric::CatalogItems, 42.0);
    }
}
