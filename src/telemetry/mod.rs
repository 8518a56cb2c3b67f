//! Telemetry module
//!
//! Structured logging and Prometheus metrics

mod logging;
mod metrics;

pub use logging::init_logging;
pub use metrics::{record_latency, set_gauge, GaugeMetric, LatencyMetric};

use crate::config::TelemetryConfig;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Guard that keeps telemetry alive for the process lifetime
pub struct TelemetryGuard {
    _priv: (),
}

/// Initialize logging and the metrics exporter
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    init_logging(&config.log_level)?;

    // Another local command may already hold the metrics port
    match PrometheusBuilder::new()
        .with_http_listener(([127, 0, 0, 1], config.metrics_port))
        .install()
    {
        Ok(()) => tracing::info!(port = config.metrics_port, "Metrics exporter listening"),
        Err(e) => tracing::warn!(error = %e, "Metrics exporter not started"),
    }

    Ok(TelemetryGuard { _priv: () })
}
