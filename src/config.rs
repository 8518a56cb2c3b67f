//! Configuration types for mb-forecast

use crate::catalog::CatalogClientConfig;
use crate::market::MarketClientConfig;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub market: MarketConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    pub artifacts: ArtifactsConfig,
    pub dashboard: DashboardConfig,
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

/// Item catalog configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Item API base URL
    pub base_url: String,
    /// Where the name-to-id map is persisted
    pub items_path: PathBuf,
}

impl CatalogConfig {
    /// Build the catalog client configuration
    pub fn client_config(&self) -> CatalogClientConfig {
        CatalogClientConfig {
            base_url: self.base_url.clone(),
            ..CatalogClientConfig::default()
        }
    }
}

/// Market board history API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    /// History API base URL
    pub base_url: String,
    /// Maximum sale entries to request per item
    pub max_entries: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Delay between requests when fetching many items, in milliseconds
    #[serde(default = "default_fetch_delay_ms")]
    pub fetch_delay_ms: u64,
}

fn default_fetch_delay_ms() -> u64 {
    50
}

impl MarketConfig {
    /// Build the history client configuration
    pub fn client_config(&self) -> MarketClientConfig {
        MarketClientConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            max_entries: self.max_entries,
            fetch_delay: Duration::from_millis(self.fetch_delay_ms),
        }
    }
}

/// Forecasting strategy selection
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ForecastStrategy {
    /// Windowed-sequence regression over normalized prices
    #[default]
    Sequence,
    /// Linear regression over (world, item, timestamp) features
    Tabular,
}

/// Forecasting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastConfig {
    /// Which forecaster variant to run
    #[serde(default)]
    pub strategy: ForecastStrategy,

    /// Past prices per training window (sequence strategy)
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Training passes per fit call (sequence strategy)
    #[serde(default = "default_epochs")]
    pub epochs: usize,

    /// Hidden layer width (sequence strategy)
    #[serde(default = "default_hidden_units")]
    pub hidden_units: usize,

    /// SGD step size (sequence strategy)
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    /// Retrain when the saved artifact is older than this many seconds
    #[serde(default = "default_retrain_after_secs")]
    pub retrain_after_secs: u64,
}

fn default_window_size() -> usize {
    5
}
fn default_epochs() -> usize {
    10
}
fn default_hidden_units() -> usize {
    16
}
fn default_learning_rate() -> f64 {
    0.05
}
fn default_retrain_after_secs() -> u64 {
    3600
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            strategy: ForecastStrategy::Sequence,
            window_size: 5,
            epochs: 10,
            hidden_units: 16,
            learning_rate: 0.05,
            retrain_after_secs: 3600,
        }
    }
}

/// Fitted artifact storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// Directory holding the persisted model and scaler files
    pub dir: PathBuf,
}

/// Dashboard server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Address the HTTP server binds, e.g. "127.0.0.1:8050"
    pub bind_address: String,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    pub metrics_port: u16,
    pub log_level: String,
}

/// Training-data capture configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    /// Output directory for Parquet files
    #[serde(default = "default_capture_dir")]
    pub output_dir: PathBuf,

    /// Rotation interval in seconds
    #[serde(default = "default_rotation_secs")]
    pub rotation_interval_secs: u64,

    /// Buffered records before a flush
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Maximum seconds between flushes
    #[serde(default = "default_flush_secs")]
    pub flush_interval_secs: u64,
}

fn default_capture_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_rotation_secs() -> u64 {
    3600
}
fn default_buffer_size() -> usize {
    1000
}
fn default_flush_secs() -> u64 {
    60
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./data"),
            rotation_interval_secs: 3600,
            buffer_size: 1000,
            flush_interval_secs: 60,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
