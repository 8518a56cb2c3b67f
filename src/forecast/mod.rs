//! Price forecasting module
//!
//! Two interchangeable strategies behind one contract: a windowed-sequence
//! regressor trained in normalized space, and a linear model over
//! (world, item, timestamp) features. Which one runs is a configuration
//! choice; both persist their fitted state through the artifact store.

mod artifact;
mod sequence;
mod series;
mod tabular;

pub use artifact::ArtifactStore;
pub use sequence::{SequenceConfig, SequenceForecaster, SequenceModel};
pub use series::{
    prepare_feature_row, prepare_training_set, prepare_windows, FeatureRow, MinMaxScaler,
    WindowedSeries,
};
pub use tabular::{
    OneHotEncoder, StandardScaler, TabularForecaster, TabularPipeline, TrainingRecord,
};

use crate::config::{ForecastConfig, ForecastStrategy};
use crate::market::SaleHistory;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Forecasting errors
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Series shorter than the model requires; render "no prediction", don't crash
    #[error("insufficient data: {observed} points, need at least {required}")]
    InsufficientData { observed: usize, required: usize },
    /// No artifact on disk yet; equivalent to "no model trained"
    #[error("no saved model at {}", path.display())]
    MissingArtifact { path: PathBuf },
    /// Artifact present but unreadable; must not be silently retrained over
    #[error("corrupt artifact at {}: {reason}", path.display())]
    CorruptArtifact { path: PathBuf, reason: String },
    /// Zero sales records supplied to tabular training
    #[error("no sales records supplied for training")]
    TrainingInputEmpty,
    /// Model output could not be expressed as a price
    #[error("model produced a non-finite prediction")]
    NonFinitePrediction,
    /// Artifact read/write failure that is neither missing nor corrupt
    #[error("artifact io at {}: {source}", path.display())]
    ArtifactIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of one prediction request
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    /// Next-price estimate in original currency units
    Price(Decimal),
    /// Series too short for the fitted model; not an error
    InsufficientData { observed: usize, required: usize },
}

/// What a fit call did
#[derive(Debug, Clone)]
pub struct FitSummary {
    /// Strategy that ran
    pub strategy: &'static str,
    /// Training examples the model saw (windows or rows)
    pub samples: usize,
    /// Whether an existing model was updated rather than trained fresh
    pub updated: bool,
}

/// Contract shared by both forecasting strategies
pub trait Forecaster: Send + Sync {
    /// Strategy name for logs and summaries
    fn name(&self) -> &'static str;

    /// Fit (or update) the model from one or more sale histories
    fn fit(&self, histories: &[SaleHistory]) -> Result<FitSummary, ForecastError>;

    /// Predict the next price for one sale history
    fn predict(&self, history: &SaleHistory) -> Result<Prediction, ForecastError>;
}

/// Build the configured forecaster variant
pub fn build_forecaster(
    config: &ForecastConfig,
    store: Arc<ArtifactStore>,
) -> Arc<dyn Forecaster> {
    match config.strategy {
        ForecastStrategy::Sequence => Arc::new(SequenceForecaster::new(
            store,
            SequenceConfig {
                window_size: config.window_size,
                hidden_units: config.hidden_units,
                epochs: config.epochs,
                learning_rate: config.learning_rate,
            },
        )),
        ForecastStrategy::Tabular => Arc::new(TabularForecaster::new(store)),
    }
}

/// Whether the configured strategy's artifacts are absent or older than the
/// configured retrain age
///
/// This is the caller-side staleness check: training happens here, explicitly,
/// never hidden inside the predict path.
pub fn needs_retrain(config: &ForecastConfig, store: &ArtifactStore) -> bool {
    let age = match config.strategy {
        ForecastStrategy::Sequence => store.sequence_age(),
        ForecastStrategy::Tabular => store.tabular_age(),
    };
    match age {
        None => true,
        Some(age) => age.as_secs() > config.retrain_after_secs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForecastConfig;

    #[test]
    fn test_build_forecaster_by_strategy() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ArtifactStore::new(dir.path()));

        let mut config = ForecastConfig::default();
        config.strategy = ForecastStrategy::Sequence;
        assert_eq!(build_forecaster(&config, store.clone()).name(), "sequence");

        config.strategy = ForecastStrategy::Tabular;
        assert_eq!(build_forecaster(&config, store).name(), "tabular");
    }

    #[test]
    fn test_needs_retrain_when_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let config = ForecastConfig::default();

        assert!(needs_retrain(&config, &store));
    }

    #[test]
    fn test_needs_retrain_respects_fresh_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let model = SequenceModel::new(5, 8);
        let scaler = MinMaxScaler::fit(&[100.0, 200.0]).unwrap();
        store.save_sequence(&model, &scaler).unwrap();

        let config = ForecastConfig::default();
        assert!(!needs_retrain(&config, &store));
    }

    #[test]
    fn test_prediction_equality() {
        let a = Prediction::InsufficientData {
            observed: 2,
            required: 6,
        };
        let b = Prediction::InsufficientData {
            observed: 2,
            required: 6,
        };
        assert_eq!(a, b);
    }
}
