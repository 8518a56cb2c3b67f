//! Sequence forecaster: windowed regression over normalized price history
//!
//! A small dense network maps the last `window_size` normalized prices to the
//! next normalized price, trained by stochastic gradient descent on
//! mean-squared error. All training and inference happens in `[0, 1]` space;
//! the persisted scaler converts back to price units at the boundary.

use super::artifact::ArtifactStore;
use super::series::prepare_training_set;
use super::{FitSummary, ForecastError, Forecaster, Prediction};
use crate::market::SaleHistory;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fixed seed for weight initialization, keeps training runs reproducible
const INIT_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

/// Tuning knobs for the sequence forecaster
#[derive(Debug, Clone)]
pub struct SequenceConfig {
    /// Number of past prices per training window
    pub window_size: usize,
    /// Hidden layer width
    pub hidden_units: usize,
    /// Training passes over the window set per fit call
    pub epochs: usize,
    /// SGD step size
    pub learning_rate: f64,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            window_size: 5,
            hidden_units: 16,
            epochs: 10,
            learning_rate: 0.05,
        }
    }
}

/// Fitted mapping from a window of normalized prices to the next one
///
/// One hidden tanh layer and a linear output. Weights are stored flat,
/// row-major, so the whole model serializes as plain arrays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceModel {
    window_size: usize,
    hidden_units: usize,
    /// Input-to-hidden weights, `hidden_units` rows of `window_size`
    w1: Vec<f64>,
    b1: Vec<f64>,
    /// Hidden-to-output weights
    w2: Vec<f64>,
    b2: f64,
}

impl SequenceModel {
    /// Create an untrained model with deterministic initial weights
    pub fn new(window_size: usize, hidden_units: usize) -> Self {
        let mut state = INIT_SEED;
        let input_scale = 1.0 / (window_size as f64).sqrt();
        let hidden_scale = 1.0 / (hidden_units as f64).sqrt();

        let w1 = (0..window_size * hidden_units)
            .map(|_| next_uniform(&mut state) * input_scale)
            .collect();
        let w2 = (0..hidden_units)
            .map(|_| next_uniform(&mut state) * hidden_scale)
            .collect();

        Self {
            window_size,
            hidden_units,
            w1,
            b1: vec![0.0; hidden_units],
            w2,
            b2: 0.0,
        }
    }

    /// Window length this model was built for
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Predict the next normalized price from one normalized window
    pub fn forward(&self, window: &[f64]) -> f64 {
        let hidden = self.hidden_activations(window);
        self.output(&hidden)
    }

    /// One SGD pass per epoch over the full window set
    pub fn train(&mut self, inputs: &[Vec<f64>], targets: &[f64], epochs: usize, learning_rate: f64) {
        for _ in 0..epochs {
            for (window, target) in inputs.iter().zip(targets) {
                self.step(window, *target, learning_rate);
            }
        }
    }

    /// Mean-squared error over a window set
    pub fn mse(&self, inputs: &[Vec<f64>], targets: &[f64]) -> f64 {
        if inputs.is_empty() {
            return 0.0;
        }
        let total: f64 = inputs
            .iter()
            .zip(targets)
            .map(|(w, t)| {
                let e = self.forward(w) - t;
                e * e
            })
            .sum();
        total / inputs.len() as f64
    }

    fn hidden_activations(&self, window: &[f64]) -> Vec<f64> {
        (0..self.hidden_units)
            .map(|j| {
                let row = &self.w1[j * self.window_size..(j + 1) * self.window_size];
                let z: f64 = row.iter().zip(window).map(|(w, x)| w * x).sum::<f64>() + self.b1[j];
                z.tanh()
            })
            .collect()
    }

    fn output(&self, hidden: &[f64]) -> f64 {
        self.w2.iter().zip(hidden).map(|(w, h)| w * h).sum::<f64>() + self.b2
    }

    fn step(&mut self, window: &[f64], target: f64, learning_rate: f64) {
        let hidden = self.hidden_activations(window);
        let error = self.output(&hidden) - target;

        for j in 0..self.hidden_units {
            // d(loss)/d(hidden_j) through the tanh
            let dh = error * self.w2[j] * (1.0 - hidden[j] * hidden[j]);
            let row = &mut self.w1[j * self.window_size..(j + 1) * self.window_size];
            for (w, x) in row.iter_mut().zip(window) {
                *w -= learning_rate * dh * x;
            }
            self.b1[j] -= learning_rate * dh;
            self.w2[j] -= learning_rate * error * hidden[j];
        }
        self.b2 -= learning_rate * error;
    }
}

/// splitmix64 step mapped into [-1, 1]
fn next_uniform(state: &mut u64) -> f64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
}

/// Forecaster that trains incrementally on windowed price sequences
///
/// On each fit call: if no artifacts exist yet, a fresh model is trained and
/// saved; if artifacts exist, the scaler is refit on the new data and training
/// continues on the saved weights. Normalization bounds therefore drift
/// between calls whenever the price distribution shifts.
pub struct SequenceForecaster {
    store: Arc<ArtifactStore>,
    config: SequenceConfig,
}

impl SequenceForecaster {
    /// Create a forecaster persisting into the given store
    pub fn new(store: Arc<ArtifactStore>, config: SequenceConfig) -> Self {
        Self { store, config }
    }

    /// Train a new model or continue training the persisted one
    ///
    /// Artifacts are always re-saved after a successful fit. An update call
    /// without enough data for a single window is a logged no-op, not an
    /// error; a fresh-training call without enough data fails.
    pub fn fit_or_update(&self, histories: &[SaleHistory]) -> Result<FitSummary, ForecastError> {
        let series: Vec<Vec<f64>> = histories.iter().map(SaleHistory::prices_f64).collect();

        let (model_path, _) = self.store.sequence_paths();
        let lock = self.store.slot_lock(&model_path);
        let _guard = lock.lock().expect("sequence artifact lock poisoned");

        if self.store.sequence_exists() {
            // Corrupt artifacts must surface here, not fall back to retraining
            let (mut model, _stale_scaler) = self.store.load_sequence()?;

            let windowed = match prepare_training_set(&series, model.window_size()) {
                Ok(windowed) => windowed,
                Err(ForecastError::InsufficientData { observed, required }) => {
                    tracing::info!(observed, required, "Not enough data to update, skipping");
                    return Ok(FitSummary {
                        strategy: "sequence",
                        samples: 0,
                        updated: false,
                    });
                }
                Err(e) => return Err(e),
            };

            // The scaler is always refit on the current series, never reused
            model.train(
                &windowed.inputs,
                &windowed.targets,
                self.config.epochs,
                self.config.learning_rate,
            );
            self.store.save_sequence(&model, &windowed.scaler)?;

            tracing::info!(
                windows = windowed.inputs.len(),
                mse = model.mse(&windowed.inputs, &windowed.targets),
                "Updated sequence model"
            );
            Ok(FitSummary {
                strategy: "sequence",
                samples: windowed.inputs.len(),
                updated: true,
            })
        } else {
            let windowed = prepare_training_set(&series, self.config.window_size)?;
            let mut model = SequenceModel::new(self.config.window_size, self.config.hidden_units);
            model.train(
                &windowed.inputs,
                &windowed.targets,
                self.config.epochs,
                self.config.learning_rate,
            );
            self.store.save_sequence(&model, &windowed.scaler)?;

            tracing::info!(
                windows = windowed.inputs.len(),
                mse = model.mse(&windowed.inputs, &windowed.targets),
                "Trained new sequence model"
            );
            Ok(FitSummary {
                strategy: "sequence",
                samples: windowed.inputs.len(),
                updated: false,
            })
        }
    }
}

impl Forecaster for SequenceForecaster {
    fn name(&self) -> &'static str {
        "sequence"
    }

    fn fit(&self, histories: &[SaleHistory]) -> Result<FitSummary, ForecastError> {
        self.fit_or_update(histories)
    }

    fn predict(&self, history: &SaleHistory) -> Result<Prediction, ForecastError> {
        let prices = history.prices_f64();

        // A short series is a signal, not an error, even before any model exists
        if prices.len() <= self.config.window_size {
            return Ok(Prediction::InsufficientData {
                observed: prices.len(),
                required: self.config.window_size + 1,
            });
        }

        let (model, scaler) = self.store.load_sequence()?;
        let window_size = model.window_size();

        if prices.len() <= window_size {
            return Ok(Prediction::InsufficientData {
                observed: prices.len(),
                required: window_size + 1,
            });
        }

        let window: Vec<f64> = prices[prices.len() - window_size..]
            .iter()
            .map(|p| scaler.transform(*p))
            .collect();
        let normalized = model.forward(&window);
        let price = scaler.inverse(normalized);

        let price = Decimal::try_from(price).map_err(|_| ForecastError::NonFinitePrediction)?;
        Ok(Prediction::Price(price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::PricePoint;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    fn history(prices: &[i64]) -> SaleHistory {
        let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, p)| PricePoint {
                timestamp: base + Duration::hours(i as i64),
                price: Decimal::from(*p),
            })
            .collect();
        SaleHistory::new("Leviathan", 101, points)
    }

    fn store() -> (tempfile::TempDir, Arc<ArtifactStore>) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ArtifactStore::new(dir.path()));
        (dir, store)
    }

    #[test]
    fn test_model_init_is_deterministic() {
        let a = SequenceModel::new(5, 16);
        let b = SequenceModel::new(5, 16);
        let window = vec![0.2, 0.4, 0.6, 0.8, 1.0];
        assert_eq!(a.forward(&window), b.forward(&window));
    }

    #[test]
    fn test_training_reduces_mse() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64) * 5.0).collect();
        let windowed = crate::forecast::series::prepare_windows(&prices, 5).unwrap();

        let mut model = SequenceModel::new(5, 16);
        let before = model.mse(&windowed.inputs, &windowed.targets);
        model.train(&windowed.inputs, &windowed.targets, 50, 0.05);
        let after = model.mse(&windowed.inputs, &windowed.targets);

        assert!(after < before, "mse did not improve: {} -> {}", before, after);
    }

    #[test]
    fn test_fresh_fit_persists_artifacts() {
        let (_dir, store) = store();
        let forecaster = SequenceForecaster::new(store.clone(), SequenceConfig::default());

        let summary = forecaster
            .fit_or_update(&[history(&[100, 200, 150, 300, 250, 400, 380, 420])])
            .unwrap();

        assert_eq!(summary.samples, 3);
        assert!(!summary.updated);
        assert!(store.sequence_exists());
    }

    #[test]
    fn test_fresh_fit_insufficient_data_fails() {
        let (_dir, store) = store();
        let forecaster = SequenceForecaster::new(store, SequenceConfig::default());

        let result = forecaster.fit_or_update(&[history(&[100, 200, 150])]);
        assert!(matches!(
            result,
            Err(ForecastError::InsufficientData { observed: 3, .. })
        ));
    }

    #[test]
    fn test_update_with_short_series_is_noop() {
        let (_dir, store) = store();
        let forecaster = SequenceForecaster::new(store.clone(), SequenceConfig::default());

        forecaster
            .fit_or_update(&[history(&[100, 200, 150, 300, 250, 400])])
            .unwrap();
        let (model_before, _) = store.load_sequence().unwrap();

        // Second call with too little data: logged skip, weights untouched
        let summary = forecaster.fit_or_update(&[history(&[500, 600])]).unwrap();
        assert_eq!(summary.samples, 0);
        assert!(!summary.updated);

        let (model_after, _) = store.load_sequence().unwrap();
        let window = vec![0.1, 0.2, 0.3, 0.4, 0.5];
        assert_eq!(model_before.forward(&window), model_after.forward(&window));
    }

    #[test]
    fn test_update_refits_scaler() {
        let (_dir, store) = store();
        let forecaster = SequenceForecaster::new(store.clone(), SequenceConfig::default());

        forecaster
            .fit_or_update(&[history(&[100, 200, 150, 300, 250, 400])])
            .unwrap();

        // New regime: much higher prices; scaler must track them
        let summary = forecaster
            .fit_or_update(&[history(&[1000, 2000, 1500, 3000, 2500, 4000])])
            .unwrap();
        assert!(summary.updated);

        let (_, scaler) = store.load_sequence().unwrap();
        assert_eq!(scaler.transform(4000.0), 1.0);
        assert_eq!(scaler.transform(1000.0), 0.0);
    }

    #[test]
    fn test_predict_without_artifacts() {
        let (_dir, store) = store();
        let forecaster = SequenceForecaster::new(store, SequenceConfig::default());

        let result = forecaster.predict(&history(&[100, 200, 150, 300, 250, 400]));
        assert!(matches!(
            result,
            Err(ForecastError::MissingArtifact { .. })
        ));
    }

    #[test]
    fn test_predict_short_series_before_any_training() {
        let (_dir, store) = store();
        let forecaster = SequenceForecaster::new(store, SequenceConfig::default());

        // No artifacts yet: a short series still signals, never errors
        let result = forecaster.predict(&history(&[100, 200, 150])).unwrap();
        assert!(matches!(result, Prediction::InsufficientData { .. }));
    }

    #[test]
    fn test_predict_insufficient_data_is_a_signal() {
        let (_dir, store) = store();
        let forecaster = SequenceForecaster::new(store, SequenceConfig::default());

        forecaster
            .fit_or_update(&[history(&[100, 200, 150, 300, 250, 400])])
            .unwrap();

        let result = forecaster.predict(&history(&[100, 200])).unwrap();
        assert!(matches!(
            result,
            Prediction::InsufficientData {
                observed: 2,
                required: 6
            }
        ));
    }

    #[test]
    fn test_predict_returns_price_in_original_units() {
        let (_dir, store) = store();
        let mut config = SequenceConfig::default();
        config.epochs = 100;
        let forecaster = SequenceForecaster::new(store, config);

        let prices: Vec<i64> = (0..40).map(|i| 1000 + i * 50).collect();
        forecaster.fit_or_update(&[history(&prices)]).unwrap();

        let prediction = forecaster.predict(&history(&prices)).unwrap();
        match prediction {
            Prediction::Price(p) => {
                // In gil units, somewhere near the fitted range
                assert!(p > Decimal::from(500) && p < Decimal::from(5000), "{}", p);
            }
            other => panic!("expected a price, got {:?}", other),
        }
    }

    #[test]
    fn test_degenerate_series_trains_without_error() {
        let (_dir, store) = store();
        let forecaster = SequenceForecaster::new(store, SequenceConfig::default());

        let summary = forecaster
            .fit_or_update(&[history(&[50, 50, 50, 50, 50, 50])])
            .unwrap();
        assert_eq!(summary.samples, 1);

        // Degenerate scaler maps prediction back onto the flat price
        let prediction = forecaster
            .predict(&history(&[50, 50, 50, 50, 50, 50]))
            .unwrap();
        assert!(matches!(prediction, Prediction::Price(p) if p == Decimal::from(50)));
    }
}
