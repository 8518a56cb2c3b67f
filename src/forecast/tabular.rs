//! Tabular forecaster: linear regression over (world, item, timestamp)
//!
//! One-hot encodes the world, passes item id and timestamp through, standard
//! scales every column, and fits ordinary least squares against the raw price.
//! The target is never scaled, so predictions come out in price units
//! directly. The whole pipeline is refit from scratch on every training call.

use super::artifact::ArtifactStore;
use super::series::{prepare_feature_row, FeatureRow};
use super::{FitSummary, ForecastError, Forecaster, Prediction};
use crate::market::SaleHistory;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Ridge term added to the normal equations' diagonal; keeps the solve well
/// posed when a column is constant (single world, single item)
const RIDGE_EPSILON: f64 = 1e-9;

/// One flat sales row used for tabular training
#[derive(Debug, Clone)]
pub struct TrainingRecord {
    pub item_id: u32,
    pub world: String,
    pub timestamp: i64,
    pub price: f64,
}

/// One-hot encoder over the worlds seen at training time
///
/// A world unseen at training time encodes as an all-zero block; unknown
/// categories are tolerated, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    categories: Vec<String>,
}

impl OneHotEncoder {
    /// Fit over the distinct values in the training data
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut categories: Vec<String> = values.into_iter().map(str::to_string).collect();
        categories.sort();
        categories.dedup();
        Self { categories }
    }

    /// Encode one value as an indicator vector over the known categories
    pub fn encode(&self, value: &str) -> Vec<f64> {
        let mut out = vec![0.0; self.categories.len()];
        match self.categories.binary_search_by(|c| c.as_str().cmp(value)) {
            Ok(idx) => out[idx] = 1.0,
            Err(_) => {
                tracing::debug!(world = value, "World not seen at training time, encoding as zeros");
            }
        }
        out
    }

    /// Number of known categories
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether no categories were seen
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Per-column standardization fitted from the training matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Fit means and standard deviations column-wise
    ///
    /// A zero-variance column keeps a scale of 1 so it standardizes to zero
    /// instead of dividing by zero.
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        let n = rows.len() as f64;

        let mut means = vec![0.0; cols];
        for row in rows {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        let mut scales = vec![0.0; cols];
        for row in rows {
            for ((s, v), m) in scales.iter_mut().zip(row).zip(&means) {
                *s += (v - m) * (v - m);
            }
        }
        for s in &mut scales {
            *s = (*s / n).sqrt();
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Self { means, scales }
    }

    /// Standardize one row
    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(&self.means)
            .zip(&self.scales)
            .map(|((v, m), s)| (v - m) / s)
            .collect()
    }
}

/// Fitted tabular pipeline: encoder, scaler, and linear coefficients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabularPipeline {
    encoder: OneHotEncoder,
    scaler: StandardScaler,
    weights: Vec<f64>,
    intercept: f64,
}

impl TabularPipeline {
    /// Fit the full pipeline from flat sales rows
    pub fn fit(records: &[TrainingRecord]) -> Result<Self, ForecastError> {
        if records.is_empty() {
            return Err(ForecastError::TrainingInputEmpty);
        }

        let encoder = OneHotEncoder::fit(records.iter().map(|r| r.world.as_str()));

        let raw_rows: Vec<Vec<f64>> = records
            .iter()
            .map(|r| {
                let mut row = encoder.encode(&r.world);
                row.push(f64::from(r.item_id));
                row.push(r.timestamp as f64);
                row
            })
            .collect();

        let scaler = StandardScaler::fit(&raw_rows);
        let rows: Vec<Vec<f64>> = raw_rows.iter().map(|r| scaler.transform(r)).collect();
        let targets: Vec<f64> = records.iter().map(|r| r.price).collect();

        let (weights, intercept) = solve_least_squares(&rows, &targets);

        Ok(Self {
            encoder,
            scaler,
            weights,
            intercept,
        })
    }

    /// Predict a price for one feature row, in original price units
    pub fn predict_row(&self, row: &FeatureRow) -> f64 {
        let mut raw = self.encoder.encode(&row.world);
        raw.push(row.item_id);
        raw.push(row.timestamp);

        let scaled = self.scaler.transform(&raw);
        self.weights
            .iter()
            .zip(&scaled)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept
    }
}

/// Solve min ||Xw - y||^2 via the normal equations with a tiny ridge term
///
/// Returns the column weights and the intercept.
fn solve_least_squares(rows: &[Vec<f64>], targets: &[f64]) -> (Vec<f64>, f64) {
    let cols = rows.first().map(Vec::len).unwrap_or(0);
    let dims = cols + 1; // trailing intercept column of ones

    // Build X^T X and X^T y over the augmented matrix
    let mut xtx = vec![vec![0.0; dims]; dims];
    let mut xty = vec![0.0; dims];
    for (row, y) in rows.iter().zip(targets) {
        for i in 0..dims {
            let xi = if i < cols { row[i] } else { 1.0 };
            xty[i] += xi * y;
            for j in i..dims {
                let xj = if j < cols { row[j] } else { 1.0 };
                xtx[i][j] += xi * xj;
            }
        }
    }
    for i in 0..dims {
        for j in 0..i {
            xtx[i][j] = xtx[j][i];
        }
        xtx[i][i] += RIDGE_EPSILON;
    }

    let solution = gaussian_elimination(&mut xtx, &mut xty);
    let intercept = solution[cols];
    (solution[..cols].to_vec(), intercept)
}

/// In-place Gaussian elimination with partial pivoting
///
/// The ridge term makes the system positive definite, so a usable pivot
/// always exists.
fn gaussian_elimination(a: &mut [Vec<f64>], b: &mut [f64]) -> Vec<f64> {
    let n = b.len();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&x, &y| a[x][col].abs().total_cmp(&a[y][col].abs()))
            .unwrap_or(col);
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        let pivot = a[col].clone();
        let pivot_b = b[col];
        for row in col + 1..n {
            let factor = a[row][col] / pivot[col];
            for k in col..n {
                a[row][k] -= factor * pivot[k];
            }
            b[row] -= factor * pivot_b;
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut sum = b[row];
        for k in row + 1..n {
            sum -= a[row][k] * x[k];
        }
        x[row] = sum / a[row][row];
    }
    x
}

/// Forecaster backed by the linear pipeline, retrained from scratch each fit
pub struct TabularForecaster {
    store: Arc<ArtifactStore>,
}

impl TabularForecaster {
    /// Create a forecaster persisting into the given store
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self { store }
    }

    /// Flatten sale histories into training rows
    pub fn training_records(histories: &[SaleHistory]) -> Vec<TrainingRecord> {
        histories
            .iter()
            .flat_map(|h| {
                h.points.iter().map(|p| TrainingRecord {
                    item_id: h.item_id,
                    world: h.world.clone(),
                    timestamp: p.timestamp.timestamp(),
                    price: p.price.to_f64().unwrap_or(0.0),
                })
            })
            .collect()
    }
}

impl Forecaster for TabularForecaster {
    fn name(&self) -> &'static str {
        "tabular"
    }

    fn fit(&self, histories: &[SaleHistory]) -> Result<FitSummary, ForecastError> {
        let records = Self::training_records(histories);

        let path = self.store.tabular_path();
        let lock = self.store.slot_lock(&path);
        let _guard = lock.lock().expect("tabular artifact lock poisoned");

        let pipeline = TabularPipeline::fit(&records)?;
        self.store.save_tabular(&pipeline)?;

        tracing::info!(rows = records.len(), "Trained tabular pipeline");
        Ok(FitSummary {
            strategy: "tabular",
            samples: records.len(),
            updated: false,
        })
    }

    fn predict(&self, history: &SaleHistory) -> Result<Prediction, ForecastError> {
        let pipeline = self.store.load_tabular()?;

        // No rows means no last-known timestamp to extrapolate from
        let last = history
            .points
            .last()
            .ok_or(ForecastError::InsufficientData {
                observed: 0,
                required: 1,
            })?;

        let row = prepare_feature_row(last, &history.world, history.item_id);
        let price = pipeline.predict_row(&row);

        let price = Decimal::try_from(price).map_err(|_| ForecastError::NonFinitePrediction)?;
        Ok(Prediction::Price(price))
    }
}
