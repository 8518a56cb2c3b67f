//! Series preparation: min-max scaling and sliding-window extraction
//!
//! Turns a raw ordered price sequence into normalized fixed-width training
//! examples for the sequence model, or a single feature row for the tabular
//! model.

use super::ForecastError;
use crate::market::PricePoint;
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Seconds added to the last observed sale to form the "next price" timestamp.
///
/// The prediction target is always "price one day after the last observed
/// sale", regardless of actual sale cadence.
pub const NEXT_SALE_OFFSET_DAYS: i64 = 1;

/// Min-max scaler fitted over one price sequence
///
/// Maps the fitted range onto `[0, 1]`. A series where every price is equal
/// has no range to scale by; such a scaler is flagged degenerate and maps
/// every input to `0.0` instead of dividing by zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: f64,
    max: f64,
    degenerate: bool,
}

impl MinMaxScaler {
    /// Fit a scaler over a price sequence
    pub fn fit(values: &[f64]) -> Result<Self, ForecastError> {
        if values.is_empty() {
            return Err(ForecastError::InsufficientData {
                observed: 0,
                required: 1,
            });
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values {
            min = min.min(*v);
            max = max.max(*v);
        }

        let degenerate = max <= min;
        if degenerate {
            tracing::debug!(value = min, "All prices identical, scaler is degenerate");
        }

        Ok(Self {
            min,
            max,
            degenerate,
        })
    }

    /// Scale a price into `[0, 1]`
    pub fn transform(&self, value: f64) -> f64 {
        if self.degenerate {
            0.0
        } else {
            (value - self.min) / (self.max - self.min)
        }
    }

    /// Map a normalized value back to price units
    ///
    /// Exact inverse of [`transform`](Self::transform) for non-degenerate
    /// scalers; a degenerate scaler maps everything back to its single
    /// fitted price.
    pub fn inverse(&self, value: f64) -> f64 {
        if self.degenerate {
            self.min
        } else {
            value * (self.max - self.min) + self.min
        }
    }

    /// Whether the fitted series had zero range (min == max)
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }
}

/// Normalized sliding windows plus the scaler that produced them
#[derive(Debug, Clone)]
pub struct WindowedSeries {
    /// Input windows, each exactly `window_size` normalized prices
    pub inputs: Vec<Vec<f64>>,
    /// Normalized price one past each window
    pub targets: Vec<f64>,
    /// Scaler fitted over the full source sequence
    pub scaler: MinMaxScaler,
}

/// Build overlapping training windows from one ordered price sequence
///
/// Produces `len - window_size` windows: window `i` covers positions
/// `[i, i + window_size)` and its target is the price at `i + window_size`,
/// all in normalized space. Returns [`ForecastError::InsufficientData`] when
/// the sequence is not strictly longer than the window.
pub fn prepare_windows(prices: &[f64], window_size: usize) -> Result<WindowedSeries, ForecastError> {
    if prices.len() <= window_size {
        return Err(ForecastError::InsufficientData {
            observed: prices.len(),
            required: window_size + 1,
        });
    }

    let scaler = MinMaxScaler::fit(prices)?;
    let scaled: Vec<f64> = prices.iter().map(|p| scaler.transform(*p)).collect();

    let (inputs, targets) = windows_of(&scaled, window_size);

    Ok(WindowedSeries {
        inputs,
        targets,
        scaler,
    })
}

/// Build training windows across several independent price sequences
///
/// The scaler is fitted over the concatenation of all sequences so every
/// window shares one normalization, but windows never straddle a sequence
/// boundary. Sequences too short to yield a window are skipped.
pub fn prepare_training_set(
    series_list: &[Vec<f64>],
    window_size: usize,
) -> Result<WindowedSeries, ForecastError> {
    let longest = series_list.iter().map(Vec::len).max().unwrap_or(0);
    if !series_list.iter().any(|s| s.len() > window_size) {
        return Err(ForecastError::InsufficientData {
            observed: longest,
            required: window_size + 1,
        });
    }

    let flat: Vec<f64> = series_list.iter().flatten().copied().collect();
    let scaler = MinMaxScaler::fit(&flat)?;

    let mut inputs = Vec::new();
    let mut targets = Vec::new();
    for series in series_list {
        if series.len() <= window_size {
            continue;
        }
        let scaled: Vec<f64> = series.iter().map(|p| scaler.transform(*p)).collect();
        let (mut i, mut t) = windows_of(&scaled, window_size);
        inputs.append(&mut i);
        targets.append(&mut t);
    }

    Ok(WindowedSeries {
        inputs,
        targets,
        scaler,
    })
}

fn windows_of(scaled: &[f64], window_size: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
    let count = scaled.len() - window_size;
    let mut inputs = Vec::with_capacity(count);
    let mut targets = Vec::with_capacity(count);
    for i in 0..count {
        inputs.push(scaled[i..i + window_size].to_vec());
        targets.push(scaled[i + window_size]);
    }
    (inputs, targets)
}

/// Single feature row for the tabular model's next-day prediction
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    /// Item identifier, passed through as a numeric feature
    pub item_id: f64,
    /// World the sale history came from
    pub world: String,
    /// Unix timestamp of the prediction target
    pub timestamp: f64,
}

/// Build the feature row for "price one day after the last observed sale"
pub fn prepare_feature_row(last: &PricePoint, world: &str, item_id: u32) -> FeatureRow {
    let next = last.timestamp + Duration::days(NEXT_SALE_OFFSET_DAYS);
    FeatureRow {
        item_id: f64::from(item_id),
        world: world.to_string(),
        timestamp: next.timestamp() as f64,
    }
}
