//! Market board data acquisition
//!
//! Fetches per-item sale histories from the marketplace history API and
//! shapes them into ordered price series for the forecasting core.

mod history;

pub use history::{MarketClient, MarketClientConfig};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One recorded sale: when it happened and at what unit price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    /// Time of sale
    pub timestamp: DateTime<Utc>,
    /// Unit price in gil
    pub price: Decimal,
}

/// Ordered sale history for one (world, item) pair
///
/// Points are sorted by timestamp ascending on construction; the API does not
/// guarantee order. The history is owned transiently by the caller for one
/// prediction request and never cached by the forecasting core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleHistory {
    /// World the sales happened on
    pub world: String,
    /// Marketplace item identifier
    pub item_id: u32,
    /// Sales, oldest first
    pub points: Vec<PricePoint>,
}

impl SaleHistory {
    /// Build a history, sorting sales oldest-first
    pub fn new(world: impl Into<String>, item_id: u32, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        Self {
            world: world.into(),
            item_id,
            points,
        }
    }

    /// Number of recorded sales
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether there are no recorded sales
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Prices as a flat f64 sequence for model math
    pub fn prices_f64(&self) -> Vec<f64> {
        self.points
            .iter()
            .map(|p| p.price.to_f64().unwrap_or(0.0))
            .collect()
    }

    /// Descriptive statistics over the history, `None` when empty
    pub fn stats(&self) -> Option<SeriesStats> {
        let current = self.points.last()?.price;
        let mut min = current;
        let mut max = current;
        for p in &self.points {
            if p.price < min {
                min = p.price;
            }
            if p.price > max {
                max = p.price;
            }
        }
        Some(SeriesStats { min, max, current })
    }
}

/// Min, max, and most recent price of one history, in gil
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub min: Decimal,
    pub max: Decimal,
    pub current: Decimal,
}

/// Trait for sale-history sources
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch the sale history for one (world, item) pair
    async fn fetch_history(&self, world: &str, item_id: u32) -> anyhow::Result<SaleHistory>;
}
