//! Marketplace history API client
//!
//! Fetches recorded sales for one item on one world from the public
//! market board API (`/history/{world}/{itemId}`). Entries arrive in
//! whatever order the API feels like; [`SaleHistory`] sorts them.

use super::{MarketDataSource, PricePoint, SaleHistory};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

/// Public market board API base URL
pub const MARKET_API_URL: &str = "https://universalis.app/api/v2";

/// Configuration for the history client
#[derive(Debug, Clone)]
pub struct MarketClientConfig {
    /// Base URL for the history API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum sale entries to request per item
    pub max_entries: usize,
    /// Delay between requests when fetching many items
    pub fetch_delay: Duration,
}

impl Default for MarketClientConfig {
    fn default() -> Self {
        Self {
            base_url: MARKET_API_URL.to_string(),
            timeout: Duration::from_secs(10),
            max_entries: 300,
            fetch_delay: Duration::from_millis(50),
        }
    }
}

/// Client for the market board history API
pub struct MarketClient {
    config: MarketClientConfig,
    client: Client,
}

impl MarketClient {
    /// Create a client with default configuration
    pub fn new() -> Self {
        Self::with_config(MarketClientConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: MarketClientConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Fetch the sale history for one (world, item) pair
    pub async fn history(&self, world: &str, item_id: u32) -> anyhow::Result<SaleHistory> {
        let url = format!("{}/history/{}/{}", self.config.base_url, world, item_id);

        tracing::debug!(url = %url, "Fetching sale history");

        let response = self
            .client
            .get(&url)
            .query(&[("entries", self.config.max_entries.to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("History API error: {} - {}", status, body);
        }

        let history: HistoryResponse = response.json().await?;
        let points = convert_entries(history.entries);

        tracing::debug!(world, item_id, sales = points.len(), "Fetched sale history");

        Ok(SaleHistory::new(world, item_id, points))
    }

    /// Fetch histories for many items on one world, politely spaced
    pub async fn histories(
        &self,
        world: &str,
        item_ids: &[u32],
    ) -> anyhow::Result<Vec<SaleHistory>> {
        let mut out = Vec::with_capacity(item_ids.len());
        for (i, item_id) in item_ids.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.fetch_delay).await;
            }
            out.push(self.history(world, *item_id).await?);
        }
        Ok(out)
    }

    /// Number of recorded sales for one item, for choosing training items
    pub async fn sales_count(&self, world: &str, item_id: u32) -> anyhow::Result<usize> {
        let history = self.history(world, item_id).await?;
        Ok(history.len())
    }
}

impl Default for MarketClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataSource for MarketClient {
    async fn fetch_history(&self, world: &str, item_id: u32) -> anyhow::Result<SaleHistory> {
        self.history(world, item_id).await
    }
}

/// Raw history response from the market board API
#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    entries: Vec<SaleEntry>,
}

/// One raw sale entry
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaleEntry {
    /// Unix seconds of the sale
    timestamp: i64,
    /// Unit price in gil
    price_per_unit: i64,
    /// Units sold (unused by forecasting, kept for completeness)
    #[serde(default)]
    #[allow(dead_code)]
    quantity: i64,
    /// High-quality flag
    #[serde(default)]
    #[allow(dead_code)]
    hq: bool,
}

/// Convert raw entries, dropping any with an unrepresentable timestamp
fn convert_entries(entries: Vec<SaleEntry>) -> Vec<PricePoint> {
    entries
        .into_iter()
        .filter_map(|e| match DateTime::from_timestamp(e.timestamp, 0) {
            Some(timestamp) => Some(PricePoint {
                timestamp,
                price: Decimal::from(e.price_per_unit),
            }),
            None => {
                tracing::warn!(timestamp = e.timestamp, "Dropping sale with invalid timestamp");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_client_creation() {
        let client = MarketClient::new();
        assert_eq!(client.config.base_url, MARKET_API_URL);
        assert_eq!(client.config.max_entries, 300);
    }

    #[test]
    fn test_config_custom() {
        let config = MarketClientConfig {
            base_url: "https://test.example.com".to_string(),
            timeout: Duration::from_secs(30),
            max_entries: 50,
            fetch_delay: Duration::from_millis(10),
        };
        let client = MarketClient::with_config(config);
        assert_eq!(client.config.base_url, "https://test.example.com");
        assert_eq!(client.config.max_entries, 50);
    }

    #[test]
    fn test_history_response_deserialize() {
        let json = r#"{
            "itemID": 5057,
            "worldName": "Leviathan",
            "entries": [
                { "hq": false, "pricePerUnit": 120, "quantity": 5, "timestamp": 1700000200 },
                { "hq": true, "pricePerUnit": 100, "quantity": 1, "timestamp": 1700000100 }
            ]
        }"#;

        let response: HistoryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.entries.len(), 2);
        assert_eq!(response.entries[0].price_per_unit, 120);
        assert!(response.entries[1].hq);
    }

    #[test]
    fn test_history_response_missing_entries() {
        let response: HistoryResponse = serde_json::from_str(r#"{"itemID": 1}"#).unwrap();
        assert!(response.entries.is_empty());
    }

    #[test]
    fn test_convert_entries_sorted_downstream() {
        let entries = vec![
            SaleEntry {
                timestamp: 1_700_000_200,
                price_per_unit: 120,
                quantity: 5,
                hq: false,
            },
            SaleEntry {
                timestamp: 1_700_000_100,
                price_per_unit: 100,
                quantity: 1,
                hq: true,
            },
        ];

        let history = SaleHistory::new("Leviathan", 5057, convert_entries(entries));
        assert_eq!(history.points[0].price, dec!(100));
        assert_eq!(history.points[1].price, dec!(120));
    }

    #[test]
    fn test_convert_entries_drops_invalid_timestamp() {
        let entries = vec![SaleEntry {
            timestamp: i64::MAX,
            price_per_unit: 100,
            quantity: 1,
            hq: false,
        }];
        assert!(convert_entries(entries).is_empty());
    }
}
