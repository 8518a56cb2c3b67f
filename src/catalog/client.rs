//! Item API client for catalog refresh
//!
//! Walks the paginated item listing (`/Item?page=N`) following the
//! `Pagination.PageNext` cursor until it runs out, accumulating the
//! name-to-id map.

use super::ItemCatalog;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Public item API base URL
pub const ITEM_API_URL: &str = "https://xivapi.com";

/// Configuration for the catalog client
#[derive(Debug, Clone)]
pub struct CatalogClientConfig {
    /// Base URL for the item API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Delay between page fetches
    pub page_delay: Duration,
}

impl Default for CatalogClientConfig {
    fn default() -> Self {
        Self {
            base_url: ITEM_API_URL.to_string(),
            timeout: Duration::from_secs(10),
            page_delay: Duration::from_millis(100),
        }
    }
}

/// Client for the paginated item API
pub struct CatalogClient {
    config: CatalogClientConfig,
    client: Client,
}

impl CatalogClient {
    /// Create a client with default configuration
    pub fn new() -> Self {
        Self::with_config(CatalogClientConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: CatalogClientConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Fetch the full item catalog, page by page
    pub async fn fetch_catalog(&self) -> anyhow::Result<ItemCatalog> {
        let mut items = BTreeMap::new();
        let mut page: u32 = 1;

        tracing::info!("Fetching item catalog");

        loop {
            let response = self.fetch_page(page).await?;

            for item in response.results {
                if let (Some(name), Some(id)) = (item.name, item.id) {
                    if !name.is_empty() {
                        items.insert(name, id);
                    }
                }
            }

            match response.pagination.page_next {
                Some(next) => {
                    tracing::debug!(page, items = items.len(), "Fetched catalog page");
                    page = next;
                    tokio::time::sleep(self.config.page_delay).await;
                }
                None => break,
            }
        }

        tracing::info!(items = items.len(), "Item catalog fetch complete");
        Ok(ItemCatalog::from_map(items))
    }

    async fn fetch_page(&self, page: u32) -> anyhow::Result<ItemPageResponse> {
        let url = format!("{}/Item", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("page", page.to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("Item API error on page {}: {}", page, status);
        }

        Ok(response.json().await?)
    }
}

impl Default for CatalogClient {
    fn default() -> Self {
        Self::new()
    }
}

/// One page of the item listing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemPageResponse {
    #[serde(default)]
    results: Vec<ItemResult>,
    #[serde(default)]
    pagination: Pagination,
}

/// One item row; the API nulls out names on some placeholder rows
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemResult {
    name: Option<String>,
    #[serde(rename = "ID")]
    id: Option<u32>,
}

/// Pagination cursor
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Pagination {
    page_next: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = CatalogClient::new();
        assert_eq!(client.config.base_url, ITEM_API_URL);
    }

    #[test]
    fn test_page_response_deserialize() {
        let json = r#"{
            "Results": [
                { "ID": 5106, "Name": "Copper Ore" },
                { "ID": 5111, "Name": "Iron Ore" },
                { "ID": 9999, "Name": null }
            ],
            "Pagination": { "Page": 1, "PageNext": 2, "PageTotal": 74 }
        }"#;

        let response: ItemPageResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.results.len(), 3);
        assert_eq!(response.results[0].id, Some(5106));
        assert!(response.results[2].name.is_none());
        assert_eq!(response.pagination.page_next, Some(2));
    }

    #[test]
    fn test_last_page_has_no_next() {
        let json = r#"{
            "Results": [],
            "Pagination": { "Page": 74, "PageNext": null }
        }"#;

        let response: ItemPageResponse = serde_json::from_str(json).unwrap();
        assert!(response.pagination.page_next.is_none());
    }
}
