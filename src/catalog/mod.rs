//! Item catalog: display-name to item-id mapping
//!
//! Fetched page by page from the item API, persisted as JSON, and loaded
//! immutably at startup. The catalog is owned by the presentation layer and
//! passed explicitly; the forecasting core never sees it.

mod client;

pub use client::{CatalogClient, CatalogClientConfig};

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Immutable name-to-id lookup table
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    items: BTreeMap<String, u32>,
}

impl ItemCatalog {
    /// Build a catalog from a name-to-id map
    pub fn from_map(items: BTreeMap<String, u32>) -> Self {
        Self { items }
    }

    /// Load a catalog from its JSON file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let items: BTreeMap<String, u32> = serde_json::from_str(&content)?;
        tracing::info!(items = items.len(), path = %path.display(), "Loaded item catalog");
        Ok(Self { items })
    }

    /// Persist the catalog as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&self.items)?;
        fs::write(path, content)?;
        tracing::info!(items = self.items.len(), path = %path.display(), "Saved item catalog");
        Ok(())
    }

    /// Exact-name lookup
    pub fn get(&self, name: &str) -> Option<u32> {
        self.items.get(name).copied()
    }

    /// Case-insensitive substring search over item names
    pub fn search<'a>(&'a self, query: &str) -> impl Iterator<Item = (&'a str, u32)> + 'a {
        let query = query.to_lowercase();
        self.items
            .iter()
            .filter(move |(name, _)| name.to_lowercase().contains(&query))
            .map(|(name, id)| (name.as_str(), *id))
    }

    /// All item names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// Number of known items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ItemCatalog {
        let mut items = BTreeMap::new();
        items.insert("Copper Ore".to_string(), 5106);
        items.insert("Iron Ore".to_string(), 5111);
        items.insert("Mythril Ore".to_string(), 5114);
        ItemCatalog::from_map(items)
    }

    #[test]
    fn test_lookup() {
        let catalog = sample();
        assert_eq!(catalog.get("Iron Ore"), Some(5111));
        assert_eq!(catalog.get("iron ore"), None); // exact-name lookup
        assert_eq!(catalog.get("Adamantite"), None);
    }

    #[test]
    fn test_search_case_insensitive() {
        let catalog = sample();
        let hits: Vec<_> = catalog.search("ore").collect();
        assert_eq!(hits.len(), 3);

        let hits: Vec<_> = catalog.search("MYTHRIL").collect();
        assert_eq!(hits, vec![("Mythril Ore", 5114)]);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.json");

        let catalog = sample();
        catalog.save(&path).unwrap();

        let loaded = ItemCatalog::load(&path).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.get("Copper Ore"), Some(5106));
    }

    #[test]
    fn test_load_missing_file() {
        let result = ItemCatalog::load("/nonexistent/items.json");
        assert!(result.is_err());
    }
}
