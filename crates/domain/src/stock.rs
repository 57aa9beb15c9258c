//! Read-only stock catalog.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::DomainError;
use crate::money::Money;

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    pub item_name: String,
    pub item_price: Money,
    pub stock: u32,
}

impl StockItem {
    pub fn new(item_name: impl Into<String>, item_price: Money, stock: u32) -> Self {
        Self {
            item_name: item_name.into(),
            item_price,
            stock,
        }
    }
}

/// Errors raised when building a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Two entries share a name.
    #[error("Duplicate catalog item: {0}")]
    DuplicateItem(String),

    /// An entry has a negative price.
    #[error("Invalid price for catalog item {item_name}: {price}")]
    NegativePrice { item_name: String, price: Money },
}

/// Immutable snapshot of the stock database, keyed by exact item name.
///
/// Entries keep their source order so callers can draw from them by index.
/// Safe to share across concurrent sagas behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct StockCatalog {
    items: Vec<StockItem>,
    index: HashMap<String, usize>,
}

impl StockCatalog {
    /// Builds a catalog, rejecting duplicate names and negative prices.
    pub fn new(items: Vec<StockItem>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            if item.item_price.is_negative() {
                return Err(CatalogError::NegativePrice {
                    item_name: item.item_name.clone(),
                    price: item.item_price,
                });
            }
            if index.insert(item.item_name.clone(), position).is_some() {
                return Err(CatalogError::DuplicateItem(item.item_name.clone()));
            }
        }
        Ok(Self { items, index })
    }

    /// Parses a JSON array of `{itemName, itemPrice, stock}` records.
    pub fn from_json_str(json: &str) -> Result<Self, DomainError> {
        let items: Vec<StockItem> = serde_json::from_str(json)?;
        Ok(Self::new(items)?)
    }

    /// Loads the catalog from a JSON file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| DomainError::Io {
                path: path.display().to_string(),
                source,
            })?;
        let catalog = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.display(), items = catalog.len(), "stock catalog loaded");
        Ok(catalog)
    }

    /// Looks up an item by exact name.
    pub fn get(&self, item_name: &str) -> Option<&StockItem> {
        self.index.get(item_name).map(|&i| &self.items[i])
    }

    pub fn contains(&self, item_name: &str) -> bool {
        self.index.contains_key(item_name)
    }

    /// Returns all entries in source order.
    pub fn items(&self) -> &[StockItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG_JSON: &str = r#"[
        {"itemName": "Widget", "itemPrice": 50, "stock": 10},
        {"itemName": "Gadget", "itemPrice": 24.99, "stock": 0}
    ]"#;

    #[test]
    fn test_lookup_by_exact_name() {
        let catalog = StockCatalog::from_json_str(CATALOG_JSON).unwrap();
        assert_eq!(catalog.len(), 2);

        let widget = catalog.get("Widget").unwrap();
        assert_eq!(widget.item_price, Money::from_dollars(50));
        assert_eq!(widget.stock, 10);
        assert_eq!(catalog.get("Gadget").unwrap().item_price.cents(), 2499);

        assert!(catalog.get("widget").is_none());
        assert!(catalog.get("Widget@@@").is_none());
    }

    #[test]
    fn test_items_keep_source_order() {
        let catalog = StockCatalog::from_json_str(CATALOG_JSON).unwrap();
        let names: Vec<_> = catalog.items().iter().map(|i| i.item_name.as_str()).collect();
        assert_eq!(names, ["Widget", "Gadget"]);
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let result = StockCatalog::new(vec![
            StockItem::new("Widget", Money::from_dollars(1), 1),
            StockItem::new("Widget", Money::from_dollars(2), 1),
        ]);
        assert_eq!(
            result.unwrap_err(),
            CatalogError::DuplicateItem("Widget".to_string())
        );
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let result = StockCatalog::from_json_str(r#"[{"itemName": "Widget"}]"#);
        assert!(matches!(result, Err(DomainError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stock_database.json");
        std::fs::write(&path, CATALOG_JSON).unwrap();

        let catalog = StockCatalog::load(&path).await.unwrap();
        assert!(catalog.contains("Gadget"));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = StockCatalog::load("/nonexistent/stock_database.json").await;
        assert!(matches!(result, Err(DomainError::Io { .. })));
    }
}
