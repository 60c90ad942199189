//! Static fallback store
//!
//! Read-only lookup of canned district records by category. Used when an AI
//! call fails and for categories that never need one. Built once at startup
//! and shared as `Arc<FallbackStore>`.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::info;

use crate::models::{Listing, MarketItem, Place, PlaceCategory, Record, Train};

pub const TRAINS: &str = "trains";
pub const MARKET_PRICE: &str = "market_price";
pub const PLACES: &str = "places";

const EMBEDDED_DATASET: &str = include_str!("../data/rajbari.json");

/// On-disk layout of the dataset
#[derive(Debug, Default, Deserialize)]
pub struct FallbackDataset {
    #[serde(default)]
    pub trains: Vec<Train>,
    #[serde(default)]
    pub market_price: Vec<MarketItem>,
    #[serde(default)]
    pub places: Vec<Place>,
    /// Every other key is a directory category of plain listings
    #[serde(flatten)]
    pub directories: BTreeMap<String, Vec<Listing>>,
}

#[derive(Debug, Default)]
pub struct FallbackStore {
    categories: BTreeMap<String, Vec<Record>>,
}

impl FallbackStore {
    /// The dataset compiled into the binary
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_DATASET).context("Embedded fallback dataset is invalid")
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fallback dataset {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("Failed to load fallback dataset {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let dataset: FallbackDataset =
            serde_json::from_str(raw).context("Fallback dataset is not valid JSON")?;
        Self::from_dataset(dataset)
    }

    /// Build the store, rejecting empty or duplicate ids within a category
    pub fn from_dataset(dataset: FallbackDataset) -> Result<Self> {
        let mut categories: BTreeMap<String, Vec<Record>> = BTreeMap::new();
        categories.insert(
            TRAINS.to_string(),
            dataset.trains.into_iter().map(Record::Train).collect(),
        );
        categories.insert(
            MARKET_PRICE.to_string(),
            dataset.market_price.into_iter().map(Record::Market).collect(),
        );
        categories.insert(
            PLACES.to_string(),
            dataset.places.into_iter().map(Record::Place).collect(),
        );
        for (name, listings) in dataset.directories {
            categories.insert(name, listings.into_iter().map(Record::Listing).collect());
        }

        for (name, records) in &categories {
            check_identities(name, records)?;
        }

        let total: usize = categories.values().map(Vec::len).sum();
        info!(
            "Loaded fallback dataset: {} categories, {} records",
            categories.len(),
            total
        );
        Ok(Self { categories })
    }

    /// Records of a category; unknown keys yield an empty slice
    #[must_use]
    pub fn category(&self, key: &str) -> &[Record] {
        self.categories.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Known category keys, sorted
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        self.categories.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn trains(&self) -> Vec<&Train> {
        self.category(TRAINS)
            .iter()
            .filter_map(|r| match r {
                Record::Train(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn train(&self, id: &str) -> Option<&Train> {
        self.trains().into_iter().find(|t| t.id == id)
    }

    #[must_use]
    pub fn market_items(&self) -> Vec<MarketItem> {
        self.category(MARKET_PRICE)
            .iter()
            .filter_map(|r| match r {
                Record::Market(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    /// Static map places, optionally restricted to one category
    #[must_use]
    pub fn places(&self, category: Option<PlaceCategory>) -> Vec<Place> {
        self.category(PLACES)
            .iter()
            .filter_map(|r| match r {
                Record::Place(p) if category.is_none_or(|c| p.category == c) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }
}

fn check_identities(category: &str, records: &[Record]) -> Result<()> {
    let mut seen = HashSet::new();
    for record in records {
        let id = record.id();
        if id.trim().is_empty() {
            bail!("Category '{}' contains a record without an id", category);
        }
        if !seen.insert(id) {
            bail!("Category '{}' contains duplicate id '{}'", category, id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_dataset_loads() {
        let store = FallbackStore::embedded().unwrap();
        assert!(!store.trains().is_empty());
        assert!(!store.market_items().is_empty());
        assert!(store.categories().contains(&"hospitals"));
        assert!(store.category(TRAINS).iter().all(|r| !r.id().is_empty()));
    }

    #[test]
    fn test_unknown_category_is_empty() {
        let store = FallbackStore::embedded().unwrap();
        assert!(store.category("no_such_category").is_empty());
    }

    #[test]
    fn test_fixture_substitution() {
        let store = FallbackStore::from_json(
            r#"{
                "market_price": [{ "id": "x", "name": "চাল", "unit": "কেজি", "priceRange": "৫০" }],
                "schools": [{ "id": "s-1", "name": "রাজবাড়ী সরকারি উচ্চ বিদ্যালয়" }]
            }"#,
        )
        .unwrap();

        assert_eq!(store.market_items().len(), 1);
        assert!(store.trains().is_empty());
        assert_eq!(store.category("schools").len(), 1);
        assert_eq!(store.category("schools")[0].id(), "s-1");
    }

    #[test]
    fn test_train_lookup() {
        let store = FallbackStore::embedded().unwrap();
        let train = store.train("725").unwrap();
        assert!(train.stations().contains(&"রাজবাড়ী"));
        assert!(store.train("0000").is_none());
    }

    #[test]
    fn test_places_filter() {
        let store = FallbackStore::embedded().unwrap();
        let police = store.places(Some(PlaceCategory::Police));
        assert!(!police.is_empty());
        assert!(police.iter().all(|p| p.category == PlaceCategory::Police));
        assert!(store.places(None).len() > police.len());
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let result = FallbackStore::from_json(
            r#"{ "police": [{ "id": "p", "name": "a" }, { "id": "p", "name": "b" }] }"#,
        );
        assert!(result.unwrap_err().to_string().contains("duplicate id"));
    }

    #[test]
    fn test_rejects_blank_ids() {
        let result = FallbackStore::from_json(
            r#"{ "market_price": [{ "name": "চাল", "unit": "কেজি", "priceRange": "৫০" }] }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = FallbackStore::from_path("/definitely/not/here.json");
        assert!(result.unwrap_err().to_string().contains("Failed to read"));
    }
}
