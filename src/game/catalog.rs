//! Item Catalog: static lookup of item id to [`ItemDefinition`].
//!
//! Built once at startup from content (usually `data/items.json`) and then shared
//! read-only, typically behind an `Arc`. Lookups fail softly with `None`; an unknown id is
//! a content-authoring problem for the caller to log, never a fatal error.

use crate::game::errors::ProgressError;
use crate::game::types::ItemDefinition;
use log::warn;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Problem found by [`ItemCatalog::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogIssue {
    DuplicateId(String),
    EmptyId { name: String },
    MissingIcon { id: String },
}

#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    items: Vec<ItemDefinition>,
    lookup: HashMap<String, usize>,
}

impl ItemCatalog {
    /// Build a catalog from definitions. Entries with an empty id are not indexed; when an
    /// id repeats, the later definition wins.
    pub fn from_items(items: Vec<ItemDefinition>) -> Self {
        let mut lookup = HashMap::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if !item.id.is_empty() {
                lookup.insert(item.id.clone(), index);
            }
        }
        Self { items, lookup }
    }

    /// Parse a JSON array of item definitions.
    pub fn from_json_str(json: &str) -> Result<Self, ProgressError> {
        let items: Vec<ItemDefinition> = serde_json::from_str(json)
            .map_err(|e| ProgressError::Catalog(format!("invalid item content: {}", e)))?;
        Ok(Self::from_items(items))
    }

    /// Load item content from a JSON file such as `data/items.json`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ProgressError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let items: Vec<ItemDefinition> = serde_json::from_str(&contents).map_err(|e| {
            ProgressError::Catalog(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        Ok(Self::from_items(items))
    }

    pub fn lookup(&self, id: &str) -> Option<&ItemDefinition> {
        self.lookup.get(id).map(|&index| &self.items[index])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lookup.contains_key(id)
    }

    /// Display name for an id, falling back to the id itself.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.lookup(id).map(|item| item.name.as_str()).unwrap_or(id)
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    /// Definitions filtered by the key-item flag, in content order.
    pub fn items_by_category(&self, key_items: bool) -> Vec<&ItemDefinition> {
        self.items
            .iter()
            .filter(|item| item.is_key_item == key_items)
            .collect()
    }

    /// Tooling pass: report duplicate ids, empty ids and missing icons. Every issue is
    /// also logged as a warning; nothing is enforced at runtime.
    pub fn validate(&self) -> Vec<CatalogIssue> {
        let mut issues = Vec::new();
        let mut seen: HashMap<&str, usize> = HashMap::new();

        for item in &self.items {
            if item.id.is_empty() {
                warn!("item with empty id: {}", item.name);
                issues.push(CatalogIssue::EmptyId {
                    name: item.name.clone(),
                });
                continue;
            }

            let count = seen.entry(item.id.as_str()).or_insert(0);
            *count += 1;
            if *count == 2 {
                warn!("duplicate item id found: {}", item.id);
                issues.push(CatalogIssue::DuplicateId(item.id.clone()));
            }

            if item.icon.as_deref().map_or(true, str::is_empty) {
                warn!("item missing icon: {} ({})", item.name, item.id);
                issues.push(CatalogIssue::MissingIcon {
                    id: item.id.clone(),
                });
            }
        }

        issues
    }
}
