//! Composite assembly for fanned-out category results

use super::types::{ProviderError, Record};
use crate::query::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of one category fetch: a populated slot or an empty slot with
/// an error tag. A slot with an error never carries records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    /// Category this slot belongs to
    pub category: Category,
    /// Normalized records, ordered as returned upstream
    pub records: Vec<Record>,
    /// Failure tag when the fetch did not succeed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProviderError>,
    /// Fetch latency in milliseconds
    pub took_ms: u64,
    /// Upstream source name
    pub source: String,
}

impl CategoryResult {
    /// Successful fetch
    pub fn ok(
        category: Category,
        records: Vec<Record>,
        took_ms: u64,
        source: impl Into<String>,
    ) -> Self {
        Self {
            category,
            records,
            error: None,
            took_ms,
            source: source.into(),
        }
    }

    /// Failed fetch: empty record list plus the error tag
    pub fn failed(
        category: Category,
        error: ProviderError,
        took_ms: u64,
        source: impl Into<String>,
    ) -> Self {
        Self {
            category,
            records: Vec::new(),
            error: Some(error),
            took_ms,
            source: source.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }
}

/// The composite response: one slot per requested category, the original
/// query text, and the total record count. Always returned with success
/// semantics; per-category failure is signaled in-band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeResult {
    /// Original query text
    pub query: String,
    /// Total number of records across all categories
    pub count: usize,
    /// Overall latency in milliseconds
    pub took_ms: u64,
    /// One slot per requested category
    pub categories: BTreeMap<Category, CategoryResult>,
}

impl CompositeResult {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            count: 0,
            took_ms: 0,
            categories: BTreeMap::new(),
        }
    }

    /// Insert a category slot. Each category appears exactly once; a
    /// second insert for the same category replaces the slot and the
    /// count is adjusted accordingly.
    pub fn insert(&mut self, result: CategoryResult) {
        let added = result.count();
        if let Some(previous) = self.categories.insert(result.category, result) {
            self.count -= previous.count();
        }
        self.count += added;
    }

    pub fn get(&self, category: Category) -> Option<&CategoryResult> {
        self.categories.get(&category)
    }

    pub fn contains(&self, category: Category) -> bool {
        self.categories.contains_key(&category)
    }

    /// Number of category slots
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Categories whose fetch failed
    pub fn failed_categories(&self) -> Vec<Category> {
        self.categories
            .values()
            .filter(|r| !r.is_ok())
            .map(|r| r.category)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_slot_per_category() {
        let mut composite = CompositeResult::new("rust");
        composite.insert(CategoryResult::ok(
            Category::Web,
            vec![Record::new("a", "https://a.example")],
            12,
            "duckduckgo",
        ));
        composite.insert(CategoryResult::failed(
            Category::News,
            ProviderError::Timeout,
            5000,
            "duckduckgo",
        ));

        assert_eq!(composite.len(), 2);
        assert_eq!(composite.count, 1);
        assert!(composite.get(Category::News).unwrap().records.is_empty());
        assert_eq!(composite.failed_categories(), vec![Category::News]);
    }

    #[test]
    fn test_reinsert_replaces_slot() {
        let mut composite = CompositeResult::new("rust");
        composite.insert(CategoryResult::ok(
            Category::Web,
            vec![
                Record::new("a", "https://a.example"),
                Record::new("b", "https://b.example"),
            ],
            10,
            "duckduckgo",
        ));
        composite.insert(CategoryResult::ok(
            Category::Web,
            vec![Record::new("c", "https://c.example")],
            11,
            "duckduckgo",
        ));

        assert_eq!(composite.len(), 1);
        assert_eq!(composite.count, 1);
    }

    #[test]
    fn test_serializes_categories_by_name() {
        let mut composite = CompositeResult::new("rust");
        composite.insert(CategoryResult::ok(Category::Web, vec![], 1, "duckduckgo"));

        let json = serde_json::to_value(&composite).unwrap();
        assert!(json["categories"]["web"].is_object());
        assert_eq!(json["query"], "rust");
    }
}
