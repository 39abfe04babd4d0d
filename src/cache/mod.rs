//! Caching for per-category results, upstream tokens and suggestions
//!
//! All caches are TTL-bounded and safe under concurrent access from
//! simultaneous composite requests. Last writer for a key wins; entries
//! are never served past their TTL. A cache problem of any kind is a
//! miss, never an error.

use crate::query::{Category, Query};
use crate::results::CategoryResult;
use moka::future::Cache;
use std::time::Duration;

/// Cache for per-category search results
pub struct ResultCache {
    cache: Cache<String, CategoryResult>,
}

impl ResultCache {
    /// Create a new result cache with the given TTL and capacity
    pub fn new(ttl_seconds: u64, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_seconds))
            .max_capacity(max_capacity)
            .build();

        Self { cache }
    }

    pub async fn get(&self, key: &str) -> Option<CategoryResult> {
        self.cache.get(key).await
    }

    pub async fn put(&self, key: String, value: CategoryResult) {
        self.cache.insert(key, value).await;
    }

    pub async fn remove(&self, key: &str) {
        self.cache.remove(key).await;
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    pub fn size(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(60, 10_000)
    }
}

/// Cache for upstream request tokens, keyed by normalized query text
pub struct TokenCache {
    cache: Cache<String, String>,
}

impl TokenCache {
    pub fn new(ttl_seconds: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_seconds))
            .max_capacity(1000)
            .build();

        Self { cache }
    }

    pub async fn get(&self, query: &str) -> Option<String> {
        self.cache.get(query).await
    }

    pub async fn put(&self, query: String, token: String) {
        self.cache.insert(query, token).await;
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new(600)
    }
}

/// Cache for suggestion lists
pub struct SuggestCache {
    cache: Cache<String, Vec<String>>,
}

impl SuggestCache {
    pub fn new(ttl_seconds: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_seconds))
            .max_capacity(5000)
            .build();

        Self { cache }
    }

    pub async fn get(&self, key: &str) -> Option<Vec<String>> {
        self.cache.get(key).await
    }

    pub async fn put(&self, key: String, suggestions: Vec<String>) {
        self.cache.insert(key, suggestions).await;
    }
}

impl Default for SuggestCache {
    fn default() -> Self {
        Self::new(60)
    }
}

/// Derive the cache key for one category fetch: a digest over the
/// category, the normalized query text and every parameter that changes
/// the upstream response.
pub fn category_cache_key(query: &Query, category: Category) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(category.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(query.normalized_text().as_bytes());
    hasher.update(b"|");
    hasher.update(query.limit.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(query.page.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(query.filters.region.as_deref().unwrap_or("").as_bytes());
    hasher.update(b"|");
    hasher.update(query.filters.safesearch.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(query.filters.site.as_deref().unwrap_or("").as_bytes());
    hasher.update(b"|");
    hasher.update(
        query
            .filters
            .exclude_site
            .as_deref()
            .unwrap_or("")
            .as_bytes(),
    );
    hasher.update(b"|");
    if let Some(freshness) = query.filters.freshness {
        hasher.update(freshness.to_string().as_bytes());
    }

    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::Record;

    #[tokio::test]
    async fn test_result_cache_roundtrip() {
        let cache = ResultCache::new(60, 100);
        let result = CategoryResult::ok(
            Category::Web,
            vec![Record::new("a", "https://a.example")],
            10,
            "duckduckgo",
        );
        cache.put("key".to_string(), result.clone()).await;

        assert_eq!(cache.get("key").await, Some(result));
        assert_eq!(cache.get("other").await, None);
    }

    #[test]
    fn test_cache_key_varies_by_category_and_params() {
        let query = Query::new("rust");
        let web = category_cache_key(&query, Category::Web);
        let news = category_cache_key(&query, Category::News);
        assert_ne!(web, news);

        let paged = category_cache_key(&query.clone().with_page(2), Category::Web);
        assert_ne!(web, paged);
    }

    #[test]
    fn test_cache_key_normalizes_text() {
        let a = category_cache_key(&Query::new("Rust  Async"), Category::Web);
        let b = category_cache_key(&Query::new("rust async"), Category::Web);
        assert_eq!(a, b);
    }
}
