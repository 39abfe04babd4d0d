//! Fan-out execution across category providers

use crate::cache::{category_cache_key, ResultCache};
use crate::metrics::Metrics;
use crate::network::HttpClient;
use crate::providers::{FetchParams, Provider, ProviderRegistry};
use crate::query::{Category, Query, ValidationError};
use crate::results::{dedupe_records, CategoryResult, CompositeResult, ProviderError, Record};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Coordinates concurrent fetches across category providers and
/// assembles the composite response.
///
/// Every requested category ends up with exactly one slot in the
/// composite: populated on success, empty with an error tag on provider
/// failure or timeout. Only validation failures cross this boundary as
/// errors.
pub struct Mixer {
    client: HttpClient,
    registry: Arc<ProviderRegistry>,
    cache: Arc<ResultCache>,
    metrics: Arc<Metrics>,
    /// Per-category timeout fallback
    default_timeout: Duration,
    /// Global ceiling for the whole join
    ceiling: Duration,
}

impl Mixer {
    pub fn new(
        client: HttpClient,
        registry: Arc<ProviderRegistry>,
        cache: Arc<ResultCache>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            client,
            registry,
            cache,
            metrics,
            default_timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT),
            ceiling: Duration::from_secs(crate::MAX_TIMEOUT),
        }
    }

    /// Set the per-category timeout fallback
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Set the global ceiling for composite requests
    pub fn with_ceiling(mut self, ceiling: Duration) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Fan a query out to the requested categories and join the results.
    ///
    /// Duplicate categories collapse to one fetch; an empty category set
    /// yields an empty composite without any dispatch. Fetches still
    /// pending at the ceiling are abandoned and reported as timeouts.
    pub async fn mix(
        &self,
        query: &Query,
        categories: &[Category],
    ) -> Result<CompositeResult, ValidationError> {
        query.validate()?;

        let requested: BTreeSet<Category> = categories.iter().copied().collect();

        // Reject unsupported categories before any dispatch
        let mut providers = Vec::with_capacity(requested.len());
        for &category in &requested {
            match self.registry.get(category) {
                Some(provider) => providers.push((category, provider.clone())),
                None => {
                    return Err(ValidationError::UnsupportedCategory(
                        category.to_string(),
                    ))
                }
            }
        }

        self.metrics.inc_request();

        let mut composite = CompositeResult::new(query.text.clone());
        if providers.is_empty() {
            return Ok(composite);
        }

        let start = Instant::now();
        info!(
            "mixing '{}' across {} categories",
            query.text,
            providers.len()
        );

        let mut pending: FuturesUnordered<_> = providers
            .iter()
            .map(|(category, provider)| self.fetch_category(*category, provider.clone(), query))
            .collect();

        // Join with a global ceiling: wait for all fetches or the
        // deadline, whichever comes first.
        let deadline = tokio::time::Instant::now() + self.ceiling;
        while !pending.is_empty() {
            match tokio::time::timeout_at(deadline, pending.next()).await {
                Ok(Some(result)) => composite.insert(result),
                Ok(None) => break,
                Err(_) => {
                    warn!("ceiling timeout reached for '{}'", query.text);
                    break;
                }
            }
        }
        // Fetches still in flight are dropped, not retried
        drop(pending);

        let ceiling_ms = self.ceiling.as_millis() as u64;
        for (category, provider) in providers {
            if !composite.contains(category) {
                self.metrics.record_error(provider.name());
                composite.insert(CategoryResult::failed(
                    category,
                    ProviderError::Timeout,
                    ceiling_ms,
                    provider.name(),
                ));
            }
        }

        composite.took_ms = start.elapsed().as_millis() as u64;
        Ok(composite)
    }

    /// Run a single category through the same cache/timeout/fetch path
    pub async fn search_category(
        &self,
        query: &Query,
        category: Category,
    ) -> Result<CategoryResult, ValidationError> {
        query.validate()?;

        let provider = self
            .registry
            .get(category)
            .cloned()
            .ok_or_else(|| ValidationError::UnsupportedCategory(category.to_string()))?;

        self.metrics.inc_request();
        Ok(self.fetch_category(category, provider, query).await)
    }

    /// One category fetch: cache lookup, bounded provider call, dedupe
    /// and page slicing. Never fails; failures become the slot's error
    /// tag.
    async fn fetch_category(
        &self,
        category: Category,
        provider: Arc<dyn Provider>,
        query: &Query,
    ) -> CategoryResult {
        let key = category_cache_key(query, category);
        if let Some(cached) = self.cache.get(&key).await {
            debug!("cache hit for {} '{}'", category, query.text);
            return cached;
        }

        let timeout_secs = self
            .registry
            .timeout(category, self.default_timeout.as_secs_f64());
        let per_timeout = Duration::from_secs_f64(timeout_secs);

        let params = FetchParams::from_query(query);
        self.metrics.record_fetch(provider.name());

        let start = Instant::now();
        let outcome = tokio::time::timeout(per_timeout, provider.fetch(&self.client, &params)).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(records)) => {
                let records = dedupe_records(records);
                let page: Vec<Record> = records
                    .into_iter()
                    .skip(query.offset())
                    .take(query.limit)
                    .collect();

                debug!(
                    "{} returned {} records in {}ms",
                    provider.name(),
                    page.len(),
                    elapsed_ms
                );
                self.metrics.record_success(provider.name());
                self.metrics.record_time(provider.name(), elapsed_ms);

                let result = CategoryResult::ok(category, page, elapsed_ms, provider.name());
                self.cache.put(key, result.clone()).await;
                result
            }
            Ok(Err(error)) => {
                warn!("provider {} failed: {}", provider.name(), error);
                self.metrics.record_error(provider.name());
                CategoryResult::failed(category, error, elapsed_ms, provider.name())
            }
            Err(_) => {
                warn!(
                    "provider {} timed out after {:?}",
                    provider.name(),
                    per_timeout
                );
                self.metrics.record_error(provider.name());
                CategoryResult::failed(category, ProviderError::Timeout, elapsed_ms, provider.name())
            }
        }
    }
}
