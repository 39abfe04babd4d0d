//! Application state shared across handlers

use crate::cache::{ResultCache, SuggestCache};
use crate::config::Settings;
use crate::metrics::Metrics;
use crate::mix::Mixer;
use crate::network::HttpClient;
use crate::providers::ProviderRegistry;
use crate::suggest::{self, SuggestBackend};
use crate::web::limiter::{self, IpRateLimiter};
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Provider registry
    pub registry: Arc<ProviderRegistry>,
    /// Fan-out coordinator
    pub mixer: Arc<Mixer>,
    /// Provider metrics
    pub metrics: Arc<Metrics>,
    /// Outbound HTTP client
    pub client: HttpClient,
    /// Suggestion backend
    pub suggest: Arc<dyn SuggestBackend>,
    /// Suggestion cache
    pub suggest_cache: Arc<SuggestCache>,
    /// Per-IP rate limiter
    pub limiter: Arc<IpRateLimiter>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        registry: ProviderRegistry,
        client: HttpClient,
    ) -> anyhow::Result<Self> {
        let settings = Arc::new(settings);
        let registry = Arc::new(registry);
        let metrics = Arc::new(Metrics::new());
        let cache = Arc::new(ResultCache::new(
            settings.cache.ttl_seconds,
            settings.cache.max_capacity,
        ));

        let mixer = Arc::new(
            Mixer::new(
                client.clone(),
                registry.clone(),
                cache,
                metrics.clone(),
            )
            .with_timeout(Duration::from_secs_f64(settings.outgoing.request_timeout))
            .with_ceiling(Duration::from_secs_f64(settings.search.ceiling_timeout)),
        );

        let suggest: Arc<dyn SuggestBackend> =
            match suggest::get_backend(&settings.search.suggest_backend) {
                Some(backend) => Arc::from(backend),
                None => Arc::new(suggest::DuckDuckGo::new()),
            };

        let limiter = limiter::build(settings.server.rate_limit_per_minute);

        Ok(Self {
            settings,
            registry,
            mixer,
            metrics,
            client,
            suggest,
            suggest_cache: Arc::new(SuggestCache::default()),
            limiter,
        })
    }
}
