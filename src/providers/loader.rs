//! Provider loader, building the registry from configuration

use super::duckduckgo::{DuckDuckGoImages, DuckDuckGoNews, DuckDuckGoVideos, DuckDuckGoWeb};
use super::registry::ProviderRegistry;
use super::traits::Provider;
use crate::cache::TokenCache;
use crate::config::{ProviderConfig, Settings};
use crate::query::Category;
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Loader for initializing providers from settings
pub struct ProviderLoader;

impl ProviderLoader {
    /// Build the registry from settings. Providers of the DuckDuckGo
    /// family share one token cache.
    pub fn load(settings: &Settings) -> Result<ProviderRegistry> {
        let tokens = Arc::new(TokenCache::new(settings.cache.token_ttl_seconds));
        let mut registry = ProviderRegistry::new();

        for config in &settings.providers {
            if config.disabled {
                info!("skipping disabled provider: {}", config.name);
                continue;
            }

            match Self::create_provider(config, tokens.clone()) {
                Ok(provider) => {
                    info!(
                        "loaded provider: {} ({})",
                        config.name,
                        provider.category()
                    );
                    registry.register_with_timeout(provider, config.timeout);
                }
                Err(e) => {
                    warn!("failed to load provider {}: {}", config.name, e);
                }
            }
        }

        info!("loaded {} providers", registry.len());
        Ok(registry)
    }

    fn create_provider(
        config: &ProviderConfig,
        tokens: Arc<TokenCache>,
    ) -> Result<Arc<dyn Provider>> {
        match config.backend.as_str() {
            "duckduckgo" => Ok(match config.category {
                Category::Web => Arc::new(DuckDuckGoWeb::new()),
                Category::News => Arc::new(DuckDuckGoNews::new(tokens)),
                Category::Images => Arc::new(DuckDuckGoImages::new(tokens)),
                Category::Videos => Arc::new(DuckDuckGoVideos::new(tokens)),
            }),
            other => Err(anyhow::anyhow!("unknown provider backend: {}", other)),
        }
    }

    /// Known provider backends
    pub fn available_backends() -> Vec<&'static str> {
        vec!["duckduckgo"]
    }
}
