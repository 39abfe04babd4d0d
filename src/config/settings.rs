//! Settings structures for MixSearch configuration

use crate::query::{Category, SafeSearch};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main settings structure, loaded from settings.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub search: SearchSettings,
    pub outgoing: OutgoingSettings,
    pub cache: CacheSettings,
    pub providers: Vec<ProviderConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            search: SearchSettings::default(),
            outgoing: OutgoingSettings::default(),
            cache: CacheSettings::default(),
            providers: default_providers(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables (MIXSEARCH_* prefix)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("MIXSEARCH_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("MIXSEARCH_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Ok(val) = std::env::var("MIXSEARCH_BASE_URL") {
            self.server.base_url = Some(val);
        }
        if let Ok(val) = std::env::var("MIXSEARCH_LIMITER") {
            self.server.limiter = val.parse().unwrap_or(self.server.limiter);
        }
        if let Ok(val) = std::env::var("MIXSEARCH_CACHE_TTL") {
            if let Ok(ttl) = val.parse() {
                self.cache.ttl_seconds = ttl;
            }
        }
    }

    /// Get provider config for a category
    pub fn provider_for(&self, category: Category) -> Option<&ProviderConfig> {
        self.providers
            .iter()
            .find(|p| !p.disabled && p.category == category)
    }

    /// Categories with an enabled provider
    pub fn enabled_categories(&self) -> Vec<Category> {
        Category::all()
            .into_iter()
            .filter(|c| self.provider_for(*c).is_some())
            .collect()
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
    /// Base URL for the instance
    pub base_url: Option<String>,
    /// Enable per-IP rate limiting
    pub limiter: bool,
    /// Requests allowed per IP per minute
    pub rate_limit_per_minute: u32,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_address: "127.0.0.1".to_string(),
            base_url: None,
            limiter: true,
            rate_limit_per_minute: 60,
        }
    }
}

/// Search behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Default result limit for single-category endpoints
    pub default_limit: usize,
    /// Maximum result limit for single-category endpoints
    pub max_limit: usize,
    /// Default per-category limit on /mix
    pub mix_limit: usize,
    /// Maximum per-category limit on /mix
    pub mix_max_limit: usize,
    /// Global ceiling for composite requests (seconds)
    pub ceiling_timeout: f64,
    /// Default safe search level
    pub default_safesearch: SafeSearch,
    /// Default region, none means worldwide
    pub default_region: Option<String>,
    /// Suggestion backend
    pub suggest_backend: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 50,
            mix_limit: 5,
            mix_max_limit: 20,
            ceiling_timeout: 15.0,
            default_safesearch: SafeSearch::Moderate,
            default_region: None,
            suggest_backend: "duckduckgo".to_string(),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Connection pool max idle per host
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 5.0,
            pool_maxsize: 20,
            verify_ssl: true,
            proxies: ProxySettings::default(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Result cache TTL in seconds
    pub ttl_seconds: u64,
    /// Result cache capacity
    pub max_capacity: u64,
    /// Upstream token cache TTL in seconds
    pub token_ttl_seconds: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: 60,
            max_capacity: 10_000,
            token_ttl_seconds: 600,
        }
    }
}

/// Individual provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider name (unique identifier)
    pub name: String,
    /// Backend family to use
    pub backend: String,
    /// Category this provider serves
    pub category: Category,
    /// Whether the provider is disabled
    pub disabled: bool,
    /// Custom timeout in seconds
    pub timeout: Option<f64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            backend: "duckduckgo".to_string(),
            category: Category::Web,
            disabled: false,
            timeout: None,
        }
    }
}

/// Default provider configurations: the full DuckDuckGo repertoire
fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig {
            name: "duckduckgo_web".to_string(),
            category: Category::Web,
            ..Default::default()
        },
        ProviderConfig {
            name: "duckduckgo_news".to_string(),
            category: Category::News,
            ..Default::default()
        },
        ProviderConfig {
            name: "duckduckgo_images".to_string(),
            category: Category::Images,
            ..Default::default()
        },
        ProviderConfig {
            name: "duckduckgo_videos".to_string(),
            category: Category::Videos,
            ..Default::default()
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.cache.ttl_seconds, 60);
        assert_eq!(settings.providers.len(), 4);
        assert_eq!(settings.enabled_categories(), Category::all().to_vec());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let yaml = r#"
server:
  port: 9000
  limiter: false
search:
  mix_limit: 8
cache:
  ttl_seconds: 120
providers:
  - name: duckduckgo_web
    backend: duckduckgo
    category: web
  - name: duckduckgo_news
    backend: duckduckgo
    category: news
    timeout: 3.5
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert!(!settings.server.limiter);
        assert_eq!(settings.search.mix_limit, 8);
        assert_eq!(settings.cache.ttl_seconds, 120);
        assert_eq!(settings.providers.len(), 2);
        assert_eq!(
            settings.provider_for(Category::News).unwrap().timeout,
            Some(3.5)
        );
        assert!(settings.provider_for(Category::Videos).is_none());
    }
}
