//! Suggestion backend implementations

use crate::network::HttpClient;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Trait for suggestion backends
#[async_trait]
pub trait SuggestBackend: Send + Sync {
    /// Backend name
    fn name(&self) -> &str;

    /// Fetch suggestions for a query
    async fn suggest(
        &self,
        client: &HttpClient,
        query: &str,
        region: Option<&str>,
    ) -> Result<Vec<String>>;
}

/// Get a backend by name
pub fn get_backend(name: &str) -> Option<Box<dyn SuggestBackend>> {
    match name.to_lowercase().as_str() {
        "duckduckgo" | "ddg" => Some(Box::new(DuckDuckGo::new())),
        _ => None,
    }
}

/// DuckDuckGo suggestion backend
pub struct DuckDuckGo {
    base_url: String,
}

impl DuckDuckGo {
    pub fn new() -> Self {
        Self {
            base_url: "https://duckduckgo.com/ac/".to_string(),
        }
    }

    /// Point the backend at a different endpoint (tests)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

impl Default for DuckDuckGo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SuggestBackend for DuckDuckGo {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn suggest(
        &self,
        client: &HttpClient,
        query: &str,
        region: Option<&str>,
    ) -> Result<Vec<String>> {
        let mut params = HashMap::new();
        params.insert("q".to_string(), query.to_string());
        params.insert("type".to_string(), "list".to_string());
        if let Some(region) = region {
            params.insert("kl".to_string(), region.to_string());
        }

        let response = client.get_with_params(&self.base_url, params).await?;

        if !response.is_success() {
            return Ok(vec![]);
        }

        // Response shape: [query, [suggestions...]]
        let json: serde_json::Value = serde_json::from_str(&response.text)?;

        let suggestions = json
            .as_array()
            .and_then(|arr| arr.get(1))
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        Ok(suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_get_backend() {
        assert!(get_backend("duckduckgo").is_some());
        assert!(get_backend("ddg").is_some());
        assert!(get_backend("unknown").is_none());
    }

    #[tokio::test]
    async fn test_suggest_parses_list_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ac/"))
            .and(query_param("q", "rust"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                "rust",
                ["rust lang", "rust tutorial", "rust async"]
            ])))
            .mount(&server)
            .await;

        let backend = DuckDuckGo::new().with_base_url(format!("{}/ac/", server.uri()));
        let client = HttpClient::new().unwrap();

        let suggestions = backend.suggest(&client, "rust", None).await.unwrap();
        assert_eq!(suggestions.len(), 3);
        assert_eq!(suggestions[0], "rust lang");
    }

    #[tokio::test]
    async fn test_suggest_tolerates_upstream_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ac/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let backend = DuckDuckGo::new().with_base_url(format!("{}/ac/", server.uri()));
        let client = HttpClient::new().unwrap();

        let suggestions = backend.suggest(&client, "rust", None).await.unwrap();
        assert!(suggestions.is_empty());
    }
}
