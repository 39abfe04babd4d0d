//! Provider trait and request/response types

use crate::network::HttpClient;
use crate::query::{Category, Freshness, Query, SafeSearch};
use crate::results::{ProviderError, Record};
use async_trait::async_trait;
use std::collections::HashMap;

/// Parameters handed to a provider for one fetch
#[derive(Debug, Clone)]
pub struct FetchParams {
    /// Effective search text (site filters already applied)
    pub query: String,
    /// Number of records wanted, offset included
    pub count: usize,
    /// Region code like `us-en`
    pub region: Option<String>,
    /// Safe search level
    pub safesearch: SafeSearch,
    /// Freshness window
    pub freshness: Option<Freshness>,
}

impl FetchParams {
    /// Build fetch parameters from a query, asking for enough records to
    /// cover the requested page.
    pub fn from_query(query: &Query) -> Self {
        Self {
            query: query.effective_text(),
            count: query.offset() + query.limit,
            region: query.filters.region.clone(),
            safesearch: query.filters.safesearch,
            freshness: query.filters.freshness,
        }
    }
}

/// One upstream collaborator, responsible for a single category. Each
/// provider is an opaque, independently failing unit of work; the
/// coordinator never retries it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name, also used as the source tag on results
    fn name(&self) -> &str;

    /// The category this provider serves
    fn category(&self) -> Category;

    /// Default timeout in seconds
    fn timeout(&self) -> f64 {
        5.0
    }

    /// Fetch an ordered list of normalized records
    async fn fetch(
        &self,
        client: &HttpClient,
        params: &FetchParams,
    ) -> Result<Vec<Record>, ProviderError>;
}

/// HTTP request a provider wants executed
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// URL to request
    pub url: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Query parameters
    pub params: HashMap<String, String>,
    /// POST body
    pub body: Option<RequestBody>,
}

impl ProviderRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            headers: HashMap::new(),
            params: HashMap::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Post,
            headers: HashMap::new(),
            params: HashMap::new(),
            body: None,
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set a form-urlencoded body
    pub fn form(mut self, data: HashMap<String, String>) -> Self {
        self.body = Some(RequestBody::Form(data));
        self
    }

    /// Set a JSON body
    pub fn json(mut self, data: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(data));
        self
    }
}

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Request body types
#[derive(Debug, Clone)]
pub enum RequestBody {
    Form(HashMap<String, String>),
    Json(serde_json::Value),
}

/// HTTP response handed back to the provider
#[derive(Debug)]
pub struct ProviderResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Response body as text
    pub text: String,
    /// Final URL after redirects
    pub url: String,
}

impl ProviderResponse {
    /// Parse the body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(serde_json::from_str(&self.text)?)
    }

    /// Whether the response is a 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    /// Map a non-success status to the matching failure tag
    pub fn error_tag(&self) -> ProviderError {
        match self.status {
            429 => ProviderError::RateLimited,
            403 => ProviderError::AccessDenied,
            code => ProviderError::Http(code),
        }
    }
}
