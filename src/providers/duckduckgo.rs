//! DuckDuckGo provider family
//!
//! Web search goes through the HTML endpoint; news, images and videos use
//! the JSON endpoints (`news.js`, `i.js`, `v.js`), which require a `vqd`
//! token scraped from the front page. Tokens are cached per normalized
//! query so a composite request pays the extra round trip at most once
//! per TTL.

use super::traits::{FetchParams, Provider, ProviderRequest};
use crate::cache::TokenCache;
use crate::network::{accept_html, HttpClient};
use crate::query::{Category, SafeSearch};
use crate::results::{ProviderError, Record};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

const FRONT_URL: &str = "https://duckduckgo.com";
const HTML_URL: &str = "https://html.duckduckgo.com/html/";

static VQD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"vqd=['"]?([\d-]+)['"]?"#).unwrap());

fn safesearch_param(level: SafeSearch) -> &'static str {
    match level {
        SafeSearch::Strict => "1",
        SafeSearch::Moderate => "-1",
        SafeSearch::Off => "-2",
    }
}

fn region_param(region: Option<&str>) -> String {
    region.unwrap_or("wt-wt").to_string()
}

/// Fetch the `vqd` request token for a query, going to the front page on
/// a token-cache miss.
async fn fetch_vqd(
    client: &HttpClient,
    front_url: &str,
    tokens: &TokenCache,
    query: &str,
) -> Result<String, ProviderError> {
    let cache_key = query.to_lowercase();
    if let Some(token) = tokens.get(&cache_key).await {
        return Ok(token);
    }

    let url = format!("{}/?q={}", front_url, urlencoding::encode(query));
    let response = client
        .get(&url)
        .await
        .map_err(|e| ProviderError::from_transport(&e))?;

    if !response.is_success() {
        return Err(response.error_tag());
    }

    let token = VQD_RE
        .captures(&response.text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or(ProviderError::Parse)?;

    debug!("fetched vqd token for '{}'", query);
    tokens.put(cache_key, token.clone()).await;
    Ok(token)
}

/// Execute a JSON endpoint request and pull out the `results` array
async fn fetch_results_array(
    client: &HttpClient,
    request: ProviderRequest,
) -> Result<Vec<serde_json::Value>, ProviderError> {
    let response = client
        .execute(request)
        .await
        .map_err(|e| ProviderError::from_transport(&e))?;

    if !response.is_success() {
        return Err(response.error_tag());
    }

    let json: serde_json::Value = response.json().map_err(|_| ProviderError::Parse)?;
    let results = json
        .get("results")
        .and_then(|v| v.as_array())
        .ok_or(ProviderError::Parse)?;

    Ok(results.clone())
}

fn str_field(value: &serde_json::Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// DuckDuckGo web search via the HTML endpoint
pub struct DuckDuckGoWeb {
    html_url: String,
}

impl DuckDuckGoWeb {
    pub fn new() -> Self {
        Self {
            html_url: HTML_URL.to_string(),
        }
    }

    /// Point the provider at a different endpoint (tests)
    pub fn with_html_url(mut self, url: impl Into<String>) -> Self {
        self.html_url = url.into();
        self
    }

    fn parse_html(&self, html: &str) -> Vec<Record> {
        let document = Html::parse_document(html);
        let mut records = Vec::new();

        let result_selector = Selector::parse("div.result").unwrap();
        let title_selector = Selector::parse("a.result__a").unwrap();
        let snippet_selector = Selector::parse("a.result__snippet").unwrap();

        for element in document.select(&result_selector) {
            let title_elem = match element.select(&title_selector).next() {
                Some(t) => t,
                None => continue,
            };

            let title = title_elem.text().collect::<String>();
            let url = title_elem
                .value()
                .attr("href")
                .map(str::to_string)
                .unwrap_or_default();

            // Internal redirect links carry no usable target
            if title.is_empty() || url.is_empty() || url.contains("duckduckgo.com") {
                continue;
            }

            let mut record = Record::new(title, url);
            if let Some(snippet) = element
                .select(&snippet_selector)
                .next()
                .map(|s| s.text().collect::<String>())
            {
                record = record.with_snippet(snippet);
            }
            if let Some(host) = record.host() {
                record = record.with_source(host);
            }

            records.push(record);
        }

        records
    }
}

impl Default for DuckDuckGoWeb {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for DuckDuckGoWeb {
    fn name(&self) -> &str {
        "duckduckgo_web"
    }

    fn category(&self) -> Category {
        Category::Web
    }

    async fn fetch(
        &self,
        client: &HttpClient,
        params: &FetchParams,
    ) -> Result<Vec<Record>, ProviderError> {
        let mut form = HashMap::new();
        form.insert("q".to_string(), params.query.clone());
        form.insert("b".to_string(), String::new());
        form.insert("kl".to_string(), region_param(params.region.as_deref()));
        form.insert(
            "kp".to_string(),
            safesearch_param(params.safesearch).to_string(),
        );

        let request = ProviderRequest::post(&self.html_url)
            .header("Accept", accept_html())
            .form(form);

        let response = client
            .execute(request)
            .await
            .map_err(|e| ProviderError::from_transport(&e))?;

        if !response.is_success() {
            return Err(response.error_tag());
        }

        let mut records = self.parse_html(&response.text);
        records.truncate(params.count);
        Ok(records)
    }
}

/// DuckDuckGo news search via the `news.js` endpoint
pub struct DuckDuckGoNews {
    front_url: String,
    tokens: Arc<TokenCache>,
}

impl DuckDuckGoNews {
    pub fn new(tokens: Arc<TokenCache>) -> Self {
        Self {
            front_url: FRONT_URL.to_string(),
            tokens,
        }
    }

    pub fn with_front_url(mut self, url: impl Into<String>) -> Self {
        self.front_url = url.into();
        self
    }

    fn parse_results(results: &[serde_json::Value]) -> Vec<Record> {
        results
            .iter()
            .filter_map(|item| {
                let title = str_field(item, "title")?;
                let url = str_field(item, "url")?;
                let mut record = Record::new(title, url);
                if let Some(excerpt) = str_field(item, "excerpt") {
                    record = record.with_snippet(excerpt);
                }
                if let Some(source) = str_field(item, "source") {
                    record = record.with_source(source);
                }
                if let Some(epoch) = item.get("date").and_then(|v| v.as_i64()) {
                    record.metadata.published = chrono::DateTime::from_timestamp(epoch, 0)
                        .map(|dt| dt.to_rfc3339());
                }
                if let Some(image) = str_field(item, "image") {
                    record.metadata.thumbnail = Some(image);
                }
                Some(record)
            })
            .collect()
    }
}

#[async_trait]
impl Provider for DuckDuckGoNews {
    fn name(&self) -> &str {
        "duckduckgo_news"
    }

    fn category(&self) -> Category {
        Category::News
    }

    async fn fetch(
        &self,
        client: &HttpClient,
        params: &FetchParams,
    ) -> Result<Vec<Record>, ProviderError> {
        let vqd = fetch_vqd(client, &self.front_url, &self.tokens, &params.query).await?;

        let mut request = ProviderRequest::get(format!("{}/news.js", self.front_url))
            .param("q", params.query.as_str())
            .param("o", "json")
            .param("noamp", "1")
            .param("l", region_param(params.region.as_deref()))
            .param("p", safesearch_param(params.safesearch))
            .param("vqd", vqd);
        if let Some(freshness) = params.freshness {
            request = request.param("df", freshness.timelimit());
        }

        let results = fetch_results_array(client, request).await?;
        let mut records = Self::parse_results(&results);
        records.truncate(params.count);
        Ok(records)
    }
}

/// DuckDuckGo image search via the `i.js` endpoint
pub struct DuckDuckGoImages {
    front_url: String,
    tokens: Arc<TokenCache>,
}

impl DuckDuckGoImages {
    pub fn new(tokens: Arc<TokenCache>) -> Self {
        Self {
            front_url: FRONT_URL.to_string(),
            tokens,
        }
    }

    pub fn with_front_url(mut self, url: impl Into<String>) -> Self {
        self.front_url = url.into();
        self
    }

    fn parse_results(results: &[serde_json::Value]) -> Vec<Record> {
        results
            .iter()
            .filter_map(|item| {
                let title = str_field(item, "title")?;
                let image = str_field(item, "image")?;
                // "url" is the hosting page; fall back to the image itself
                let url = str_field(item, "url").unwrap_or_else(|| image.clone());
                let mut record = Record::new(title, url);
                record.metadata.image = Some(image);
                record.metadata.thumbnail = str_field(item, "thumbnail");
                if let Some(source) = str_field(item, "source") {
                    record = record.with_source(source);
                }
                Some(record)
            })
            .collect()
    }
}

#[async_trait]
impl Provider for DuckDuckGoImages {
    fn name(&self) -> &str {
        "duckduckgo_images"
    }

    fn category(&self) -> Category {
        Category::Images
    }

    async fn fetch(
        &self,
        client: &HttpClient,
        params: &FetchParams,
    ) -> Result<Vec<Record>, ProviderError> {
        let vqd = fetch_vqd(client, &self.front_url, &self.tokens, &params.query).await?;

        let request = ProviderRequest::get(format!("{}/i.js", self.front_url))
            .param("q", params.query.as_str())
            .param("o", "json")
            .param("l", region_param(params.region.as_deref()))
            .param("p", safesearch_param(params.safesearch))
            .param("vqd", vqd);

        let results = fetch_results_array(client, request).await?;
        let mut records = Self::parse_results(&results);
        records.truncate(params.count);
        Ok(records)
    }
}

/// DuckDuckGo video search via the `v.js` endpoint
pub struct DuckDuckGoVideos {
    front_url: String,
    tokens: Arc<TokenCache>,
}

impl DuckDuckGoVideos {
    pub fn new(tokens: Arc<TokenCache>) -> Self {
        Self {
            front_url: FRONT_URL.to_string(),
            tokens,
        }
    }

    pub fn with_front_url(mut self, url: impl Into<String>) -> Self {
        self.front_url = url.into();
        self
    }

    fn parse_results(results: &[serde_json::Value]) -> Vec<Record> {
        results
            .iter()
            .filter_map(|item| {
                let title = str_field(item, "title")?;
                let url = str_field(item, "content")?;
                let mut record = Record::new(title, url);
                if let Some(description) = str_field(item, "description") {
                    record = record.with_snippet(description);
                }
                record.metadata.duration = str_field(item, "duration");
                record.metadata.published = str_field(item, "published");
                record.metadata.publisher = str_field(item, "publisher");
                if let Some(publisher) = record.metadata.publisher.clone() {
                    record = record.with_source(publisher);
                }
                record.metadata.thumbnail = item
                    .get("images")
                    .and_then(|imgs| {
                        imgs.get("medium")
                            .or_else(|| imgs.get("small"))
                            .and_then(|v| v.as_str())
                    })
                    .map(str::to_string);
                record.metadata.views = item
                    .get("statistics")
                    .and_then(|s| s.get("viewCount"))
                    .and_then(|v| v.as_u64());
                Some(record)
            })
            .collect()
    }
}

#[async_trait]
impl Provider for DuckDuckGoVideos {
    fn name(&self) -> &str {
        "duckduckgo_videos"
    }

    fn category(&self) -> Category {
        Category::Videos
    }

    async fn fetch(
        &self,
        client: &HttpClient,
        params: &FetchParams,
    ) -> Result<Vec<Record>, ProviderError> {
        let vqd = fetch_vqd(client, &self.front_url, &self.tokens, &params.query).await?;

        let request = ProviderRequest::get(format!("{}/v.js", self.front_url))
            .param("q", params.query.as_str())
            .param("o", "json")
            .param("l", region_param(params.region.as_deref()))
            .param("p", safesearch_param(params.safesearch))
            .param("vqd", vqd);

        let results = fetch_results_array(client, request).await?;
        let mut records = Self::parse_results(&results);
        records.truncate(params.count);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RESULT_HTML: &str = r#"
        <div class="result">
          <a class="result__a" href="https://blog.example.com/rust">Rust post</a>
          <a class="result__snippet">A post about Rust.</a>
        </div>
        <div class="result">
          <a class="result__a" href="https://duckduckgo.com/internal">skip me</a>
        </div>
    "#;

    #[test]
    fn test_parse_web_html() {
        let web = DuckDuckGoWeb::new();
        let records = web.parse_html(RESULT_HTML);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Rust post");
        assert_eq!(records[0].url, "https://blog.example.com/rust");
        assert_eq!(records[0].snippet.as_deref(), Some("A post about Rust."));
        assert_eq!(records[0].source.as_deref(), Some("blog.example.com"));
    }

    #[test]
    fn test_parse_news_results() {
        let json: serde_json::Value = serde_json::json!({
            "results": [{
                "title": "Release",
                "url": "https://news.example.com/release",
                "excerpt": "New release out",
                "date": 1700000000,
                "source": "Example News",
                "image": "https://news.example.com/t.png"
            }]
        });
        let records =
            DuckDuckGoNews::parse_results(json["results"].as_array().unwrap());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source.as_deref(), Some("Example News"));
        assert!(records[0]
            .metadata
            .published
            .as_deref()
            .unwrap()
            .starts_with("2023-11-14"));
    }

    #[test]
    fn test_parse_video_results() {
        let json: serde_json::Value = serde_json::json!({
            "results": [{
                "title": "Talk",
                "content": "https://videos.example.com/talk",
                "description": "Conference talk",
                "duration": "31:12",
                "published": "2024-02-01T00:00:00",
                "publisher": "ConfTube",
                "images": {"medium": "https://videos.example.com/thumb.jpg"},
                "statistics": {"viewCount": 1234}
            }]
        });
        let records =
            DuckDuckGoVideos::parse_results(json["results"].as_array().unwrap());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].metadata.duration.as_deref(), Some("31:12"));
        assert_eq!(records[0].metadata.views, Some(1234));
        assert_eq!(
            records[0].metadata.thumbnail.as_deref(),
            Some("https://videos.example.com/thumb.jpg")
        );
    }

    #[tokio::test]
    async fn test_news_fetch_with_vqd_roundtrip() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("window.vqd='123-456';"),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/news.js"))
            .and(query_param("vqd", "123-456"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{
                    "title": "Hit",
                    "url": "https://news.example.com/hit",
                    "excerpt": "found it",
                    "date": 1700000000,
                    "source": "Example"
                }]
            })))
            .mount(&server)
            .await;

        let tokens = Arc::new(TokenCache::default());
        let news = DuckDuckGoNews::new(tokens.clone()).with_front_url(server.uri());
        let client = HttpClient::new().unwrap();
        let params = FetchParams {
            query: "rust".to_string(),
            count: 10,
            region: None,
            safesearch: SafeSearch::Moderate,
            freshness: None,
        };

        let records = news.fetch(&client, &params).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Hit");

        // Token is cached for the follow-up fetch
        assert_eq!(tokens.get("rust").await.as_deref(), Some("123-456"));
    }

    #[tokio::test]
    async fn test_upstream_429_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let news = DuckDuckGoNews::new(Arc::new(TokenCache::default()))
            .with_front_url(server.uri());
        let client = HttpClient::new().unwrap();
        let params = FetchParams {
            query: "rust".to_string(),
            count: 10,
            region: None,
            safesearch: SafeSearch::Moderate,
            freshness: None,
        };

        let err = news.fetch(&client, &params).await.unwrap_err();
        assert_eq!(err, ProviderError::RateLimited);
    }
}
