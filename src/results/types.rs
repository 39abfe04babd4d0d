//! Normalized record types

use serde::{Deserialize, Serialize};
use url::Url;

/// A single normalized search record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Result title
    pub title: String,
    /// Result URL (page URL; for images this is the hosting page)
    pub url: String,
    /// Content snippet or description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// Source host or publisher name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Category-specific extras, flattened into the record
    #[serde(flatten)]
    pub metadata: RecordMetadata,
}

impl Record {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: None,
            source: None,
            metadata: RecordMetadata::default(),
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Source host derived from the URL, if it parses
    pub fn host(&self) -> Option<String> {
        Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }

    /// Key used for deduplication: the image URL for image records,
    /// the canonical page URL otherwise.
    pub fn dedupe_key(&self) -> String {
        match self.metadata.image {
            Some(ref image) => canonical_url(image),
            None => canonical_url(&self.url),
        }
    }
}

/// Optional per-category extras carried on a record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Thumbnail URL (images, videos)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Full-size image URL (images)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Published date (news, videos)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    /// Duration (videos)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Publisher name (videos)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    /// View count (videos)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
}

/// Normalize a URL for deduplication: strip scheme, `www.`, query string,
/// fragment and trailing slash, then lowercase.
pub fn canonical_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or_default();
            let host = host.strip_prefix("www.").unwrap_or(host);
            let path = parsed.path().trim_end_matches('/');
            format!("{}{}", host, path).to_lowercase()
        }
        Err(_) => raw.trim_end_matches('/').to_lowercase(),
    }
}

/// Drop records whose dedupe key was already seen, keeping first occurrence
pub fn dedupe_records(records: Vec<Record>) -> Vec<Record> {
    let mut seen = std::collections::HashSet::new();
    records
        .into_iter()
        .filter(|r| {
            let key = r.dedupe_key();
            !key.is_empty() && seen.insert(key)
        })
        .collect()
}

/// Per-category failure tags, contained in the composite and never
/// escalated to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderError {
    Timeout,
    Network,
    Http(u16),
    Parse,
    RateLimited,
    AccessDenied,
    Unavailable,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "request timed out"),
            Self::Network => write!(f, "network error"),
            Self::Http(code) => write!(f, "upstream HTTP error: {}", code),
            Self::Parse => write!(f, "failed to parse upstream response"),
            Self::RateLimited => write!(f, "upstream rate limited"),
            Self::AccessDenied => write!(f, "upstream access denied"),
            Self::Unavailable => write!(f, "provider unavailable"),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    /// Classify a transport-level error the way the upstream surfaces it
    pub fn from_transport(err: &anyhow::Error) -> Self {
        let text = err.to_string();
        if text.contains("timed out") || text.contains("timeout") {
            Self::Timeout
        } else if text.contains("429") {
            Self::RateLimited
        } else if text.contains("403") {
            Self::AccessDenied
        } else {
            Self::Network
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_url() {
        assert_eq!(
            canonical_url("https://www.Example.com/Path/"),
            "example.com/path"
        );
        assert_eq!(
            canonical_url("http://example.com/path?utm=1#frag"),
            "example.com/path"
        );
        assert_eq!(canonical_url("not a url/"), "not a url");
    }

    #[test]
    fn test_dedupe_records() {
        let records = vec![
            Record::new("A", "https://example.com/a"),
            Record::new("A again", "http://www.example.com/a/"),
            Record::new("B", "https://example.com/b"),
        ];
        let deduped = dedupe_records(records);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].title, "A");
    }

    #[test]
    fn test_image_records_dedupe_on_image_url() {
        let mut first = Record::new("pic", "https://a.example/page1");
        first.metadata.image = Some("https://img.example/x.png".to_string());
        let mut second = Record::new("pic", "https://b.example/page2");
        second.metadata.image = Some("https://img.example/x.png".to_string());

        let deduped = dedupe_records(vec![first, second]);
        assert_eq!(deduped.len(), 1);
    }

    #[test]
    fn test_record_host() {
        let record = Record::new("t", "https://docs.rs/tokio");
        assert_eq!(record.host().as_deref(), Some("docs.rs"));
    }

    #[test]
    fn test_provider_error_serialization() {
        let json = serde_json::to_string(&ProviderError::Timeout).unwrap();
        assert_eq!(json, "\"timeout\"");
        let json = serde_json::to_string(&ProviderError::RateLimited).unwrap();
        assert_eq!(json, "\"rate_limited\"");
    }
}
