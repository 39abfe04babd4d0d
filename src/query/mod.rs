//! Query model and validation
//!
//! A [`Query`] bundles the search text with its result limit, page and
//! filters. It is immutable once issued; the coordinator and providers
//! only read it. Validation happens up front, before any dispatch.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum result limit accepted per category
pub const MAX_LIMIT: usize = 50;

/// Search categories understood by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Web,
    News,
    Images,
    Videos,
}

impl Category {
    /// All categories, in canonical order
    pub fn all() -> [Category; 4] {
        [Self::Web, Self::News, Self::Images, Self::Videos]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::News => "news",
            Self::Images => "images",
            Self::Videos => "videos",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" => Ok(Self::Web),
            "news" => Ok(Self::News),
            "images" => Ok(Self::Images),
            "videos" => Ok(Self::Videos),
            other => Err(ValidationError::UnknownCategory(other.to_string())),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Safe search level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafeSearch {
    Off,
    #[default]
    Moderate,
    Strict,
}

impl SafeSearch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Moderate => "moderate",
            Self::Strict => "strict",
        }
    }
}

impl std::str::FromStr for SafeSearch {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "moderate" => Ok(Self::Moderate),
            "strict" => Ok(Self::Strict),
            other => Err(ValidationError::InvalidSafeSearch(other.to_string())),
        }
    }
}

/// Freshness window, written `<N><unit>` with unit one of `d w m y`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Freshness {
    pub count: u32,
    pub unit: FreshnessUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FreshnessUnit {
    Day,
    Week,
    Month,
    Year,
}

static FRESHNESS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)([dwmy])$").unwrap());

impl Freshness {
    /// Window size in days
    pub fn days(&self) -> u32 {
        let per_unit = match self.unit {
            FreshnessUnit::Day => 1,
            FreshnessUnit::Week => 7,
            FreshnessUnit::Month => 30,
            FreshnessUnit::Year => 365,
        };
        self.count * per_unit
    }

    /// Time-limit code used by the upstream API (`d`, `w`, `m`, `y`)
    pub fn timelimit(&self) -> &'static str {
        match self.unit {
            FreshnessUnit::Day => "d",
            FreshnessUnit::Week => "w",
            FreshnessUnit::Month => "m",
            FreshnessUnit::Year => "y",
        }
    }
}

impl std::str::FromStr for Freshness {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = FRESHNESS_RE
            .captures(s.trim())
            .ok_or_else(|| ValidationError::InvalidFreshness(s.to_string()))?;
        let count: u32 = caps[1]
            .parse()
            .map_err(|_| ValidationError::InvalidFreshness(s.to_string()))?;
        let unit = match &caps[2] {
            "d" => FreshnessUnit::Day,
            "w" => FreshnessUnit::Week,
            "m" => FreshnessUnit::Month,
            _ => FreshnessUnit::Year,
        };
        Ok(Self { count, unit })
    }
}

impl std::fmt::Display for Freshness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.count, self.timelimit())
    }
}

/// Optional filters applied to a query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryFilters {
    /// Region code like `us-en` or `de-de`
    pub region: Option<String>,
    /// Safe search level
    pub safesearch: SafeSearch,
    /// Restrict results to this domain
    pub site: Option<String>,
    /// Exclude results from this domain
    pub exclude_site: Option<String>,
    /// Freshness window (news only)
    pub freshness: Option<Freshness>,
}

/// A search query, immutable once issued
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// The search text
    pub text: String,
    /// Per-category result limit
    pub limit: usize,
    /// Page number (1-indexed)
    pub page: u32,
    /// Optional filters
    #[serde(default)]
    pub filters: QueryFilters,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: 10,
            page: 1,
            filters: QueryFilters::default(),
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.filters.region = Some(region.into());
        self
    }

    pub fn with_safesearch(mut self, level: SafeSearch) -> Self {
        self.filters.safesearch = level;
        self
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.filters.site = Some(site.into());
        self
    }

    pub fn with_exclude_site(mut self, site: impl Into<String>) -> Self {
        self.filters.exclude_site = Some(site.into());
        self
    }

    pub fn with_freshness(mut self, freshness: Freshness) -> Self {
        self.filters.freshness = Some(freshness);
        self
    }

    /// Check the query before any dispatch
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.text.trim().is_empty() {
            return Err(ValidationError::EmptyQuery);
        }
        if self.limit == 0 || self.limit > MAX_LIMIT {
            return Err(ValidationError::LimitOutOfRange(self.limit));
        }
        if self.page == 0 {
            return Err(ValidationError::PageOutOfRange(self.page));
        }
        Ok(())
    }

    /// Trimmed, whitespace-collapsed, lowercased text for cache keying
    pub fn normalized_text(&self) -> String {
        self.text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    /// Search text with site include/exclude filters applied
    pub fn effective_text(&self) -> String {
        let mut text = self.text.trim().to_string();
        if let Some(ref site) = self.filters.site {
            text.push_str(&format!(" site:{}", site));
        }
        if let Some(ref site) = self.filters.exclude_site {
            text.push_str(&format!(" -site:{}", site));
        }
        text
    }

    /// Result offset implied by the page number
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.limit
    }
}

/// Failures rejected before any provider dispatch
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("query must not be empty")]
    EmptyQuery,
    #[error("limit {0} out of range")]
    LimitOutOfRange(usize),
    #[error("page {0} must be >= 1")]
    PageOutOfRange(u32),
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("no provider registered for category: {0}")]
    UnsupportedCategory(String),
    #[error("invalid safesearch level: {0}")]
    InvalidSafeSearch(String),
    #[error("invalid freshness window: {0}")]
    InvalidFreshness(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_category_parsing() {
        assert_eq!(Category::from_str("web").unwrap(), Category::Web);
        assert_eq!(Category::from_str(" NEWS ").unwrap(), Category::News);
        assert!(matches!(
            Category::from_str("maps"),
            Err(ValidationError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_freshness_parsing() {
        let f = Freshness::from_str("7d").unwrap();
        assert_eq!(f.days(), 7);
        assert_eq!(f.timelimit(), "d");

        let f = Freshness::from_str("1y").unwrap();
        assert_eq!(f.days(), 365);

        assert!(Freshness::from_str("7 days").is_err());
        assert!(Freshness::from_str("d7").is_err());
    }

    #[test]
    fn test_query_validation() {
        assert!(Query::new("rust").validate().is_ok());
        assert_eq!(Query::new("   ").validate(), Err(ValidationError::EmptyQuery));
        assert_eq!(
            Query::new("rust").with_limit(0).validate(),
            Err(ValidationError::LimitOutOfRange(0))
        );
        assert_eq!(
            Query::new("rust").with_limit(51).validate(),
            Err(ValidationError::LimitOutOfRange(51))
        );
        assert_eq!(
            Query::new("rust").with_page(0).validate(),
            Err(ValidationError::PageOutOfRange(0))
        );
    }

    #[test]
    fn test_normalized_text() {
        let query = Query::new("  Rust   Async\tRuntime ");
        assert_eq!(query.normalized_text(), "rust async runtime");
    }

    #[test]
    fn test_effective_text_with_site_filters() {
        let query = Query::new("tokio tutorial")
            .with_site("docs.rs")
            .with_exclude_site("example.com");
        assert_eq!(
            query.effective_text(),
            "tokio tutorial site:docs.rs -site:example.com"
        );
    }

    #[test]
    fn test_offset() {
        assert_eq!(Query::new("q").with_limit(10).with_page(1).offset(), 0);
        assert_eq!(Query::new("q").with_limit(10).with_page(3).offset(), 20);
    }
}
