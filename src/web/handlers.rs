//! HTTP request handlers
//!
//! Thin parameter parsing and envelope shaping around the coordinator.
//! Validation failures become HTTP 400; upstream failures stay in-band
//! and never change the status code.

use super::state::AppState;
use crate::query::{Category, Freshness, Query as SearchQuery, SafeSearch, ValidationError};
use crate::results::{CategoryResult, CompositeResult, ProviderError, Record};
use crate::suggest::MAX_SUGGESTIONS;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Validation failure surfaced to the caller as HTTP 400
#[derive(Debug)]
pub struct ApiError(ValidationError);

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": self.0.to_string()})),
        )
            .into_response()
    }
}

/// Query parameters for single-category search endpoints
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Search query
    pub q: Option<String>,
    /// Result limit
    pub limit: Option<usize>,
    /// Page number
    pub page: Option<u32>,
    /// Region code like `us-en`
    pub region: Option<String>,
    /// Safe search level: off, moderate, strict
    pub safesearch: Option<String>,
    /// Only this domain
    pub site: Option<String>,
    /// Block this domain
    pub exclude_site: Option<String>,
    /// Freshness window like `7d`, `30d`, `1y`
    pub freshness: Option<String>,
}

/// Response envelope for single-category endpoints
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub query: String,
    pub count: usize,
    pub page: u32,
    pub per_page: usize,
    pub results: Vec<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProviderError>,
    pub took_ms: u64,
    pub source: String,
}

impl CategoryResponse {
    fn from_result(query: &SearchQuery, result: CategoryResult) -> Self {
        Self {
            query: query.text.clone(),
            count: result.records.len(),
            page: query.page,
            per_page: query.limit,
            results: result.records,
            error: result.error,
            took_ms: result.took_ms,
            source: result.source,
        }
    }
}

fn build_query(state: &AppState, params: &SearchParams) -> Result<SearchQuery, ApiError> {
    let text = params.q.clone().unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyQuery.into());
    }

    let search = &state.settings.search;
    let limit = params.limit.unwrap_or(search.default_limit);
    if limit == 0 || limit > search.max_limit {
        return Err(ValidationError::LimitOutOfRange(limit).into());
    }

    let mut query = SearchQuery::new(text)
        .with_limit(limit)
        .with_page(params.page.unwrap_or(1));

    if let Some(region) = params
        .region
        .clone()
        .or_else(|| search.default_region.clone())
    {
        query = query.with_region(region);
    }

    let safesearch = match params.safesearch.as_deref() {
        Some(level) => SafeSearch::from_str(level)?,
        None => search.default_safesearch,
    };
    query = query.with_safesearch(safesearch);

    if let Some(ref site) = params.site {
        query = query.with_site(site.clone());
    }
    if let Some(ref site) = params.exclude_site {
        query = query.with_exclude_site(site.clone());
    }
    if let Some(ref freshness) = params.freshness {
        query = query.with_freshness(Freshness::from_str(freshness)?);
    }

    query.validate()?;
    Ok(query)
}

async fn run_category(
    state: &AppState,
    params: &SearchParams,
    category: Category,
) -> Result<Json<CategoryResponse>, ApiError> {
    let query = build_query(state, params)?;
    let result = state.mixer.search_category(&query, category).await?;
    Ok(Json(CategoryResponse::from_result(&query, result)))
}

/// Web search handler
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<CategoryResponse>, ApiError> {
    run_category(&state, &params, Category::Web).await
}

/// News search handler
pub async fn news(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<CategoryResponse>, ApiError> {
    run_category(&state, &params, Category::News).await
}

/// Image search handler
pub async fn images(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<CategoryResponse>, ApiError> {
    run_category(&state, &params, Category::Images).await
}

/// Video search handler
pub async fn videos(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<CategoryResponse>, ApiError> {
    run_category(&state, &params, Category::Videos).await
}

/// Query parameters for the composite endpoint
#[derive(Debug, Default, Deserialize)]
pub struct MixParams {
    /// Search query
    pub q: Option<String>,
    /// Per-category result limit
    pub limit: Option<usize>,
    /// Comma-separated categories; defaults to the full repertoire
    pub categories: Option<String>,
}

/// Parse the categories parameter. Absent means the full enabled
/// repertoire; an explicitly empty list stays empty.
fn parse_categories(state: &AppState, raw: Option<&str>) -> Result<Vec<Category>, ApiError> {
    match raw {
        None => Ok(state.registry.categories()),
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Category::from_str(s).map_err(ApiError::from))
            .collect(),
    }
}

/// Composite search handler
pub async fn mix(
    State(state): State<AppState>,
    Query(params): Query<MixParams>,
) -> Result<Json<CompositeResult>, ApiError> {
    let text = params.q.clone().unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyQuery.into());
    }

    let search = &state.settings.search;
    let limit = params.limit.unwrap_or(search.mix_limit);
    if limit == 0 || limit > search.mix_max_limit {
        return Err(ValidationError::LimitOutOfRange(limit).into());
    }

    let categories = parse_categories(&state, params.categories.as_deref())?;

    let mut query = SearchQuery::new(text)
        .with_limit(limit)
        .with_safesearch(search.default_safesearch);
    if let Some(region) = search.default_region.clone() {
        query = query.with_region(region);
    }

    let composite = state.mixer.mix(&query, &categories).await?;
    Ok(Json(composite))
}

/// Query parameters for suggestions
#[derive(Debug, Default, Deserialize)]
pub struct SuggestParams {
    pub q: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub query: String,
    pub suggestions: Vec<String>,
}

/// Suggestion handler
pub async fn suggest(
    State(state): State<AppState>,
    Query(params): Query<SuggestParams>,
) -> Result<Json<SuggestResponse>, ApiError> {
    let text = params.q.clone().unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyQuery.into());
    }

    let key = format!(
        "{}|{}",
        text.to_lowercase(),
        params.region.as_deref().unwrap_or("")
    );
    if let Some(suggestions) = state.suggest_cache.get(&key).await {
        return Ok(Json(SuggestResponse {
            query: text,
            suggestions,
        }));
    }

    // Upstream suggestion failures degrade to an empty list
    let mut suggestions = state
        .suggest
        .suggest(&state.client, &text, params.region.as_deref())
        .await
        .unwrap_or_default();
    suggestions.truncate(MAX_SUGGESTIONS);

    state.suggest_cache.put(key, suggestions.clone()).await;

    Ok(Json(SuggestResponse {
        query: text,
        suggestions,
    }))
}

/// Service info handler
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "MixSearch",
        "version": crate::VERSION,
        "routes": ["/search", "/news", "/images", "/videos", "/suggest", "/mix"],
    }))
}

/// Health check handler
pub async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
    }))
}

/// Provider statistics handler
pub async fn stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "total_requests": state.metrics.total_requests(),
        "providers": state.metrics.provider_stats(),
    }))
}
