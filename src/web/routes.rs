//! Route definitions

use super::handlers;
use super::limiter;
use super::state::AppState;
use axum::{middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Service info
        .route("/", get(handlers::root))
        // Search endpoints
        .route("/search", get(handlers::search))
        .route("/news", get(handlers::news))
        .route("/images", get(handlers::images))
        .route("/videos", get(handlers::videos))
        .route("/mix", get(handlers::mix))
        .route("/suggest", get(handlers::suggest))
        // Operational endpoints
        .route("/healthz", get(handlers::healthz))
        .route("/stats", get(handlers::stats))
        // Middleware
        .layer(middleware::from_fn_with_state(
            state.clone(),
            limiter::rate_limit,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::network::HttpClient;
    use crate::providers::ProviderLoader;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_state(limiter: bool) -> AppState {
        let mut settings = Settings::default();
        settings.server.limiter = limiter;
        settings.server.rate_limit_per_minute = 2;
        let registry = ProviderLoader::load(&settings).unwrap();
        AppState::new(settings, registry, HttpClient::new().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_healthz() {
        let app = create_router(test_state(false));
        let response = app
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_mix_without_query_is_rejected() {
        let app = create_router(test_state(false));
        let response = app
            .oneshot(Request::get("/mix").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_mix_with_unknown_category_is_rejected() {
        let app = create_router(test_state(false));
        let response = app
            .oneshot(
                Request::get("/mix?q=rust&categories=web,maps")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].as_str().unwrap().contains("maps"));
    }

    #[tokio::test]
    async fn test_search_with_oversized_limit_is_rejected() {
        let app = create_router(test_state(false));
        let response = app
            .oneshot(
                Request::get("/search?q=rust&limit=99")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rate_limiter_rejects_over_quota() {
        let app = create_router(test_state(true));

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(
                    Request::get("/healthz")
                        .header("x-forwarded-for", "203.0.113.7")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .oneshot(
                Request::get("/healthz")
                    .header("x-forwarded-for", "203.0.113.7")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
