//! MixSearch: a multi-category search aggregation service
//!
//! This is the main entry point for the application.

use anyhow::Result;
use mixsearch::{
    config::Settings,
    network::HttpClient,
    providers::ProviderLoader,
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mixsearch=info,tower_http=warn")),
        )
        .with_target(false)
        .init();

    info!("starting MixSearch v{}", mixsearch::VERSION);

    // Load configuration
    let settings = load_settings()?;

    // Initialize outbound HTTP client
    let client = HttpClient::with_settings(&settings.outgoing)?;

    // Load providers
    let registry = ProviderLoader::load(&settings)?;
    if registry.is_empty() {
        anyhow::bail!("no providers enabled, refusing to start");
    }

    // Create application state and router
    let addr = SocketAddr::new(settings.server.bind_address.parse()?, settings.server.port);
    let state = AppState::new(settings, registry, client)?;
    let app = create_router(state);

    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Load settings from file or use defaults
fn load_settings() -> Result<Settings> {
    let paths = [
        PathBuf::from("settings.yml"),
        PathBuf::from("config/settings.yml"),
        PathBuf::from("/etc/mixsearch/settings.yml"),
        dirs::config_dir()
            .map(|p| p.join("mixsearch/settings.yml"))
            .unwrap_or_default(),
    ];

    // Explicit path wins
    if let Ok(path) = std::env::var("MIXSEARCH_SETTINGS_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            info!("loading settings from: {}", path.display());
            let mut settings = Settings::from_file(&path)?;
            settings.merge_env();
            return Ok(settings);
        }
    }

    for path in paths.iter() {
        if path.exists() {
            info!("loading settings from: {}", path.display());
            let mut settings = Settings::from_file(path)?;
            settings.merge_env();
            return Ok(settings);
        }
    }

    info!("no settings file found, using defaults");
    let mut settings = Settings::default();
    settings.merge_env();
    Ok(settings)
}
