//! MixSearch: a multi-category search aggregation service
//!
//! Fans one query out to independent category providers (web, news,
//! images, videos) concurrently, tolerates partial upstream failure, and
//! assembles a single composite response for language-model
//! applications.

pub mod cache;
pub mod config;
pub mod metrics;
pub mod mix;
pub mod network;
pub mod providers;
pub mod query;
pub mod results;
pub mod suggest;
pub mod web;

pub use config::Settings;
pub use mix::Mixer;
pub use providers::Provider;
pub use query::{Category, Query};
pub use results::{CategoryResult, CompositeResult, Record};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timeout for provider fetches in seconds
pub const DEFAULT_TIMEOUT: u64 = 5;

/// Default ceiling for a whole composite request in seconds
pub const MAX_TIMEOUT: u64 = 15;
