//! HTTP networking module
//!
//! Provides the outbound HTTP client used by providers.

mod client;
mod user_agent;

pub use client::HttpClient;
pub use user_agent::{accept_html, accept_json, accept_language, generate_user_agent};
