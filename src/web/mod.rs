//! Web server module
//!
//! Provides the HTTP API surface for MixSearch.

mod handlers;
mod limiter;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
