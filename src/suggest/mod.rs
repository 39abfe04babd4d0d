//! Search suggestions
//!
//! Proxies the upstream autocomplete endpoint.

mod backends;

pub use backends::{get_backend, DuckDuckGo, SuggestBackend};

/// Maximum suggestions returned to the caller
pub const MAX_SUGGESTIONS: usize = 20;
