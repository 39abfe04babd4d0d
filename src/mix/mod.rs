//! Composite search orchestration
//!
//! Fans one query out to the requested category providers concurrently,
//! bounds the join with per-category timeouts and a global ceiling, and
//! assembles a composite that tolerates partial upstream failure.

mod coordinator;

pub use coordinator::Mixer;
