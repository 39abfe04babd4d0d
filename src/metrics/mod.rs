//! Metrics collection
//!
//! Tracks per-provider fetch counts, latencies and error rates.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Rolling window size for response times
const TIMING_WINDOW: usize = 100;

/// Global metrics collector
pub struct Metrics {
    /// Total composite requests served
    pub total_requests: AtomicU64,
    /// Fetches per provider
    fetches: RwLock<HashMap<String, u64>>,
    /// Rolling response times per provider (ms)
    response_times: RwLock<HashMap<String, Vec<u64>>>,
    /// Error counts per provider
    errors: RwLock<HashMap<String, u64>>,
    /// Success counts per provider
    successes: RwLock<HashMap<String, u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            fetches: RwLock::new(HashMap::new()),
            response_times: RwLock::new(HashMap::new()),
            errors: RwLock::new(HashMap::new()),
            successes: RwLock::new(HashMap::new()),
        }
    }

    pub fn inc_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch(&self, provider: &str) {
        let mut fetches = self.fetches.write().unwrap();
        *fetches.entry(provider.to_string()).or_insert(0) += 1;
    }

    pub fn record_time(&self, provider: &str, time_ms: u64) {
        let mut times = self.response_times.write().unwrap();
        let entry = times.entry(provider.to_string()).or_default();
        if entry.len() >= TIMING_WINDOW {
            entry.remove(0);
        }
        entry.push(time_ms);
    }

    pub fn record_error(&self, provider: &str) {
        let mut errors = self.errors.write().unwrap();
        *errors.entry(provider.to_string()).or_insert(0) += 1;
    }

    pub fn record_success(&self, provider: &str) {
        let mut successes = self.successes.write().unwrap();
        *successes.entry(provider.to_string()).or_insert(0) += 1;
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Average response time over the rolling window
    pub fn avg_response_time(&self, provider: &str) -> Option<u64> {
        let times = self.response_times.read().unwrap();
        times.get(provider).and_then(|t| {
            if t.is_empty() {
                None
            } else {
                Some(t.iter().sum::<u64>() / t.len() as u64)
            }
        })
    }

    /// Success percentage for a provider
    pub fn reliability(&self, provider: &str) -> f64 {
        let errors = self.errors.read().unwrap();
        let successes = self.successes.read().unwrap();

        let error_count = *errors.get(provider).unwrap_or(&0);
        let success_count = *successes.get(provider).unwrap_or(&0);

        let total = error_count + success_count;
        if total == 0 {
            100.0
        } else {
            (success_count as f64 / total as f64) * 100.0
        }
    }

    /// Snapshot of all provider statistics
    pub fn provider_stats(&self) -> HashMap<String, ProviderStats> {
        let fetches = self.fetches.read().unwrap();
        let mut stats = HashMap::new();

        for provider in fetches.keys() {
            stats.insert(
                provider.clone(),
                ProviderStats {
                    fetches: *fetches.get(provider).unwrap_or(&0),
                    avg_response_time: self.avg_response_time(provider),
                    reliability: self.reliability(provider),
                },
            );
        }

        stats
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics for a single provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStats {
    pub fetches: u64,
    pub avg_response_time: Option<u64>,
    pub reliability: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_roundtrip() {
        let metrics = Metrics::new();

        metrics.inc_request();
        metrics.record_fetch("duckduckgo_web");
        metrics.record_time("duckduckgo_web", 120);
        metrics.record_success("duckduckgo_web");

        assert_eq!(metrics.total_requests(), 1);
        assert_eq!(metrics.avg_response_time("duckduckgo_web"), Some(120));
        assert_eq!(metrics.reliability("duckduckgo_web"), 100.0);
    }

    #[test]
    fn test_reliability_with_errors() {
        let metrics = Metrics::new();
        metrics.record_success("duckduckgo_news");
        metrics.record_error("duckduckgo_news");

        assert_eq!(metrics.reliability("duckduckgo_news"), 50.0);
    }
}
