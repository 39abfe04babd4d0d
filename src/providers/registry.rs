//! Provider registry, one provider per category

use super::traits::Provider;
use crate::query::Category;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry mapping categories to their provider
pub struct ProviderRegistry {
    providers: HashMap<Category, Arc<dyn Provider>>,
    timeouts: HashMap<Category, f64>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            timeouts: HashMap::new(),
        }
    }

    /// Register a provider for its category. A later registration for the
    /// same category replaces the earlier one.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        self.providers.insert(provider.category(), provider);
    }

    /// Register with a configured timeout override (seconds)
    pub fn register_with_timeout(&mut self, provider: Arc<dyn Provider>, timeout: Option<f64>) {
        if let Some(timeout) = timeout {
            self.timeouts.insert(provider.category(), timeout);
        }
        self.register(provider);
    }

    pub fn get(&self, category: Category) -> Option<&Arc<dyn Provider>> {
        self.providers.get(&category)
    }

    pub fn contains(&self, category: Category) -> bool {
        self.providers.contains_key(&category)
    }

    /// Registered categories, in canonical order
    pub fn categories(&self) -> Vec<Category> {
        Category::all()
            .into_iter()
            .filter(|c| self.providers.contains_key(c))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Effective timeout for a category: config override, then the
    /// provider default, then the supplied fallback.
    pub fn timeout(&self, category: Category, fallback: f64) -> f64 {
        self.timeouts
            .get(&category)
            .copied()
            .or_else(|| self.providers.get(&category).map(|p| p.timeout()))
            .unwrap_or(fallback)
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
