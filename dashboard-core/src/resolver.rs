//! Best-effort free-text location search.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{model::Location, provider::WeatherProvider};

/// Resolves queries to candidate places. Never fails: problems are logged and
/// produce an empty list, so typing into a search box cannot break anything.
#[derive(Debug, Clone, Default)]
pub struct LocationResolver {
    provider: Option<Arc<dyn WeatherProvider>>,
}

impl LocationResolver {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider: Some(provider) }
    }

    /// A resolver with no credential behind it; every search is empty.
    pub fn unconfigured() -> Self {
        Self { provider: None }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn search(&self, query: &str) -> Vec<Location> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let Some(provider) = &self.provider else {
            debug!(query, "location search skipped, no API key configured");
            return Vec::new();
        };

        match provider.search_locations(query).await {
            Ok(locations) => {
                debug!(query, count = locations.len(), "location search finished");
                locations
            }
            Err(err) => {
                warn!(query, error = %err, "location search failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeProvider;

    #[tokio::test]
    async fn blank_queries_do_not_reach_provider() {
        let provider = Arc::new(FakeProvider::default());
        let resolver = LocationResolver::new(provider.clone());

        assert!(resolver.search("").await.is_empty());
        assert!(resolver.search("   ").await.is_empty());
        assert_eq!(provider.search_calls(), 0);
    }

    #[tokio::test]
    async fn unconfigured_resolver_returns_nothing() {
        let resolver = LocationResolver::unconfigured();
        assert!(!resolver.is_configured());
        assert!(resolver.search("London").await.is_empty());
    }

    #[tokio::test]
    async fn provider_failures_become_empty_results() {
        let provider = Arc::new(FakeProvider::default().failing_search());
        let resolver = LocationResolver::new(provider.clone());

        assert!(resolver.search("London").await.is_empty());
        assert_eq!(provider.search_calls(), 1);
    }

    #[tokio::test]
    async fn passes_trimmed_query_through() {
        let provider = Arc::new(FakeProvider::default());
        let resolver = LocationResolver::new(provider.clone());

        let results = resolver.search("  London ").await;
        assert_eq!(results.len(), 1);
        assert_eq!(provider.last_query().as_deref(), Some("London"));
    }
}
