pub mod duckduckgo;

use crate::domain::search::{SearchResult, MAX_SEARCH_RESULTS};
use crate::error::SearchError;

#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn text_search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError>;
}

/// Search results plus the provider failure, if any, that emptied them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    pub warning: Option<SearchError>,
}

/// Runs `query` and never fails: provider errors degrade to an empty list and a warning. At most
/// three results are returned whatever the provider sends back.
pub async fn web_search(provider: &dyn SearchProvider, query: &str) -> SearchOutcome {
    match provider.text_search(query, MAX_SEARCH_RESULTS).await {
        Ok(mut results) => {
            results.truncate(MAX_SEARCH_RESULTS);
            SearchOutcome {
                results,
                warning: None,
            }
        }
        Err(err) => {
            tracing::warn!(
                provider = provider.provider_name(),
                query,
                error = %err,
                "web search failed; continuing without results"
            );
            SearchOutcome {
                results: Vec::new(),
                warning: Some(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Flood;

    #[async_trait::async_trait]
    impl SearchProvider for Flood {
        fn provider_name(&self) -> &'static str {
            "flood"
        }

        // Ignores the requested cap on purpose.
        async fn text_search(&self, _query: &str, _max: usize) -> Result<Vec<SearchResult>, SearchError> {
            Ok((0..10)
                .map(|i| SearchResult {
                    title: Some(format!("r{i}")),
                    ..Default::default()
                })
                .collect())
        }
    }

    struct Down;

    #[async_trait::async_trait]
    impl SearchProvider for Down {
        fn provider_name(&self) -> &'static str {
            "down"
        }

        async fn text_search(&self, _query: &str, _max: usize) -> Result<Vec<SearchResult>, SearchError> {
            Err(SearchError("HTTP 503 Service Unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn caps_results_regardless_of_provider() {
        let outcome = web_search(&Flood, "NVDA stock analysis recent news").await;
        assert_eq!(outcome.results.len(), 3);
        assert_eq!(outcome.results[0].title.as_deref(), Some("r0"));
        assert!(outcome.warning.is_none());
    }

    #[tokio::test]
    async fn failure_is_empty_with_warning() {
        let outcome = web_search(&Down, "q").await;
        assert!(outcome.results.is_empty());
        assert_eq!(
            outcome.warning,
            Some(SearchError("HTTP 503 Service Unavailable".to_string()))
        );
    }
}
