//! Mock torrent provider for testing.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::searcher::{SearchError, Searcher, TorrentCandidate};

/// Mock implementation of the Searcher trait.
///
/// Results are keyed by exact query string; unknown queries return nothing.
/// Every query is recorded, including ones that fail.
///
/// # Example
///
/// ```rust,ignore
/// let searcher = MockSearcher::named("apibay");
/// searcher.add_results("Stalker 1979", vec![fixtures::candidate("Stalker", "abc", 10)]);
///
/// let found = searcher.search("Stalker 1979").await?;
/// assert_eq!(found.len(), 1);
/// assert_eq!(searcher.recorded_queries(), vec!["Stalker 1979"]);
/// ```
#[derive(Debug)]
pub struct MockSearcher {
    name: String,
    results: Mutex<HashMap<String, Vec<TorrentCandidate>>>,
    queries: Mutex<Vec<String>>,
    error: Mutex<Option<SearchError>>,
}

impl Default for MockSearcher {
    fn default() -> Self {
        Self::named("mock")
    }
}

impl MockSearcher {
    /// Create a mock provider with the given name and no results.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            results: Mutex::new(HashMap::new()),
            queries: Mutex::new(Vec::new()),
            error: Mutex::new(None),
        }
    }

    /// Return `results` for an exact query.
    pub fn add_results(&self, query: &str, results: Vec<TorrentCandidate>) {
        self.results
            .lock()
            .unwrap()
            .insert(query.to_string(), results);
    }

    /// Fail every subsequent search with `error`.
    pub fn set_error(&self, error: SearchError) {
        *self.error.lock().unwrap() = Some(error);
    }

    /// Clear an injected error.
    pub fn clear_error(&self) {
        *self.error.lock().unwrap() = None;
    }

    /// Queries seen so far, in order.
    pub fn recorded_queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Searcher for MockSearcher {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str) -> Result<Vec<TorrentCandidate>, SearchError> {
        self.queries.lock().unwrap().push(query.to_string());

        if let Some(err) = self.error.lock().unwrap().clone() {
            return Err(err);
        }

        Ok(self
            .results
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }
}
