//! Mock movie database for testing.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::metadata::{MetadataError, MetadataLookup, MovieRecord};

/// Mock implementation of the MetadataLookup trait.
///
/// Records are keyed by the trimmed query; unknown queries resolve to nothing.
#[derive(Debug, Default)]
pub struct MockMetadataLookup {
    movies: Mutex<HashMap<String, MovieRecord>>,
    fail_with_status: Mutex<Option<u16>>,
}

impl MockMetadataLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `query` to `record`.
    pub fn add_movie(&self, query: &str, record: MovieRecord) {
        self.movies
            .lock()
            .unwrap()
            .insert(query.trim().to_string(), record);
    }

    /// Fail every lookup with an API error carrying `status`.
    pub fn fail_with(&self, status: u16) {
        *self.fail_with_status.lock().unwrap() = Some(status);
    }
}

#[async_trait]
impl MetadataLookup for MockMetadataLookup {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &str) -> Result<Option<MovieRecord>, MetadataError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MetadataError::EmptyQuery);
        }
        if let Some(status) = *self.fail_with_status.lock().unwrap() {
            return Err(MetadataError::ApiError {
                status,
                message: "mock failure".to_string(),
            });
        }
        Ok(self.movies.lock().unwrap().get(query).cloned())
    }
}
