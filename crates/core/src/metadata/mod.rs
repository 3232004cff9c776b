//! Movie metadata lookup.
//!
//! Resolves a free-text query or a kinopoisk.ru page URL into a normalized
//! [`MovieRecord`]. The record is snapshotted into a lottery at creation time
//! and never re-fetched.

mod kinopoisk;
mod types;

pub use kinopoisk::{extract_kinopoisk_id, KinopoiskClient};
pub use types::{MovieRecord, MAX_COUNTRIES, MAX_GENRES};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from metadata lookup.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The query was empty or whitespace.
    #[error("Search query is empty")]
    EmptyQuery,

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

/// A movie database that can resolve user queries.
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    /// Name of the backing service.
    fn name(&self) -> &str;

    /// Resolve a query or page URL. `Ok(None)` means nothing matched.
    async fn search(&self, query: &str) -> Result<Option<MovieRecord>, MetadataError>;
}
