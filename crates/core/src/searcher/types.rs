//! Types for torrent discovery.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name some indexers return in place of an empty result list.
pub const NO_RESULTS_SENTINEL: &str = "No results returned";

static QUALITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(2160p|4k|1080p|720p|480p)\b").unwrap());

/// A torrent listing returned by one provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TorrentCandidate {
    /// Release title as listed by the provider.
    pub title: String,
    /// Info hash (lowercase hex). Empty if only a magnet URI is known.
    pub info_hash: String,
    /// Ready-made magnet URI, when the provider has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnet_uri: Option<String>,
    pub seeders: u32,
    pub leechers: u32,
    pub size_bytes: u64,
    /// Resolution label such as "1080p".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    /// Provider that returned the listing.
    pub provider: String,
}

impl TorrentCandidate {
    /// Whether this row is an upstream stand-in for "nothing found".
    pub fn is_placeholder(&self) -> bool {
        let title = self.title.trim();
        if title.is_empty() || title.eq_ignore_ascii_case(NO_RESULTS_SENTINEL) {
            return true;
        }
        let hash = self.info_hash.trim();
        if !hash.is_empty() && hash.chars().all(|c| c == '0') {
            return true;
        }
        hash.is_empty() && self.magnet_uri.as_deref().map_or(true, str::is_empty)
    }
}

/// Resolution label parsed from a release title.
pub fn quality_from_title(title: &str) -> Option<String> {
    QUALITY
        .captures(title)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}

/// The torrent chosen for a movie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TorrentMatch {
    pub title: String,
    pub magnet_link: String,
    pub seeders: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    pub provider: String,
}

/// Errors that can occur during search operations.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("Search backend connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Search backend API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SearchError::Timeout
        } else if e.is_connect() {
            SearchError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            SearchError::ApiError(format!("Failed to parse response: {}", e))
        } else {
            SearchError::ApiError(e.to_string())
        }
    }
}

/// A torrent index that can be searched by free text.
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Search for torrents. Returned candidates keep the provider's order.
    async fn search(&self, query: &str) -> Result<Vec<TorrentCandidate>, SearchError>;
}
