//! apibay.org (The Pirate Bay JSON API) provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{quality_from_title, SearchError, Searcher, TorrentCandidate};

/// Video category, covers movies and HD movies.
const VIDEO_CATEGORY: &str = "200";

/// Searches apibay.org.
pub struct ApibaySearcher {
    client: Client,
    base_url: String,
}

impl ApibaySearcher {
    pub fn new(base_url: &str, timeout_secs: u32) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs as u64))
            .build()
            .map_err(|e| SearchError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Searcher for ApibaySearcher {
    fn name(&self) -> &str {
        "apibay"
    }

    async fn search(&self, query: &str) -> Result<Vec<TorrentCandidate>, SearchError> {
        let url = format!("{}/q.php", self.base_url);
        debug!(query = %query, "Searching apibay");

        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("cat", VIDEO_CATEGORY)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(SearchError::ApiError(format!("HTTP {}", status)));
        }

        let rows: Vec<ApibayRow> = response.json().await?;
        Ok(rows_to_candidates(rows))
    }
}

fn rows_to_candidates(rows: Vec<ApibayRow>) -> Vec<TorrentCandidate> {
    rows.into_iter()
        .filter(|r| r.id != "0")
        .map(|r| TorrentCandidate {
            quality: quality_from_title(&r.name),
            info_hash: r.info_hash.to_lowercase(),
            magnet_uri: None,
            seeders: r.seeders.parse().unwrap_or(0),
            leechers: r.leechers.parse().unwrap_or(0),
            size_bytes: r.size.parse().unwrap_or(0),
            title: r.name,
            provider: "apibay".to_string(),
        })
        .collect()
}

/// apibay returns every field as a string.
#[derive(Debug, Deserialize)]
struct ApibayRow {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    info_hash: String,
    #[serde(default)]
    seeders: String,
    #[serde(default)]
    leechers: String,
    #[serde(default)]
    size: String,
}
