//! Jackett search backend implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::JackettConfig;

use super::magnet::extract_info_hash;
use super::{quality_from_title, SearchError, Searcher, TorrentCandidate};

/// Jackett (Torznab) movies category.
const MOVIES_CATEGORY: u32 = 2000;

/// Jackett search backend implementation.
pub struct JackettSearcher {
    client: Client,
    config: JackettConfig,
}

impl JackettSearcher {
    /// Create a new JackettSearcher with the given configuration.
    pub fn new(config: JackettConfig, timeout_secs: u32) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs as u64))
            .build()
            .map_err(|e| SearchError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Build the Jackett API URL for a search.
    fn build_search_url(&self, query: &str) -> String {
        format!(
            "{}/api/v2.0/indexers/{}/results?apikey={}&Query={}&Category[]={}",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(&self.config.indexer),
            urlencoding::encode(&self.config.api_key),
            urlencoding::encode(query),
            MOVIES_CATEGORY
        )
    }
}

#[async_trait]
impl Searcher for JackettSearcher {
    fn name(&self) -> &str {
        "jackett"
    }

    async fn search(&self, query: &str) -> Result<Vec<TorrentCandidate>, SearchError> {
        let url = self.build_search_url(query);
        debug!(indexer = %self.config.indexer, query = %query, "Searching Jackett");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let jackett_response: JackettResponse = response
            .json()
            .await
            .map_err(|e| SearchError::ApiError(format!("Failed to parse response: {}", e)))?;

        debug!(
            results = jackett_response.Results.len(),
            "Jackett search complete"
        );

        Ok(results_to_candidates(jackett_response.Results))
    }
}

fn results_to_candidates(results: Vec<JackettResult>) -> Vec<TorrentCandidate> {
    results
        .into_iter()
        .map(|r| {
            let seeders = r.Seeders.unwrap_or(0).max(0);
            let info_hash = r
                .InfoHash
                .map(|h| h.to_lowercase())
                .or_else(|| r.MagnetUri.as_deref().and_then(extract_info_hash))
                .unwrap_or_default();
            TorrentCandidate {
                quality: quality_from_title(&r.Title),
                title: r.Title,
                info_hash,
                magnet_uri: r.MagnetUri.filter(|m| m.starts_with("magnet:")),
                seeders: seeders as u32,
                leechers: r.Peers.unwrap_or(0).saturating_sub(seeders).max(0) as u32,
                size_bytes: r.Size.unwrap_or(0).max(0) as u64,
                provider: "jackett".to_string(),
            }
        })
        .collect()
}

// Jackett API response types
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResponse {
    #[serde(default)]
    Results: Vec<JackettResult>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResult {
    Title: String,
    MagnetUri: Option<String>,
    InfoHash: Option<String>,
    Size: Option<i64>,
    Seeders: Option<i32>,
    Peers: Option<i32>,
}
