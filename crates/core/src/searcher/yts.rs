//! YTS movie API provider.
//!
//! YTS lists one movie with several encodes; each encode becomes a candidate.
//! Only hashes are returned, so magnets are synthesized downstream.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{SearchError, Searcher, TorrentCandidate};

const PAGE_LIMIT: &str = "20";

/// Searches the YTS list_movies endpoint.
pub struct YtsSearcher {
    client: Client,
    base_url: String,
}

impl YtsSearcher {
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
impl Searcher for YtsSearcher {
    fn name(&self) -> &str {
        "yts"
    }

    async fn search(&self, query: &str) -> Result<Vec<TorrentCandidate>, SearchError> {
        let url = format!("{}/api/v2/list_movies.json", self.base_url);
        debug!(query = %query, "Searching YTS");

        let response = self
            .client
            .get(&url)
            .query(&[("query_term", query), ("limit", PAGE_LIMIT)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(SearchError::ApiError(format!("HTTP {}", status)));
        }

        let body: YtsResponse = response.json().await?;
        if body.status != "ok" {
            return Err(SearchError::ApiError(
                body.status_message
                    .unwrap_or_else(|| format!("status {}", body.status)),
            ));
        }

        Ok(response_to_candidates(body))
    }
}

fn response_to_candidates(body: YtsResponse) -> Vec<TorrentCandidate> {
    body.data
        .map(|d| d.movies)
        .unwrap_or_default()
        .into_iter()
        .flat_map(|movie| {
            let label = match movie.year {
                Some(year) => format!("{} ({})", movie.title, year),
                None => movie.title.clone(),
            };
            movie.torrents.into_iter().map(move |t| TorrentCandidate {
                title: format!("{} [{}]", label, t.quality),
                info_hash: t.hash.to_lowercase(),
                magnet_uri: None,
                seeders: t.seeds,
                leechers: t.peers,
                size_bytes: t.size_bytes,
                quality: Some(t.quality),
                provider: "yts".to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct YtsResponse {
    status: String,
    status_message: Option<String>,
    data: Option<YtsData>,
}

#[derive(Debug, Deserialize)]
struct YtsData {
    #[serde(default)]
    movies: Vec<YtsMovie>,
}

#[derive(Debug, Deserialize)]
struct YtsMovie {
    title: String,
    year: Option<u16>,
    #[serde(default)]
    torrents: Vec<YtsTorrent>,
}

#[derive(Debug, Deserialize)]
struct YtsTorrent {
    hash: String,
    quality: String,
    #[serde(default)]
    seeds: u32,
    #[serde(default)]
    peers: u32,
    #[serde(default)]
    size_bytes: u64,
}
