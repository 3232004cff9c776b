//! kinopoisk.dev API client (v1.4).
//!
//! Accepts either free text, which goes through the search endpoint, or a
//! kinopoisk.ru page URL, whose numeric id is looked up directly.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::types::MovieRecord;
use super::{MetadataError, MetadataLookup};
use crate::config::MetadataConfig;

const API_KEY_HEADER: &str = "X-API-KEY";
const UNTITLED: &str = "Untitled";

static KINOPOISK_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"kinopoisk\.ru/(?:film|series)/(\d+)").unwrap());

/// Extract the numeric movie id from a kinopoisk.ru page URL.
pub fn extract_kinopoisk_id(query: &str) -> Option<u64> {
    KINOPOISK_URL
        .captures(query)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// kinopoisk.dev API client.
pub struct KinopoiskClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl KinopoiskClient {
    /// Create a new client. Fails when the API key is missing.
    pub fn new(config: &MetadataConfig) -> Result<Self, MetadataError> {
        if config.api_key.trim().is_empty() {
            return Err(MetadataError::NotConfigured(
                "kinopoisk API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn get_by_id(&self, id: u64) -> Result<Option<MovieRecord>, MetadataError> {
        let url = format!("{}/{}", self.base_url, id);
        debug!("Kinopoisk get movie: id={}", id);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response).await?;

        let movie: KpMovie = response.json().await.map_err(|e| {
            MetadataError::ParseError(format!("Failed to parse movie response: {}", e))
        })?;

        Ok(Some(movie.into()))
    }

    async fn search_text(&self, query: &str) -> Result<Option<MovieRecord>, MetadataError> {
        let url = format!("{}/search", self.base_url);
        debug!("Kinopoisk search: query='{}'", query);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[("query", query), ("limit", "1")])
            .send()
            .await?;
        let response = check_status(response).await?;

        let search: KpSearchResponse = response.json().await.map_err(|e| {
            MetadataError::ParseError(format!("Failed to parse search response: {}", e))
        })?;

        Ok(search.docs.into_iter().next().map(Into::into))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, MetadataError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, body))
}

/// Map a non-success response to an upstream error.
fn status_error(status: StatusCode, body: String) -> MetadataError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => MetadataError::RateLimitExceeded,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => MetadataError::ApiError {
            status: status.as_u16(),
            message: "Invalid kinopoisk API key".to_string(),
        },
        _ => MetadataError::ApiError {
            status: status.as_u16(),
            message: body,
        },
    }
}

#[async_trait]
impl MetadataLookup for KinopoiskClient {
    fn name(&self) -> &str {
        "kinopoisk"
    }

    async fn search(&self, query: &str) -> Result<Option<MovieRecord>, MetadataError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MetadataError::EmptyQuery);
        }

        match extract_kinopoisk_id(query) {
            Some(id) => self.get_by_id(id).await,
            None => self.search_text(query).await,
        }
    }
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct KpSearchResponse {
    #[serde(default)]
    docs: Vec<KpMovie>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KpMovie {
    id: Option<u64>,
    name: Option<String>,
    alternative_name: Option<String>,
    en_name: Option<String>,
    year: Option<u16>,
    description: Option<String>,
    short_description: Option<String>,
    rating: Option<KpRating>,
    poster: Option<KpPoster>,
    #[serde(default)]
    genres: Vec<KpNamed>,
    #[serde(default)]
    countries: Vec<KpNamed>,
}

#[derive(Debug, Deserialize)]
struct KpRating {
    kp: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KpPoster {
    url: Option<String>,
    preview_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KpNamed {
    name: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl From<KpMovie> for MovieRecord {
    fn from(m: KpMovie) -> Self {
        let name = non_empty(m.name)
            .or_else(|| non_empty(m.alternative_name))
            .or_else(|| non_empty(m.en_name))
            .unwrap_or_else(|| UNTITLED.to_string());

        MovieRecord {
            name,
            poster: m
                .poster
                .and_then(|p| non_empty(p.url).or_else(|| non_empty(p.preview_url))),
            year: m.year,
            description: non_empty(m.description).or_else(|| non_empty(m.short_description)),
            rating_kp: m.rating.and_then(|r| r.kp).filter(|r| *r > 0.0),
            genres: m.genres.into_iter().map(|g| g.name).collect(),
            countries: m.countries.into_iter().map(|c| c.name).collect(),
            kinopoisk_id: m.id,
        }
        .truncated()
    }
}
