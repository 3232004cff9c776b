//! qBittorrent Web API client.
//!
//! Each login builds its own cookie-carrying HTTP client, so sessions never
//! outlive the operation that opened them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::QBittorrentConfig;
use crate::searcher::extract_info_hash;

use super::{
    AddTorrentRequest, AddTorrentResult, TorrentClient, TorrentClientError, TorrentFilters,
    TorrentInfo, TorrentSession,
};

/// qBittorrent reports an unknown ETA as 100 days.
const ETA_INFINITY: i64 = 8_640_000;

fn map_request_error(e: reqwest::Error) -> TorrentClientError {
    if e.is_timeout() {
        TorrentClientError::Timeout
    } else if e.is_connect() {
        TorrentClientError::ConnectionFailed(e.to_string())
    } else {
        TorrentClientError::ApiError(e.to_string())
    }
}

/// qBittorrent client implementation.
pub struct QBittorrentClient {
    config: QBittorrentConfig,
}

impl QBittorrentClient {
    /// Create a new qBittorrent client.
    pub fn new(config: QBittorrentConfig) -> Self {
        Self { config }
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }
}

#[async_trait]
impl TorrentClient for QBittorrentClient {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn login(&self) -> Result<Box<dyn TorrentSession>, TorrentClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs as u64))
            .cookie_store(true)
            .build()
            .map_err(|e| TorrentClientError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let url = format!("{}/api/v2/auth/login", self.base_url());
        let params = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if body.contains("Ok.") {
            debug!("qBittorrent login successful");
            Ok(Box::new(QBittorrentSession {
                client,
                base_url: self.base_url().to_string(),
                download_path: self.config.download_path.clone(),
            }))
        } else if body.contains("Fails.") || status == StatusCode::FORBIDDEN {
            Err(TorrentClientError::AuthenticationFailed(
                "Invalid credentials".to_string(),
            ))
        } else {
            Err(TorrentClientError::AuthenticationFailed(format!(
                "Unexpected response: {}",
                body.chars().take(100).collect::<String>()
            )))
        }
    }
}

/// An authenticated qBittorrent session (SID cookie held by `client`).
struct QBittorrentSession {
    client: Client,
    base_url: String,
    download_path: Option<String>,
}

impl QBittorrentSession {
    async fn read_body(response: reqwest::Response) -> Result<String, TorrentClientError> {
        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return Err(TorrentClientError::AuthenticationFailed(
                "Session rejected".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(TorrentClientError::ApiError(format!("HTTP {}", status)));
        }
        response.text().await.map_err(map_request_error)
    }

    async fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<String, TorrentClientError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(map_request_error)?;
        Self::read_body(response).await
    }

    async fn post_form(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<reqwest::Response, TorrentClientError> {
        let url = format!("{}{}", self.base_url, endpoint);
        self.client
            .post(&url)
            .form(params)
            .send()
            .await
            .map_err(map_request_error)
    }

    async fn post_multipart(
        &self,
        endpoint: &str,
        form: multipart::Form,
    ) -> Result<String, TorrentClientError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(map_request_error)?;
        Self::read_body(response).await
    }

    /// Create the category if it does not exist yet.
    async fn ensure_category(&self, category: &str) -> Result<(), TorrentClientError> {
        let response = self
            .post_form(
                "/api/v2/torrents/createCategory",
                &[("category", category), ("savePath", "")],
            )
            .await?;

        // 409: category already exists
        if response.status() == StatusCode::CONFLICT {
            return Ok(());
        }
        Self::read_body(response).await.map(|_| ())
    }
}

/// Form fields for `/api/v2/torrents/add`.
fn add_form_fields(
    request: &AddTorrentRequest,
    default_path: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut fields = vec![("urls", request.uri.clone())];
    if let Some(category) = &request.category {
        fields.push(("category", category.clone()));
    }
    if let Some(path) = default_path {
        fields.push(("savepath", path.to_string()));
    }
    if request.sequential {
        fields.push(("sequentialDownload", "true".to_string()));
        fields.push(("firstLastPiecePrio", "true".to_string()));
    }
    fields
}

#[async_trait]
impl TorrentSession for QBittorrentSession {
    async fn list_torrents(
        &self,
        filters: &TorrentFilters,
    ) -> Result<Vec<TorrentInfo>, TorrentClientError> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(category) = &filters.category {
            query.push(("category", category));
        }

        let body = self.get("/api/v2/torrents/info", &query).await?;
        let torrents: Vec<QBTorrentInfo> = serde_json::from_str(&body)
            .map_err(|e| TorrentClientError::ApiError(format!("Failed to parse response: {}", e)))?;

        Ok(torrents
            .into_iter()
            .map(QBTorrentInfo::into_torrent_info)
            .collect())
    }

    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<AddTorrentResult, TorrentClientError> {
        if !request.uri.starts_with("magnet:") {
            return Err(TorrentClientError::InvalidTorrent(
                "Only magnet URIs are supported".to_string(),
            ));
        }

        if let Some(category) = &request.category {
            self.ensure_category(category).await?;
        }

        let form = add_form_fields(&request, self.download_path.as_deref())
            .into_iter()
            .fold(multipart::Form::new(), |form, (name, value)| {
                form.text(name, value)
            });

        let body = self.post_multipart("/api/v2/torrents/add", form).await?;
        if body.contains("Fails.") {
            return Err(TorrentClientError::ApiError(
                "qBittorrent rejected the torrent".to_string(),
            ));
        }

        let hash = extract_info_hash(&request.uri).unwrap_or_default();
        info!(hash = %hash, category = ?request.category, "Torrent added to qBittorrent");

        Ok(AddTorrentResult { hash, name: None })
    }

    async fn logout(&self) -> Result<(), TorrentClientError> {
        let response = self.post_form("/api/v2/auth/logout", &[]).await?;
        Self::read_body(response).await.map(|_| ())
    }
}

/// qBittorrent torrent info response.
#[derive(Debug, Deserialize)]
struct QBTorrentInfo {
    hash: String,
    name: String,
    state: String,
    progress: f64,
    #[serde(default)]
    dlspeed: i64,
    #[serde(default)]
    num_seeds: i64,
    #[serde(default)]
    num_leechs: i64,
    #[serde(default)]
    eta: Option<i64>,
    #[serde(default)]
    category: String,
}

impl QBTorrentInfo {
    fn into_torrent_info(self) -> TorrentInfo {
        TorrentInfo {
            hash: self.hash.to_lowercase(),
            name: self.name,
            state_label: self.state,
            progress: self.progress,
            download_speed: self.dlspeed.max(0) as u64,
            seeders: self.num_seeds.max(0) as u32,
            leechers: self.num_leechs.max(0) as u32,
            eta_secs: self
                .eta
                .filter(|eta| (0..ETA_INFINITY).contains(eta))
                .map(|eta| eta as u64),
            category: if self.category.is_empty() {
                None
            } else {
                Some(self.category)
            },
        }
    }
}
