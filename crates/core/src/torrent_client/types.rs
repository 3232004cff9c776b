//! Types for download client operations.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur during download client operations.
#[derive(Debug, Clone, Error)]
pub enum TorrentClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid torrent data: {0}")]
    InvalidTorrent(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TorrentClientError {
    /// The client could not be reached or refused our credentials.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            TorrentClientError::ConnectionFailed(_)
                | TorrentClientError::AuthenticationFailed(_)
                | TorrentClientError::Timeout
        )
    }
}

/// Information about a torrent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentInfo {
    /// Info hash (lowercase hex).
    pub hash: String,
    /// Torrent name.
    pub name: String,
    /// State exactly as the client reported it (e.g. "stalledDL").
    pub state_label: String,
    /// Download progress (0.0 - 1.0).
    pub progress: f64,
    /// Current download speed in bytes/second.
    pub download_speed: u64,
    /// Number of seeders.
    pub seeders: u32,
    /// Number of leechers.
    pub leechers: u32,
    /// ETA in seconds (None if unknown).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_secs: Option<u64>,
    /// Category/label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Request to add a torrent by magnet URI.
#[derive(Debug, Clone, PartialEq)]
pub struct AddTorrentRequest {
    /// Magnet URI.
    pub uri: String,
    /// Optional category/label.
    pub category: Option<String>,
    /// Download pieces in order so playback can start early.
    pub sequential: bool,
}

impl AddTorrentRequest {
    /// Create a magnet request with default options.
    pub fn magnet(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            category: None,
            sequential: false,
        }
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Request sequential piece ordering.
    pub fn with_sequential(mut self, sequential: bool) -> Self {
        self.sequential = sequential;
        self
    }
}

/// Filters for listing torrents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TorrentFilters {
    /// Filter by exact category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl TorrentFilters {
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
        }
    }
}

/// Result of adding a torrent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTorrentResult {
    /// Info hash of the added torrent, empty if the URI carried none.
    pub hash: String,
    /// Name of the torrent (may be unknown for magnets initially).
    pub name: Option<String>,
}

/// Trait for download client backends.
///
/// Every operation goes through a short-lived [`TorrentSession`].
#[async_trait]
pub trait TorrentClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Authenticate and open a session.
    async fn login(&self) -> Result<Box<dyn TorrentSession>, TorrentClientError>;
}

/// An authenticated session with a download client.
#[async_trait]
pub trait TorrentSession: Send + Sync {
    /// List torrents matching the filters.
    async fn list_torrents(
        &self,
        filters: &TorrentFilters,
    ) -> Result<Vec<TorrentInfo>, TorrentClientError>;

    /// Add a new torrent.
    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<AddTorrentResult, TorrentClientError>;

    /// Release the session.
    async fn logout(&self) -> Result<(), TorrentClientError>;
}

/// Run `op` inside a fresh session, logging out afterwards on every path.
///
/// A failed logout is logged and does not change the result of `op`.
pub async fn with_session<T, F, Fut>(
    client: &dyn TorrentClient,
    op: F,
) -> Result<T, TorrentClientError>
where
    F: FnOnce(Arc<dyn TorrentSession>) -> Fut,
    Fut: Future<Output = Result<T, TorrentClientError>>,
{
    let session: Arc<dyn TorrentSession> = Arc::from(client.login().await?);
    debug!(client = client.name(), "Download client session opened");

    let result = op(Arc::clone(&session)).await;

    if let Err(e) = session.logout().await {
        warn!(client = client.name(), error = %e, "Failed to log out of download client");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTorrentClient;

    #[test]
    fn test_add_request_builder() {
        let request = AddTorrentRequest::magnet("magnet:?xt=urn:btih:AAA")
            .with_category("lottery-abc123")
            .with_sequential(true);
        assert_eq!(request.uri, "magnet:?xt=urn:btih:AAA");
        assert_eq!(request.category.as_deref(), Some("lottery-abc123"));
        assert!(request.sequential);
    }

    #[test]
    fn test_unavailable_errors() {
        assert!(TorrentClientError::Timeout.is_unavailable());
        assert!(TorrentClientError::ConnectionFailed("x".into()).is_unavailable());
        assert!(TorrentClientError::AuthenticationFailed("x".into()).is_unavailable());
        assert!(!TorrentClientError::ApiError("x".into()).is_unavailable());
    }

    #[tokio::test]
    async fn test_with_session_logs_out_on_success() {
        let client = MockTorrentClient::new();
        let count = with_session(&client, |session| async move {
            let torrents = session.list_torrents(&TorrentFilters::default()).await?;
            Ok(torrents.len())
        })
        .await
        .unwrap();

        assert_eq!(count, 0);
        assert_eq!(client.login_count(), 1);
        assert_eq!(client.logout_count(), 1);
    }

    #[tokio::test]
    async fn test_with_session_logs_out_on_error() {
        let client = MockTorrentClient::new();
        client.set_list_error(TorrentClientError::ApiError("boom".to_string()));

        let result = with_session(&client, |session| async move {
            session.list_torrents(&TorrentFilters::category("x")).await
        })
        .await;

        assert!(matches!(result, Err(TorrentClientError::ApiError(_))));
        assert_eq!(client.logout_count(), 1);
    }

    #[tokio::test]
    async fn test_with_session_login_failure_skips_op() {
        let client = MockTorrentClient::new();
        client.set_login_error(TorrentClientError::AuthenticationFailed("bad".to_string()));

        let mut ran = false;
        let result = with_session(&client, |_session| {
            ran = true;
            async { Ok(()) }
        })
        .await;

        assert!(matches!(
            result,
            Err(TorrentClientError::AuthenticationFailed(_))
        ));
        assert!(!ran);
        assert_eq!(client.logout_count(), 0);
    }
}
