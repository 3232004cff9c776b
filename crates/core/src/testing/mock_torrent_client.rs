//! Mock download client for testing.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::searcher::extract_info_hash;
use crate::torrent_client::{
    AddTorrentRequest, AddTorrentResult, TorrentClient, TorrentClientError, TorrentFilters,
    TorrentInfo, TorrentSession,
};

#[derive(Debug, Default)]
struct MockState {
    torrents: Vec<TorrentInfo>,
    added: Vec<AddTorrentRequest>,
    logins: usize,
    logouts: usize,
    login_error: Option<TorrentClientError>,
    list_error: Option<TorrentClientError>,
    add_error: Option<TorrentClientError>,
}

/// Mock implementation of the TorrentClient trait.
///
/// Sessions share the client's state, so torrents added through one session
/// are visible to the next. Logins and logouts are counted to verify that
/// every session is closed.
///
/// # Example
///
/// ```rust,ignore
/// let client = MockTorrentClient::new();
/// with_session(&client, |s| async move {
///     s.add_torrent(AddTorrentRequest::magnet("magnet:?xt=urn:btih:abc")).await
/// }).await?;
///
/// assert_eq!(client.added_torrents().len(), 1);
/// assert_eq!(client.logout_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTorrentClient {
    state: Arc<Mutex<MockState>>,
}

impl MockTorrentClient {
    /// Create a new mock client with no torrents.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a torrent as if it had been added earlier.
    pub fn add_mock_torrent(&self, info: TorrentInfo) {
        self.state.lock().unwrap().torrents.push(info);
    }

    /// Requests received through `add_torrent`, in order.
    pub fn added_torrents(&self) -> Vec<AddTorrentRequest> {
        self.state.lock().unwrap().added.clone()
    }

    /// Number of torrents currently known to the client.
    pub fn torrent_count(&self) -> usize {
        self.state.lock().unwrap().torrents.len()
    }

    pub fn login_count(&self) -> usize {
        self.state.lock().unwrap().logins
    }

    pub fn logout_count(&self) -> usize {
        self.state.lock().unwrap().logouts
    }

    /// Fail every login with `error`.
    pub fn set_login_error(&self, error: TorrentClientError) {
        self.state.lock().unwrap().login_error = Some(error);
    }

    /// Fail every listing with `error`.
    pub fn set_list_error(&self, error: TorrentClientError) {
        self.state.lock().unwrap().list_error = Some(error);
    }

    /// Fail every add with `error`.
    pub fn set_add_error(&self, error: TorrentClientError) {
        self.state.lock().unwrap().add_error = Some(error);
    }

    /// Update progress of the torrent with `hash`; 1.0 flips it to uploading.
    pub fn set_progress(&self, hash: &str, progress: f64) {
        let mut state = self.state.lock().unwrap();
        if let Some(torrent) = state.torrents.iter_mut().find(|t| t.hash == hash) {
            torrent.progress = progress.clamp(0.0, 1.0);
            if torrent.progress >= 1.0 {
                torrent.state_label = "uploading".to_string();
                torrent.eta_secs = None;
            }
        }
    }
}

#[async_trait]
impl TorrentClient for MockTorrentClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn login(&self) -> Result<Box<dyn TorrentSession>, TorrentClientError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.login_error.clone() {
            return Err(err);
        }
        state.logins += 1;
        Ok(Box::new(MockSession {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockSession {
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl TorrentSession for MockSession {
    async fn list_torrents(
        &self,
        filters: &TorrentFilters,
    ) -> Result<Vec<TorrentInfo>, TorrentClientError> {
        let state = self.state.lock().unwrap();
        if let Some(err) = state.list_error.clone() {
            return Err(err);
        }
        Ok(state
            .torrents
            .iter()
            .filter(|t| match &filters.category {
                Some(category) => t.category.as_deref() == Some(category.as_str()),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<AddTorrentResult, TorrentClientError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.add_error.clone() {
            return Err(err);
        }

        let hash = extract_info_hash(&request.uri)
            .unwrap_or_else(|| format!("mockhash{:032}", state.added.len()));
        state.torrents.push(TorrentInfo {
            hash: hash.clone(),
            name: format!("Mock torrent {}", &hash[..hash.len().min(8)]),
            state_label: "downloading".to_string(),
            progress: 0.0,
            download_speed: 0,
            seeders: 0,
            leechers: 0,
            eta_secs: None,
            category: request.category.clone(),
        });
        state.added.push(request);

        Ok(AddTorrentResult { hash, name: None })
    }

    async fn logout(&self) -> Result<(), TorrentClientError> {
        self.state.lock().unwrap().logouts += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_sessions_share_state() {
        let client = MockTorrentClient::new();

        let session = client.login().await.unwrap();
        session
            .add_torrent(
                AddTorrentRequest::magnet("magnet:?xt=urn:btih:abc").with_category("movie-1"),
            )
            .await
            .unwrap();
        session.logout().await.unwrap();

        let session = client.login().await.unwrap();
        let listed = session
            .list_torrents(&TorrentFilters::category("movie-1"))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].hash, "abc");
        assert!(session
            .list_torrents(&TorrentFilters::category("movie-2"))
            .await
            .unwrap()
            .is_empty());

        assert_eq!(client.login_count(), 2);
        assert_eq!(client.logout_count(), 1);
    }

    #[tokio::test]
    async fn test_set_progress_completes() {
        let client = MockTorrentClient::new();
        client.add_mock_torrent(fixtures::torrent_info("h1", "lottery-abc", 0.4));
        client.set_progress("h1", 1.0);

        let session = client.login().await.unwrap();
        let listed = session
            .list_torrents(&TorrentFilters::default())
            .await
            .unwrap();
        assert_eq!(listed[0].progress, 1.0);
        assert_eq!(listed[0].state_label, "uploading");
    }
}
