//! Download dispatcher.
//!
//! Resolves a lottery winner or a single candidate to a magnet link and hands
//! it to the download client, at most once per category.

mod target;

pub use target::{category_for_key, DownloadTarget};

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::lottery::{CachedTorrent, LotteryError, LotteryStore};
use crate::metrics;
use crate::searcher::{TorrentDiscovery, TorrentMatch};
use crate::torrent_client::{
    with_session, AddTorrentRequest, TorrentClient, TorrentClientError, TorrentFilters,
    TorrentSession,
};

pub const MSG_ALREADY_TRACKED: &str = "Download already in progress";
pub const MSG_NOT_FOUND: &str = "Torrent not found";
pub const MSG_STARTED: &str = "Download started";

/// Errors from download dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Lottery {0} has not been drawn yet")]
    NotDrawn(String),

    #[error("Download client unavailable: {0}")]
    ClientUnavailable(TorrentClientError),

    #[error("Failed to submit download: {0}")]
    SubmissionFailed(String),

    #[error(transparent)]
    Store(#[from] LotteryError),
}

impl From<TorrentClientError> for DispatchError {
    fn from(e: TorrentClientError) -> Self {
        if e.is_unavailable() {
            DispatchError::ClientUnavailable(e)
        } else {
            DispatchError::SubmissionFailed(e.to_string())
        }
    }
}

/// How a dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    Started,
    AlreadyTracked,
    NotFound,
}

impl DispatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStatus::Started => "started",
            DispatchStatus::AlreadyTracked => "already_tracked",
            DispatchStatus::NotFound => "not_found",
        }
    }
}

/// Result of a successful dispatch call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchOutcome {
    pub status: DispatchStatus,
    pub message: String,
}

impl DispatchOutcome {
    fn new(status: DispatchStatus) -> Self {
        let message = match status {
            DispatchStatus::Started => MSG_STARTED,
            DispatchStatus::AlreadyTracked => MSG_ALREADY_TRACKED,
            DispatchStatus::NotFound => MSG_NOT_FOUND,
        };
        Self {
            status,
            message: message.to_string(),
        }
    }

    /// Whether a transfer is now tracked for the target.
    pub fn started(&self) -> bool {
        self.status != DispatchStatus::NotFound
    }
}

/// What a target resolved to before any network call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTarget {
    pub name: String,
    pub year: Option<u16>,
    /// Cached magnet link, if the candidate has one.
    pub magnet: Option<String>,
    /// Candidate row to cache discovery results on.
    pub movie_id: Option<i64>,
}

/// Starts downloads through the configured client.
pub struct DownloadDispatcher {
    store: Arc<dyn LotteryStore>,
    discovery: Arc<TorrentDiscovery>,
    client: Arc<dyn TorrentClient>,
}

impl DownloadDispatcher {
    pub fn new(
        store: Arc<dyn LotteryStore>,
        discovery: Arc<TorrentDiscovery>,
        client: Arc<dyn TorrentClient>,
    ) -> Self {
        Self {
            store,
            discovery,
            client,
        }
    }

    /// Look up the movie behind a target.
    ///
    /// Fails with `NotFound` for unknown ids and `NotDrawn` for a lottery
    /// without a result.
    pub fn resolve(&self, target: &DownloadTarget) -> Result<ResolvedTarget, DispatchError> {
        match target {
            DownloadTarget::Lottery(id) => {
                let lottery = self
                    .store
                    .get(id)?
                    .ok_or_else(|| DispatchError::NotFound(format!("lottery {}", id)))?;
                let result = lottery
                    .result
                    .as_ref()
                    .ok_or_else(|| DispatchError::NotDrawn(id.clone()))?;

                let winner = lottery.winner();
                Ok(ResolvedTarget {
                    name: result.name.clone(),
                    year: result.year,
                    magnet: winner
                        .and_then(|m| m.torrent.as_ref())
                        .map(|t| t.magnet_link.clone()),
                    movie_id: winner.map(|m| m.id),
                })
            }
            DownloadTarget::Movie(movie_id) => {
                let movie = self
                    .store
                    .get_movie(*movie_id)?
                    .ok_or_else(|| DispatchError::NotFound(format!("movie {}", movie_id)))?;
                Ok(ResolvedTarget {
                    name: movie.record.name,
                    year: movie.record.year,
                    magnet: movie.torrent.map(|t| t.magnet_link),
                    movie_id: Some(movie.id),
                })
            }
        }
    }

    /// Start downloading a target unless its category is already tracked.
    pub async fn start_download(
        &self,
        target: &DownloadTarget,
    ) -> Result<DispatchOutcome, DispatchError> {
        let started_at = Instant::now();
        let resolved = self.resolve(target)?;
        let category = target.category();

        let result = with_session(self.client.as_ref(), |session| {
            self.dispatch(session, &resolved, &category)
        })
        .await;

        let label = match &result {
            Ok(outcome) => outcome.status.as_str(),
            Err(_) => "failed",
        };
        metrics::DOWNLOADS_TOTAL.with_label_values(&[label]).inc();
        metrics::DOWNLOAD_DISPATCH_DURATION
            .with_label_values(&[label])
            .observe(started_at.elapsed().as_secs_f64());

        match result {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!(download = %target, error = %e, "Download dispatch failed");
                Err(e.into())
            }
        }
    }

    async fn dispatch(
        &self,
        session: Arc<dyn TorrentSession>,
        resolved: &ResolvedTarget,
        category: &str,
    ) -> Result<DispatchOutcome, TorrentClientError> {
        let existing = session
            .list_torrents(&TorrentFilters::category(category))
            .await?;
        if !existing.is_empty() {
            info!(category = %category, "Download already tracked");
            return Ok(DispatchOutcome::new(DispatchStatus::AlreadyTracked));
        }

        let magnet = match &resolved.magnet {
            Some(magnet) => Some(magnet.clone()),
            None => self
                .discover(&resolved.name, resolved.year, resolved.movie_id)
                .await
                .map(|found| found.magnet_link),
        };

        let Some(magnet) = magnet else {
            info!(title = %resolved.name, "No torrent found for download");
            return Ok(DispatchOutcome::new(DispatchStatus::NotFound));
        };

        let request = AddTorrentRequest::magnet(magnet)
            .with_category(category)
            .with_sequential(true);
        let added = session.add_torrent(request).await?;

        info!(
            title = %resolved.name,
            category = %category,
            hash = %added.hash,
            "Download submitted"
        );
        Ok(DispatchOutcome::new(DispatchStatus::Started))
    }

    /// Run discovery and remember the match on the candidate row.
    async fn discover(
        &self,
        name: &str,
        year: Option<u16>,
        movie_id: Option<i64>,
    ) -> Option<TorrentMatch> {
        let found = self.discovery.find_best_torrent(name, year).await?;

        if let Some(movie_id) = movie_id {
            let cached = CachedTorrent {
                magnet_link: found.magnet_link.clone(),
                quality: found.quality.clone(),
                seeders: found.seeders,
                updated_at: Utc::now(),
            };
            if let Err(e) = self.store.update_movie_torrent(movie_id, &cached) {
                warn!(movie_id, error = %e, "Failed to cache torrent on movie");
            }
        }
        Some(found)
    }

    /// Find and cache a torrent for a candidate ahead of any draw.
    ///
    /// Candidates that already carry a torrent are left alone.
    pub async fn prefetch(&self, movie_id: i64) -> Result<Option<CachedTorrent>, DispatchError> {
        let movie = self
            .store
            .get_movie(movie_id)?
            .ok_or_else(|| DispatchError::NotFound(format!("movie {}", movie_id)))?;

        if movie.torrent.is_some() {
            return Ok(movie.torrent);
        }

        let found = self
            .discover(&movie.record.name, movie.record.year, Some(movie_id))
            .await;
        Ok(found.map(|found| CachedTorrent {
            magnet_link: found.magnet_link,
            quality: found.quality,
            seeders: found.seeders,
            updated_at: Utc::now(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lottery::{CreateLotteryRequest, DrawResult, SqliteLotteryStore};
    use crate::metadata::MovieRecord;
    use crate::searcher::Searcher;
    use crate::testing::{fixtures, MockSearcher, MockTorrentClient};

    struct Harness {
        store: Arc<SqliteLotteryStore>,
        searcher: Arc<MockSearcher>,
        client: MockTorrentClient,
        dispatcher: DownloadDispatcher,
    }

    fn harness() -> Harness {
        let store = Arc::new(SqliteLotteryStore::in_memory().unwrap());
        let searcher = Arc::new(MockSearcher::named("apibay"));
        let client = MockTorrentClient::new();
        let discovery = TorrentDiscovery::new(
            vec![Arc::clone(&searcher) as Arc<dyn Searcher>],
            vec!["udp://tracker.one:1337/announce".to_string()],
        );
        let dispatcher = DownloadDispatcher::new(
            Arc::clone(&store) as Arc<dyn LotteryStore>,
            Arc::new(discovery),
            Arc::new(client.clone()),
        );
        Harness {
            store,
            searcher,
            client,
            dispatcher,
        }
    }

    fn drawn_lottery(store: &SqliteLotteryStore, magnet: Option<&str>) -> String {
        let lottery = store
            .create(CreateLotteryRequest::new(vec![
                MovieRecord::named("Stalker").with_year(1979),
                MovieRecord::named("Solaris").with_year(1972),
            ]))
            .unwrap();
        let winner = &lottery.movies[0];
        if let Some(magnet) = magnet {
            store
                .update_movie_torrent(
                    winner.id,
                    &CachedTorrent {
                        magnet_link: magnet.to_string(),
                        quality: Some("1080p".to_string()),
                        seeders: 10,
                        updated_at: Utc::now(),
                    },
                )
                .unwrap();
        }
        store
            .set_result(&lottery.id, &winner.to_result())
            .unwrap();
        lottery.id
    }

    #[tokio::test]
    async fn test_cached_magnet_submitted_sequentially() {
        let h = harness();
        let id = drawn_lottery(&h.store, Some("magnet:?xt=urn:btih:AAA"));

        let outcome = h
            .dispatcher
            .start_download(&DownloadTarget::Lottery(id.clone()))
            .await
            .unwrap();

        assert!(outcome.started());
        assert!(outcome.message.contains("started"));
        let added = h.client.added_torrents();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].uri, "magnet:?xt=urn:btih:AAA");
        assert_eq!(added[0].category, Some(format!("lottery-{}", id)));
        assert!(added[0].sequential);
        assert!(h.searcher.recorded_queries().is_empty());
        assert_eq!(h.client.logout_count(), 1);
    }

    #[tokio::test]
    async fn test_second_dispatch_is_already_tracked() {
        let h = harness();
        let id = drawn_lottery(&h.store, Some("magnet:?xt=urn:btih:AAA"));
        let target = DownloadTarget::Lottery(id);

        h.dispatcher.start_download(&target).await.unwrap();
        let second = h.dispatcher.start_download(&target).await.unwrap();

        assert_eq!(second.status, DispatchStatus::AlreadyTracked);
        assert_eq!(second.message, MSG_ALREADY_TRACKED);
        assert!(second.started());
        assert_eq!(h.client.added_torrents().len(), 1);
        assert_eq!(h.client.logout_count(), 2);
    }

    #[tokio::test]
    async fn test_discovery_result_is_cached() {
        let h = harness();
        let id = drawn_lottery(&h.store, None);
        h.searcher.add_results(
            "Stalker 1979",
            vec![fixtures::candidate("Stalker 1979 1080p", "bbb", 42)],
        );

        let outcome = h
            .dispatcher
            .start_download(&DownloadTarget::Lottery(id.clone()))
            .await
            .unwrap();
        assert_eq!(outcome.status, DispatchStatus::Started);

        let lottery = h.store.get(&id).unwrap().unwrap();
        let cached = lottery.winner().unwrap().torrent.as_ref().unwrap();
        assert!(cached.magnet_link.starts_with("magnet:?xt=urn:btih:bbb"));
        assert_eq!(cached.seeders, 42);
        assert_eq!(h.client.added_torrents()[0].uri, cached.magnet_link);
    }

    #[tokio::test]
    async fn test_torrent_not_found() {
        let h = harness();
        let id = drawn_lottery(&h.store, None);

        let outcome = h
            .dispatcher
            .start_download(&DownloadTarget::Lottery(id))
            .await
            .unwrap();

        assert!(!outcome.started());
        assert_eq!(outcome.message, MSG_NOT_FOUND);
        assert!(h.client.added_torrents().is_empty());
        assert_eq!(h.client.logout_count(), 1);
    }

    #[tokio::test]
    async fn test_undrawn_lottery_rejected() {
        let h = harness();
        let lottery = h
            .store
            .create(CreateLotteryRequest::new(vec![
                MovieRecord::named("A"),
                MovieRecord::named("B"),
            ]))
            .unwrap();

        let result = h
            .dispatcher
            .start_download(&DownloadTarget::Lottery(lottery.id))
            .await;
        assert!(matches!(result, Err(DispatchError::NotDrawn(_))));
        assert_eq!(h.client.login_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_targets() {
        let h = harness();
        assert!(matches!(
            h.dispatcher
                .start_download(&DownloadTarget::Lottery("nope".to_string()))
                .await,
            Err(DispatchError::NotFound(_))
        ));
        assert!(matches!(
            h.dispatcher.start_download(&DownloadTarget::Movie(999)).await,
            Err(DispatchError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_movie_target_uses_movie_category() {
        let h = harness();
        let lottery = h
            .store
            .create(CreateLotteryRequest::new(vec![
                MovieRecord::named("Stalker").with_year(1979),
                MovieRecord::named("Solaris").with_year(1972),
            ]))
            .unwrap();
        let movie_id = lottery.movies[1].id;
        h.searcher
            .add_results("Solaris 1972", vec![fixtures::candidate("Solaris", "ccc", 5)]);

        let outcome = h
            .dispatcher
            .start_download(&DownloadTarget::Movie(movie_id))
            .await
            .unwrap();

        assert!(outcome.started());
        assert_eq!(
            h.client.added_torrents()[0].category,
            Some(format!("movie-{}", movie_id))
        );
    }

    #[tokio::test]
    async fn test_login_failure_is_unavailable() {
        let h = harness();
        let id = drawn_lottery(&h.store, Some("magnet:?xt=urn:btih:AAA"));
        h.client
            .set_login_error(TorrentClientError::ConnectionFailed("refused".to_string()));

        let result = h
            .dispatcher
            .start_download(&DownloadTarget::Lottery(id))
            .await;
        assert!(matches!(result, Err(DispatchError::ClientUnavailable(_))));
    }

    #[tokio::test]
    async fn test_add_failure_is_submission_error() {
        let h = harness();
        let id = drawn_lottery(&h.store, Some("magnet:?xt=urn:btih:AAA"));
        h.client
            .set_add_error(TorrentClientError::ApiError("rejected".to_string()));

        let result = h
            .dispatcher
            .start_download(&DownloadTarget::Lottery(id))
            .await;
        assert!(matches!(result, Err(DispatchError::SubmissionFailed(_))));
        assert_eq!(h.client.logout_count(), 1);
    }

    #[tokio::test]
    async fn test_prefetch_caches_once() {
        let h = harness();
        let lottery = h
            .store
            .create(CreateLotteryRequest::new(vec![
                MovieRecord::named("Stalker").with_year(1979),
                MovieRecord::named("Solaris").with_year(1972),
            ]))
            .unwrap();
        let movie_id = lottery.movies[0].id;
        h.searcher
            .add_results("Stalker 1979", vec![fixtures::candidate("Stalker", "ddd", 7)]);

        let first = h.dispatcher.prefetch(movie_id).await.unwrap().unwrap();
        let second = h.dispatcher.prefetch(movie_id).await.unwrap().unwrap();

        assert_eq!(first.magnet_link, second.magnet_link);
        assert_eq!(h.searcher.recorded_queries(), vec!["Stalker 1979"]);
    }

    #[test]
    fn test_winner_resolution_uses_result() {
        let h = harness();
        let lottery = h
            .store
            .create(CreateLotteryRequest::new(vec![
                MovieRecord::named("Stalker").with_year(1979),
                MovieRecord::named("Solaris").with_year(1972),
            ]))
            .unwrap();
        h.store
            .set_result(
                &lottery.id,
                &DrawResult {
                    name: "Solaris".to_string(),
                    poster: None,
                    year: Some(1972),
                },
            )
            .unwrap();

        let resolved = h
            .dispatcher
            .resolve(&DownloadTarget::Lottery(lottery.id))
            .unwrap();
        assert_eq!(resolved.name, "Solaris");
        assert_eq!(resolved.movie_id, Some(lottery.movies[1].id));
        assert!(resolved.magnet.is_none());
    }
}
