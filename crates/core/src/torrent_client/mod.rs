//! Download client abstraction.
//!
//! Every interaction with the client happens inside a short-lived session:
//! log in, do the work, log out. See [`with_session`].

mod qbittorrent;
mod types;

use std::sync::Arc;

pub use qbittorrent::QBittorrentClient;
pub use types::*;

use crate::config::{TorrentClientBackend, TorrentClientConfig};

/// Build the configured download client.
pub fn create_torrent_client(
    config: &TorrentClientConfig,
) -> Result<Arc<dyn TorrentClient>, TorrentClientError> {
    match config.backend {
        TorrentClientBackend::Qbittorrent => {
            let qb = config.qbittorrent.clone().ok_or_else(|| {
                TorrentClientError::Internal("qbittorrent section is missing".to_string())
            })?;
            Ok(Arc::new(QBittorrentClient::new(qb)))
        }
    }
}
