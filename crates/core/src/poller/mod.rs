//! Transfer status polling.
//!
//! Reads the state of the transfer tracked under a category. Never fails:
//! client problems are reported as [`TransferStatus::Error`].

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::metrics;
use crate::torrent_client::{with_session, TorrentClient, TorrentFilters, TorrentInfo};

const BYTES_PER_MIB: f64 = 1_048_576.0;

/// Snapshot of an active transfer, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferSnapshot {
    /// Client state, verbatim.
    pub status: String,
    /// Percent complete, one decimal.
    pub progress: f64,
    pub speed_mbps: f64,
    pub eta: Option<String>,
    pub name: String,
    pub seeds: u32,
    pub peers: u32,
}

impl From<&TorrentInfo> for TransferSnapshot {
    fn from(info: &TorrentInfo) -> Self {
        Self {
            status: info.state_label.clone(),
            progress: round_to(info.progress * 100.0, 1),
            speed_mbps: round_to(info.download_speed as f64 / BYTES_PER_MIB, 2),
            eta: info.eta_secs.map(format_eta),
            name: info.name.clone(),
            seeds: info.seeders,
            peers: info.leechers,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransferStatus {
    Active(TransferSnapshot),
    NotFound,
    Error(String),
}

impl TransferStatus {
    fn label(&self) -> &'static str {
        match self {
            TransferStatus::Active(_) => "active",
            TransferStatus::NotFound => "not_found",
            TransferStatus::Error(_) => "error",
        }
    }
}

/// Format seconds as "<h>ч <m>м", dropping the hours when zero.
pub fn format_eta(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    if hours > 0 {
        format!("{}ч {}м", hours, minutes)
    } else {
        format!("{}м", minutes)
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub struct StatusPoller {
    client: Arc<dyn TorrentClient>,
}

impl StatusPoller {
    pub fn new(client: Arc<dyn TorrentClient>) -> Self {
        Self { client }
    }

    /// Current state of the first transfer in `category`.
    pub async fn get_status(&self, category: &str) -> TransferStatus {
        let result = with_session(self.client.as_ref(), |session| async move {
            session
                .list_torrents(&TorrentFilters::category(category))
                .await
        })
        .await;

        let status = match result {
            Ok(torrents) => match torrents.first() {
                Some(info) => TransferStatus::Active(info.into()),
                None => TransferStatus::NotFound,
            },
            Err(e) => {
                warn!(category = %category, error = %e, "Failed to poll transfer status");
                TransferStatus::Error(e.to_string())
            }
        };

        debug!(category = %category, status = status.label(), "Transfer status polled");
        metrics::STATUS_POLLS_TOTAL
            .with_label_values(&[status.label()])
            .inc();
        status
    }
}
