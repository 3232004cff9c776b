//! Background jobs.
//!
//! Fire-and-forget work (torrent prefetch, background downloads) is sent
//! through a bounded channel and handled one job at a time by [`JobWorker`].

mod handle;
mod worker;

pub use handle::JobHandle;
pub use worker::{create_job_system, JobWorker};

use serde::{Deserialize, Serialize};

use crate::dispatcher::DownloadTarget;

/// A unit of background work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Job {
    /// Find and cache a torrent for a candidate.
    CacheTorrent { movie_id: i64 },
    /// Run the download dispatcher for a target.
    StartDownload { target: DownloadTarget },
}

impl Job {
    pub fn kind(&self) -> &'static str {
        match self {
            Job::CacheTorrent { .. } => "cache_torrent",
            Job::StartDownload { .. } => "start_download",
        }
    }
}
