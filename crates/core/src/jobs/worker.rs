use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};

use super::{Job, JobHandle};
use crate::dispatcher::DownloadDispatcher;

/// Background task that receives jobs and runs them in order.
pub struct JobWorker {
    rx: mpsc::Receiver<Job>,
    dispatcher: Arc<DownloadDispatcher>,
}

impl JobWorker {
    pub fn new(rx: mpsc::Receiver<Job>, dispatcher: Arc<DownloadDispatcher>) -> Self {
        Self { rx, dispatcher }
    }

    /// Run until every [`JobHandle`] has been dropped.
    ///
    /// Spawn with `tokio::spawn(worker.run())`.
    pub async fn run(mut self) {
        info!("Job worker started");

        while let Some(job) = self.rx.recv().await {
            self.handle(job).await;
        }

        info!("Job worker shutting down");
    }

    async fn handle(&self, job: Job) {
        match job {
            Job::CacheTorrent { movie_id } => match self.dispatcher.prefetch(movie_id).await {
                Ok(Some(torrent)) => {
                    info!(movie_id, seeders = torrent.seeders, "Torrent cached for movie")
                }
                Ok(None) => info!(movie_id, "No torrent found to cache"),
                Err(e) => error!(movie_id, error = %e, "Torrent prefetch failed"),
            },
            Job::StartDownload { target } => {
                match self.dispatcher.start_download(&target).await {
                    Ok(outcome) => info!(
                        download = %target,
                        status = outcome.status.as_str(),
                        "Background download finished: {}",
                        outcome.message
                    ),
                    Err(e) => error!(download = %target, error = %e, "Background download failed"),
                }
            }
        }
    }
}

/// Create the job queue.
///
/// Returns the submitting handle and the worker to spawn.
pub fn create_job_system(
    dispatcher: Arc<DownloadDispatcher>,
    buffer_size: usize,
) -> (JobHandle, JobWorker) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (JobHandle::new(tx), JobWorker::new(rx, dispatcher))
}
