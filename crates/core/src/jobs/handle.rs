use tokio::sync::mpsc;
use tracing::warn;

use super::Job;

/// Handle for submitting background jobs.
///
/// Cheaply cloneable and shared across request handlers.
#[derive(Clone)]
pub struct JobHandle {
    tx: mpsc::Sender<Job>,
}

impl JobHandle {
    pub fn new(tx: mpsc::Sender<Job>) -> Self {
        Self { tx }
    }

    /// Queue a job without waiting.
    ///
    /// Returns false when the queue is full or the worker has stopped.
    pub fn submit(&self, job: Job) -> bool {
        let kind = job.kind();
        match self.tx.try_send(job) {
            Ok(()) => true,
            Err(e) => {
                warn!(job = kind, error = %e, "Dropping background job");
                false
            }
        }
    }
}
