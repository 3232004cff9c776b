//! Draw engine: the single irreversible random pick of a lottery winner.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use tracing::info;

use crate::lottery::{CandidateMovie, DrawResult, LotteryError, LotteryStore};
use crate::metrics;

#[derive(Debug, Error)]
pub enum DrawError {
    #[error("Lottery not found: {0}")]
    NotFound(String),

    #[error("Lottery {0} has no candidates")]
    NoCandidates(String),

    #[error(transparent)]
    Store(#[from] LotteryError),
}

/// Pick one candidate uniformly at random.
pub fn pick_winner<'a, R: Rng + ?Sized>(
    movies: &'a [CandidateMovie],
    rng: &mut R,
) -> Option<&'a CandidateMovie> {
    movies.choose(rng)
}

/// Performs draws and persists the outcome.
pub struct DrawEngine {
    store: Arc<dyn LotteryStore>,
}

impl DrawEngine {
    pub fn new(store: Arc<dyn LotteryStore>) -> Self {
        Self { store }
    }

    /// Draw the winner of a lottery.
    ///
    /// A lottery that already has a result returns it unchanged. Concurrent
    /// draws settle on whichever result the store accepted first.
    pub fn draw(&self, lottery_id: &str) -> Result<DrawResult, DrawError> {
        let lottery = self
            .store
            .get(lottery_id)?
            .ok_or_else(|| DrawError::NotFound(lottery_id.to_string()))?;

        if let Some(result) = lottery.result {
            metrics::DRAWS_TOTAL.with_label_values(&["existing"]).inc();
            return Ok(result);
        }

        let winner = pick_winner(&lottery.movies, &mut rand::thread_rng())
            .ok_or_else(|| DrawError::NoCandidates(lottery_id.to_string()))?
            .to_result();

        let stored = self.store.set_result(lottery_id, &winner).map_err(|e| match e {
            LotteryError::NotFound(id) => DrawError::NotFound(id),
            other => DrawError::Store(other),
        })?;

        metrics::DRAWS_TOTAL.with_label_values(&["drawn"]).inc();
        info!(lottery_id = %lottery_id, winner = %stored.name, "Lottery drawn");

        Ok(stored)
    }
}
