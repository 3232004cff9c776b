//! Lottery storage trait and types.

use std::fmt;

use crate::lottery::{CachedTorrent, CandidateMovie, DrawResult, Lottery};
use crate::metadata::MovieRecord;

/// Candidates required to create a lottery.
pub const MIN_CANDIDATES: usize = 2;

/// Error type for lottery operations.
#[derive(Debug)]
pub enum LotteryError {
    /// Lottery not found.
    NotFound(String),
    /// Candidate movie not found.
    MovieNotFound(i64),
    /// Request rejected before touching storage.
    Validation(String),
    /// Database error.
    Database(String),
}

impl fmt::Display for LotteryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LotteryError::NotFound(id) => write!(f, "Lottery not found: {}", id),
            LotteryError::MovieNotFound(id) => write!(f, "Movie not found: {}", id),
            LotteryError::Validation(msg) => write!(f, "{}", msg),
            LotteryError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for LotteryError {}

/// Request to create a new lottery.
#[derive(Debug, Clone)]
pub struct CreateLotteryRequest {
    /// Candidates in display order.
    pub movies: Vec<MovieRecord>,
}

impl CreateLotteryRequest {
    pub fn new(movies: Vec<MovieRecord>) -> Self {
        Self { movies }
    }

    /// Check candidate count and names.
    pub fn validate(&self) -> Result<(), LotteryError> {
        if self.movies.len() < MIN_CANDIDATES {
            return Err(LotteryError::Validation(format!(
                "A lottery needs at least {} movies, got {}",
                MIN_CANDIDATES,
                self.movies.len()
            )));
        }
        if self.movies.iter().any(|m| m.name.trim().is_empty()) {
            return Err(LotteryError::Validation(
                "Every movie needs a name".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for lottery storage backends.
pub trait LotteryStore: Send + Sync {
    /// Create a lottery with a fresh unique identifier.
    fn create(&self, request: CreateLotteryRequest) -> Result<Lottery, LotteryError>;

    /// Get a lottery with its candidates.
    fn get(&self, id: &str) -> Result<Option<Lottery>, LotteryError>;

    /// All lotteries, newest first.
    fn list(&self) -> Result<Vec<Lottery>, LotteryError>;

    /// Record the draw result if none is stored yet.
    ///
    /// Returns the result that is stored after the call, which is the
    /// earlier one when another draw got there first.
    fn set_result(&self, id: &str, result: &DrawResult) -> Result<DrawResult, LotteryError>;

    /// Delete a lottery and its candidates, returning what was removed.
    fn delete(&self, id: &str) -> Result<Lottery, LotteryError>;

    /// Get a single candidate movie.
    fn get_movie(&self, movie_id: i64) -> Result<Option<CandidateMovie>, LotteryError>;

    /// Attach a discovered torrent to a candidate.
    fn update_movie_torrent(
        &self,
        movie_id: i64,
        torrent: &CachedTorrent,
    ) -> Result<(), LotteryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_two_movies() {
        let request = CreateLotteryRequest::new(vec![MovieRecord::named("Stalker")]);
        assert!(matches!(
            request.validate(),
            Err(LotteryError::Validation(_))
        ));

        let request = CreateLotteryRequest::new(vec![
            MovieRecord::named("Stalker"),
            MovieRecord::named("Solaris"),
        ]);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_names() {
        let request = CreateLotteryRequest::new(vec![
            MovieRecord::named("Stalker"),
            MovieRecord::named("  "),
        ]);
        assert!(matches!(
            request.validate(),
            Err(LotteryError::Validation(_))
        ));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            LotteryError::NotFound("abc123".to_string()).to_string(),
            "Lottery not found: abc123"
        );
        assert_eq!(LotteryError::MovieNotFound(7).to_string(), "Movie not found: 7");
    }
}
