//! Lottery API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use lottery_core::{
    metrics, CandidateMovie, CreateLotteryRequest, DrawError, DrawResult, Job, Lottery,
    LotteryError, MovieRecord,
};

use super::handlers::ErrorResponse;
use crate::state::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateLotteryBody {
    #[serde(default)]
    pub movies: Vec<MovieRecord>,
}

#[derive(Debug, Serialize)]
pub struct CreateLotteryResponse {
    pub lottery_id: String,
    pub wait_url: String,
    pub play_url: String,
}

#[derive(Debug, Serialize)]
pub struct LotteryResponse {
    pub id: String,
    pub movies: Vec<CandidateMovie>,
    pub result: Option<DrawResult>,
    pub created_at: DateTime<Utc>,
    pub play_url: String,
}

#[derive(Debug, Serialize)]
pub struct LotterySummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub movie_count: usize,
    pub result: Option<DrawResult>,
}

impl From<Lottery> for LotterySummary {
    fn from(lottery: Lottery) -> Self {
        Self {
            id: lottery.id,
            created_at: lottery.created_at,
            movie_count: lottery.movies.len(),
            result: lottery.result,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListLotteriesResponse {
    pub lotteries: Vec<LotterySummary>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

fn wait_path(id: &str) -> String {
    format!("/wait/{}", id)
}

fn play_path(id: &str) -> String {
    format!("/l/{}", id)
}

fn store_error(e: LotteryError) -> ApiError {
    let status = match e {
        LotteryError::NotFound(_) | LotteryError::MovieNotFound(_) => StatusCode::NOT_FOUND,
        LotteryError::Validation(_) => StatusCode::BAD_REQUEST,
        LotteryError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse::new(e.to_string())))
}

fn lottery_not_found(id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(format!("Lottery not found: {}", id))),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /create
pub async fn create_lottery(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateLotteryBody>,
) -> Result<Json<CreateLotteryResponse>, ApiError> {
    let lottery = state
        .store()
        .create(CreateLotteryRequest::new(body.movies))
        .map_err(store_error)?;

    metrics::LOTTERIES_CREATED.inc();
    info!(lottery_id = %lottery.id, movies = lottery.movies.len(), "Lottery created");

    if state.config().downloads.prefetch_on_create {
        if let Some(jobs) = state.jobs() {
            for movie in &lottery.movies {
                jobs.submit(Job::CacheTorrent { movie_id: movie.id });
            }
        }
    }

    Ok(Json(CreateLotteryResponse {
        wait_url: state.public_link(&wait_path(&lottery.id)),
        play_url: state.public_link(&play_path(&lottery.id)),
        lottery_id: lottery.id,
    }))
}

/// GET /api/result/{id}
pub async fn get_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LotteryResponse>, ApiError> {
    let lottery = state
        .store()
        .get(&id)
        .map_err(store_error)?
        .ok_or_else(|| lottery_not_found(&id))?;

    Ok(Json(LotteryResponse {
        play_url: state.public_link(&play_path(&lottery.id)),
        id: lottery.id,
        movies: lottery.movies,
        result: lottery.result,
        created_at: lottery.created_at,
    }))
}

/// GET /api/lotteries
///
/// Every lottery, newest first.
pub async fn list_lotteries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListLotteriesResponse>, ApiError> {
    let lotteries = state.store().list().map_err(store_error)?;
    let total = lotteries.len();
    Ok(Json(ListLotteriesResponse {
        lotteries: lotteries.into_iter().map(LotterySummary::from).collect(),
        total,
    }))
}

/// POST /draw/{id}
///
/// Draws once; later calls return the same winner.
pub async fn draw(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DrawResult>, ApiError> {
    match state.draw_engine().draw(&id) {
        Ok(result) => Ok(Json(result)),
        Err(DrawError::NotFound(_)) => Err(lottery_not_found(&id)),
        Err(e @ DrawError::NoCandidates(_)) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string())),
        )),
        Err(DrawError::Store(e)) => Err(store_error(e)),
    }
}

/// POST /delete-lottery/{id}
pub async fn delete_lottery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> (StatusCode, Json<DeleteResponse>) {
    match state.store().delete(&id) {
        Ok(lottery) => {
            info!(lottery_id = %lottery.id, "Lottery deleted");
            (
                StatusCode::OK,
                Json(DeleteResponse {
                    success: true,
                    message: format!("Lottery {} deleted", lottery.id),
                }),
            )
        }
        Err(e) => {
            let (status, Json(body)) = store_error(e);
            (
                status,
                Json(DeleteResponse {
                    success: false,
                    message: body.error,
                }),
            )
        }
    }
}
