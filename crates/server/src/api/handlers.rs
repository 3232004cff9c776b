//! Health, config, metrics and metadata lookup handlers.

use axum::{extract::State, http::header, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use lottery_core::{MetadataError, MovieRecord, SanitizedConfig};

use crate::metrics::encode_metrics;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FetchMovieBody {
    #[serde(default)]
    pub query: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// GET /metrics
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

/// POST /fetch-movie
///
/// Resolve a title or kinopoisk.ru URL into movie metadata.
pub async fn fetch_movie(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FetchMovieBody>,
) -> Result<Json<MovieRecord>, (StatusCode, Json<ErrorResponse>)> {
    let Some(metadata) = state.metadata() else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("Movie metadata lookup not configured")),
        ));
    };

    match metadata.search(&body.query).await {
        Ok(Some(movie)) => Ok(Json(movie)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Movie not found")),
        )),
        Err(MetadataError::EmptyQuery) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Search query is empty")),
        )),
        Err(e @ MetadataError::NotConfigured(_)) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new(e.to_string())),
        )),
        Err(e) => {
            tracing::warn!(source = metadata.name(), error = %e, "Movie lookup failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(format!("Movie lookup failed: {}", e))),
            ))
        }
    }
}
