//! Download and transfer status handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;

use lottery_core::{
    category_for_key, DispatchError, DownloadTarget, Job, TransferSnapshot, TransferStatus,
};

use crate::state::AppState;

const MSG_CLIENT_NOT_CONFIGURED: &str = "Download client not configured";
const MSG_BACKGROUND: &str = "Download search started in background";
const MSG_QUEUE_FULL: &str = "Download queue is full, try again later";

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub success: bool,
    pub message: String,
}

impl DownloadResponse {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Body of `/api/torrent-status/{key}`. Always served with 200.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TorrentStatusResponse {
    Active(TransferSnapshot),
    Inactive {
        status: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl From<TransferStatus> for TorrentStatusResponse {
    fn from(status: TransferStatus) -> Self {
        match status {
            TransferStatus::Active(snapshot) => TorrentStatusResponse::Active(snapshot),
            TransferStatus::NotFound => TorrentStatusResponse::Inactive {
                status: "not_found",
                message: None,
            },
            TransferStatus::Error(message) => TorrentStatusResponse::Inactive {
                status: "error",
                message: Some(message),
            },
        }
    }
}

fn dispatch_error(e: DispatchError) -> (StatusCode, Json<DownloadResponse>) {
    let status = match &e {
        DispatchError::NotFound(_) => StatusCode::NOT_FOUND,
        DispatchError::NotDrawn(_) => StatusCode::BAD_REQUEST,
        DispatchError::ClientUnavailable(_)
        | DispatchError::SubmissionFailed(_)
        | DispatchError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(DownloadResponse::failed(e.to_string())))
}

async fn start(state: &AppState, target: DownloadTarget) -> (StatusCode, Json<DownloadResponse>) {
    let Some(dispatcher) = state.dispatcher() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(DownloadResponse::failed(MSG_CLIENT_NOT_CONFIGURED)),
        );
    };

    if state.background_downloads() {
        // Resolve up front so unknown or undrawn targets still fail fast.
        if let Err(e) = dispatcher.resolve(&target) {
            return dispatch_error(e);
        }
        let queued = state
            .jobs()
            .map(|jobs| {
                jobs.submit(Job::StartDownload {
                    target: target.clone(),
                })
            })
            .unwrap_or(false);

        return if queued {
            info!(download = %target, "Download queued");
            (StatusCode::OK, Json(DownloadResponse::ok(MSG_BACKGROUND)))
        } else {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(DownloadResponse::failed(MSG_QUEUE_FULL)),
            )
        };
    }

    match dispatcher.start_download(&target).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(DownloadResponse {
                success: outcome.started(),
                message: outcome.message,
            }),
        ),
        Err(e) => dispatch_error(e),
    }
}

/// POST /api/start-download/{lottery_id}
///
/// Download the drawn winner of a lottery.
pub async fn start_lottery_download(
    State(state): State<Arc<AppState>>,
    Path(lottery_id): Path<String>,
) -> (StatusCode, Json<DownloadResponse>) {
    start(&state, DownloadTarget::Lottery(lottery_id)).await
}

/// POST /api/start-download/movie/{movie_id}
///
/// Download one candidate regardless of any draw.
pub async fn start_movie_download(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<i64>,
) -> (StatusCode, Json<DownloadResponse>) {
    start(&state, DownloadTarget::Movie(movie_id)).await
}

/// GET /api/torrent-status/{key}
pub async fn torrent_status(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> (StatusCode, Json<TorrentStatusResponse>) {
    let Some(poller) = state.poller() else {
        return (
            StatusCode::OK,
            Json(TransferStatus::Error(MSG_CLIENT_NOT_CONFIGURED.to_string()).into()),
        );
    };

    let status = poller.get_status(&category_for_key(&key)).await;
    (StatusCode::OK, Json(status.into()))
}
