use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::middleware::metrics_middleware;
use super::{downloads, handlers, lotteries};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Versioned service routes
    let api_v1 = Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config));

    Router::new()
        .nest("/api/v1", api_v1)
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        // Movies and lotteries
        .route("/fetch-movie", post(handlers::fetch_movie))
        .route("/create", post(lotteries::create_lottery))
        .route("/api/lotteries", get(lotteries::list_lotteries))
        .route("/api/result/{id}", get(lotteries::get_result))
        .route("/draw/{id}", post(lotteries::draw))
        .route("/delete-lottery/{id}", post(lotteries::delete_lottery))
        // Downloads
        .route(
            "/api/start-download/{lottery_id}",
            post(downloads::start_lottery_download),
        )
        .route(
            "/api/start-download/movie/{movie_id}",
            post(downloads::start_movie_download),
        )
        .route("/api/torrent-status/{key}", get(downloads::torrent_status))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
