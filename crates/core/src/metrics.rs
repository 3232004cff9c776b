//! Prometheus metrics for core components.
//!
//! The server registers everything returned by [`all_metrics`] into its
//! registry at startup.

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Lotteries
// =============================================================================

/// Lotteries created.
pub static LOTTERIES_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("lottery_lotteries_created_total", "Total lotteries created").unwrap()
});

/// Draw requests by outcome.
pub static DRAWS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("lottery_draws_total", "Total draw requests"),
        &["outcome"], // "drawn", "existing"
    )
    .unwrap()
});

// =============================================================================
// Torrent discovery
// =============================================================================

/// Discovery runs by outcome.
pub static DISCOVERY_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("lottery_discovery_total", "Total torrent discovery runs"),
        &["outcome"], // "found", "not_found"
    )
    .unwrap()
});

/// Provider failures, counted per provider.
pub static PROVIDER_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "lottery_provider_errors_total",
            "Total torrent provider failures",
        ),
        &["provider"],
    )
    .unwrap()
});

// =============================================================================
// Download client
// =============================================================================

/// Download dispatches by outcome.
pub static DOWNLOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("lottery_downloads_total", "Total download dispatches"),
        &["outcome"], // "started", "already_tracked", "not_found", "failed"
    )
    .unwrap()
});

/// Duration of a full dispatch, including discovery.
pub static DOWNLOAD_DISPATCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "lottery_download_dispatch_duration_seconds",
            "Duration of download dispatch including torrent discovery",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["outcome"],
    )
    .unwrap()
});

/// Status polls by outcome.
pub static STATUS_POLLS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("lottery_status_polls_total", "Total transfer status polls"),
        &["outcome"], // "active", "not_found", "error"
    )
    .unwrap()
});

/// Collect all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(LOTTERIES_CREATED.clone()),
        Box::new(DRAWS_TOTAL.clone()),
        Box::new(DISCOVERY_TOTAL.clone()),
        Box::new(PROVIDER_ERRORS.clone()),
        Box::new(DOWNLOADS_TOTAL.clone()),
        Box::new(DOWNLOAD_DISPATCH_DURATION.clone()),
        Box::new(STATUS_POLLS_TOTAL.clone()),
    ]
}
