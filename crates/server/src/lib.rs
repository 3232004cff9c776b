//! HTTP server for movie lotteries.

pub mod api;
pub mod metrics;
pub mod state;
