//! Torrent discovery.
//!
//! Each provider implements [`Searcher`]. [`TorrentDiscovery`] walks the
//! configured providers in priority order and picks the best-seeded listing.

mod apibay;
mod discovery;
mod jackett;
mod magnet;
mod types;
mod yts;

use std::sync::Arc;

pub use apibay::ApibaySearcher;
pub use discovery::{build_queries, select_best, TorrentDiscovery};
pub use jackett::JackettSearcher;
pub use magnet::{build_magnet, extract_info_hash};
pub use types::*;
pub use yts::YtsSearcher;

use crate::config::{ProviderConfig, SearcherConfig};

/// Instantiate the configured providers, keeping their order.
pub fn build_searchers(config: &SearcherConfig) -> Result<Vec<Arc<dyn Searcher>>, SearchError> {
    config
        .providers
        .iter()
        .map(|provider| {
            let searcher: Arc<dyn Searcher> = match provider {
                ProviderConfig::Apibay { url } => {
                    Arc::new(ApibaySearcher::new(url, config.timeout_secs)?)
                }
                ProviderConfig::Yts { url } => Arc::new(YtsSearcher::new(url, config.timeout_secs)?),
                ProviderConfig::Jackett(jackett) => {
                    Arc::new(JackettSearcher::new(jackett.clone(), config.timeout_secs)?)
                }
            };
            Ok(searcher)
        })
        .collect()
}

/// Build the discovery chain from configuration.
pub fn build_discovery(config: &SearcherConfig) -> Result<TorrentDiscovery, SearchError> {
    Ok(TorrentDiscovery::new(
        build_searchers(config)?,
        config.trackers.clone(),
    ))
}
