//! Best-effort torrent discovery over an ordered chain of providers.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::magnet::build_magnet;
use super::{Searcher, TorrentCandidate, TorrentMatch};
use crate::metrics;

/// Query variants for a movie, most specific first.
pub fn build_queries(title: &str, year: Option<u16>) -> Vec<String> {
    let title = title.trim();
    match year {
        Some(year) => vec![format!("{} {}", title, year), title.to_string()],
        None => vec![title.to_string()],
    }
}

/// The candidate with the strictly highest seeder count; ties keep the first seen.
pub fn select_best(candidates: &[TorrentCandidate]) -> Option<&TorrentCandidate> {
    candidates.iter().fold(None, |best, candidate| match best {
        Some(b) if candidate.seeders <= b.seeders => Some(b),
        _ => Some(candidate),
    })
}

/// Finds a magnet link for a movie by trying providers in priority order.
pub struct TorrentDiscovery {
    providers: Vec<Arc<dyn Searcher>>,
    trackers: Vec<String>,
}

impl TorrentDiscovery {
    pub fn new(providers: Vec<Arc<dyn Searcher>>, trackers: Vec<String>) -> Self {
        Self {
            providers,
            trackers,
        }
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Find the best torrent for a movie.
    ///
    /// The first provider and query variant yielding usable candidates
    /// decides the result. Provider failures count as zero results.
    pub async fn find_best_torrent(&self, title: &str, year: Option<u16>) -> Option<TorrentMatch> {
        if title.trim().is_empty() {
            return None;
        }
        let queries = build_queries(title, year);

        for provider in &self.providers {
            for query in &queries {
                let candidates = match provider.search(query).await {
                    Ok(candidates) => candidates,
                    Err(e) => {
                        warn!(provider = provider.name(), query = %query, error = %e, "Torrent provider failed");
                        metrics::PROVIDER_ERRORS
                            .with_label_values(&[provider.name()])
                            .inc();
                        break;
                    }
                };

                let usable: Vec<TorrentCandidate> = candidates
                    .into_iter()
                    .filter(|c| !c.is_placeholder())
                    .collect();
                debug!(provider = provider.name(), query = %query, results = usable.len(), "Provider results");

                if let Some(best) = select_best(&usable) {
                    let found = self.to_match(best);
                    info!(
                        provider = provider.name(),
                        title = %found.title,
                        seeders = found.seeders,
                        "Torrent found"
                    );
                    metrics::DISCOVERY_TOTAL.with_label_values(&["found"]).inc();
                    return Some(found);
                }
            }
        }

        info!(title = %title, year = ?year, "No torrent found");
        metrics::DISCOVERY_TOTAL
            .with_label_values(&["not_found"])
            .inc();
        None
    }

    fn to_match(&self, candidate: &TorrentCandidate) -> TorrentMatch {
        let magnet_link = match &candidate.magnet_uri {
            Some(uri) if !uri.is_empty() => uri.clone(),
            _ => build_magnet(&candidate.info_hash, &candidate.title, &self.trackers),
        };
        TorrentMatch {
            title: candidate.title.clone(),
            magnet_link,
            seeders: candidate.seeders,
            quality: candidate.quality.clone(),
            provider: candidate.provider.clone(),
        }
    }
}
