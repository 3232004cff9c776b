//! Testing utilities and mock implementations.
//!
//! Mocks for every external service trait, so lotteries can be exercised
//! end to end without a movie database, torrent providers or a download
//! client.
//!
//! # Example
//!
//! ```rust,ignore
//! use lottery_core::testing::{fixtures, MockSearcher, MockTorrentClient};
//!
//! let searcher = MockSearcher::named("apibay");
//! searcher.add_results("Stalker 1979", vec![fixtures::candidate("Stalker", "abc", 10)]);
//!
//! let client = MockTorrentClient::new();
//! // Wire both into a DownloadDispatcher...
//! ```

mod mock_metadata;
mod mock_searcher;
mod mock_torrent_client;

pub use mock_metadata::MockMetadataLookup;
pub use mock_searcher::MockSearcher;
pub use mock_torrent_client::MockTorrentClient;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::metadata::MovieRecord;
    use crate::searcher::TorrentCandidate;
    use crate::torrent_client::TorrentInfo;

    /// A provider result with a bare info hash and no quality tag.
    pub fn candidate(title: &str, info_hash: &str, seeders: u32) -> TorrentCandidate {
        TorrentCandidate {
            title: title.to_string(),
            info_hash: info_hash.to_string(),
            magnet_uri: None,
            seeders,
            leechers: 0,
            size_bytes: 1024 * 1024 * 1024 * 2, // 2 GB
            quality: None,
            provider: "mock".to_string(),
        }
    }

    /// A fully populated movie record.
    pub fn movie(name: &str, year: u16) -> MovieRecord {
        MovieRecord {
            name: name.to_string(),
            poster: Some(format!(
                "https://image.example/{}.jpg",
                name.to_lowercase().replace(' ', "-")
            )),
            year: Some(year),
            description: Some(format!("A film called {}.", name)),
            rating_kp: Some(7.9),
            genres: vec!["драма".to_string()],
            countries: vec!["СССР".to_string()],
            kinopoisk_id: None,
        }
    }

    /// Two or more movies ready for a lottery.
    pub fn movies(names: &[(&str, u16)]) -> Vec<MovieRecord> {
        names.iter().map(|(name, year)| movie(name, *year)).collect()
    }

    /// A torrent that is partway through downloading.
    pub fn torrent_info(hash: &str, category: &str, progress: f64) -> TorrentInfo {
        TorrentInfo {
            hash: hash.to_string(),
            name: format!("Torrent {}", hash),
            state_label: "downloading".to_string(),
            progress,
            download_speed: 2 * 1024 * 1024,
            seeders: 12,
            leechers: 4,
            eta_secs: Some(3900),
            category: Some(category.to_string()),
        }
    }
}
