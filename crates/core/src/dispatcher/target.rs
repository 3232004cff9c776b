use std::fmt;

use serde::{Deserialize, Serialize};

const LOTTERY_PREFIX: &str = "lottery-";
const MOVIE_PREFIX: &str = "movie-";

/// What to download: a lottery's winner or one specific candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DownloadTarget {
    Lottery(String),
    Movie(i64),
}

impl DownloadTarget {
    /// Download-client category that tracks this target's transfer.
    pub fn category(&self) -> String {
        match self {
            DownloadTarget::Lottery(id) => format!("{}{}", LOTTERY_PREFIX, id),
            DownloadTarget::Movie(id) => format!("{}{}", MOVIE_PREFIX, id),
        }
    }
}

impl fmt::Display for DownloadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.category())
    }
}

/// Category for a status key.
///
/// Keys that already carry a category prefix are used verbatim; bare keys are
/// lottery ids.
pub fn category_for_key(key: &str) -> String {
    if key.starts_with(LOTTERY_PREFIX) || key.starts_with(MOVIE_PREFIX) {
        key.to_string()
    } else {
        format!("{}{}", LOTTERY_PREFIX, key)
    }
}
