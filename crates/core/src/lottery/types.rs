use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metadata::MovieRecord;

/// The drawn movie, copied from the winning candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrawResult {
    pub name: String,
    pub poster: Option<String>,
    pub year: Option<u16>,
}

/// Torrent found for a candidate ahead of time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedTorrent {
    pub magnet_link: String,
    pub quality: Option<String>,
    pub seeders: u32,
    pub updated_at: DateTime<Utc>,
}

/// A movie entered into a lottery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateMovie {
    pub id: i64,
    pub lottery_id: String,
    /// Metadata snapshot taken when the lottery was created.
    #[serde(flatten)]
    pub record: MovieRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub torrent: Option<CachedTorrent>,
}

impl CandidateMovie {
    pub fn to_result(&self) -> DrawResult {
        DrawResult {
            name: self.record.name.clone(),
            poster: self.record.poster.clone(),
            year: self.record.year,
        }
    }

    fn matches(&self, result: &DrawResult) -> bool {
        self.record.name == result.name && self.record.year == result.year
    }
}

/// A lottery with its candidates, in creation order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lottery {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub result: Option<DrawResult>,
    pub movies: Vec<CandidateMovie>,
}

impl Lottery {
    pub fn is_drawn(&self) -> bool {
        self.result.is_some()
    }

    /// The candidate the stored result was copied from.
    pub fn winner(&self) -> Option<&CandidateMovie> {
        let result = self.result.as_ref()?;
        self.movies.iter().find(|m| m.matches(result))
    }
}
