use serde::{Deserialize, Serialize};

/// Genres kept per movie.
pub const MAX_GENRES: usize = 3;
/// Countries kept per movie.
pub const MAX_COUNTRIES: usize = 3;

/// Normalized movie metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieRecord {
    pub name: String,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rating_kp: Option<f64>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub kinopoisk_id: Option<u64>,
}

impl MovieRecord {
    /// Minimal record with only a title, as typed by a user.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            poster: None,
            year: None,
            description: None,
            rating_kp: None,
            genres: Vec::new(),
            countries: Vec::new(),
            kinopoisk_id: None,
        }
    }

    pub fn with_year(mut self, year: u16) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_poster(mut self, poster: impl Into<String>) -> Self {
        self.poster = Some(poster.into());
        self
    }

    /// Cap genre and country lists.
    pub fn truncated(mut self) -> Self {
        self.genres.truncate(MAX_GENRES);
        self.countries.truncate(MAX_COUNTRIES);
        self
    }
}
