//! SQLite-backed lottery store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::{
    generate_lottery_id, CachedTorrent, CandidateMovie, CreateLotteryRequest, DrawResult, Lottery,
    LotteryError, LotteryStore,
};
use crate::metadata::MovieRecord;

/// Attempts at finding an unused identifier before giving up.
const MAX_ID_ATTEMPTS: usize = 32;

const DEFAULT_ID_LENGTH: usize = 6;

const MOVIE_COLUMNS: &str = "id, lottery_id, name, poster, year, description, rating_kp, \
     genres, countries, kinopoisk_id, magnet_link, torrent_quality, torrent_seeders, \
     torrent_updated_at";

/// SQLite-backed lottery store.
pub struct SqliteLotteryStore {
    conn: Mutex<Connection>,
    id_length: usize,
}

fn db_err(e: rusqlite::Error) -> LotteryError {
    LotteryError::Database(e.to_string())
}

/// Fixed-width timestamps so text order equals time order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl SqliteLotteryStore {
    /// Create a new SQLite lottery store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, LotteryError> {
        let conn = Connection::open(path).map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            id_length: DEFAULT_ID_LENGTH,
        })
    }

    /// Create an in-memory SQLite lottery store (useful for testing).
    pub fn in_memory() -> Result<Self, LotteryError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            id_length: DEFAULT_ID_LENGTH,
        })
    }

    /// Length of identifiers generated by `create`.
    pub fn with_id_length(mut self, id_length: usize) -> Self {
        self.id_length = id_length;
        self
    }

    fn initialize_schema(conn: &Connection) -> Result<(), LotteryError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS lotteries (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                result_name TEXT,
                result_poster TEXT,
                result_year INTEGER
            );

            CREATE TABLE IF NOT EXISTS movies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                lottery_id TEXT NOT NULL REFERENCES lotteries(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                name TEXT NOT NULL,
                poster TEXT,
                year INTEGER,
                description TEXT,
                rating_kp REAL,
                genres TEXT NOT NULL DEFAULT '[]',
                countries TEXT NOT NULL DEFAULT '[]',
                kinopoisk_id INTEGER,
                magnet_link TEXT,
                torrent_quality TEXT,
                torrent_seeders INTEGER,
                torrent_updated_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_lotteries_created_at ON lotteries(created_at DESC);
            CREATE INDEX IF NOT EXISTS idx_movies_lottery_id ON movies(lottery_id, position);
            "#,
        )
        .map_err(db_err)?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, LotteryError> {
        self.conn
            .lock()
            .map_err(|_| LotteryError::Database("connection lock poisoned".to_string()))
    }

    fn unused_id(&self, conn: &Connection) -> Result<String, LotteryError> {
        let mut rng = rand::thread_rng();
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = generate_lottery_id(&mut rng, self.id_length);
            let taken: bool = conn
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM lotteries WHERE id = ?1)",
                    params![candidate],
                    |row| row.get(0),
                )
                .map_err(db_err)?;
            if !taken {
                return Ok(candidate);
            }
        }
        Err(LotteryError::Database(
            "could not allocate a unique lottery id".to_string(),
        ))
    }

    fn row_to_movie(row: &rusqlite::Row) -> rusqlite::Result<CandidateMovie> {
        let genres_json: String = row.get(7)?;
        let countries_json: String = row.get(8)?;
        let kinopoisk_id: Option<i64> = row.get(9)?;
        let magnet_link: Option<String> = row.get(10)?;
        let quality: Option<String> = row.get(11)?;
        let seeders: Option<u32> = row.get(12)?;
        let updated_at: Option<String> = row.get(13)?;

        let torrent = magnet_link.map(|magnet_link| CachedTorrent {
            magnet_link,
            quality,
            seeders: seeders.unwrap_or(0),
            updated_at: updated_at
                .as_deref()
                .map(parse_timestamp)
                .unwrap_or_else(Utc::now),
        });

        Ok(CandidateMovie {
            id: row.get(0)?,
            lottery_id: row.get(1)?,
            record: MovieRecord {
                name: row.get(2)?,
                poster: row.get(3)?,
                year: row.get(4)?,
                description: row.get(5)?,
                rating_kp: row.get(6)?,
                genres: serde_json::from_str(&genres_json).unwrap_or_default(),
                countries: serde_json::from_str(&countries_json).unwrap_or_default(),
                kinopoisk_id: kinopoisk_id.and_then(|v| u64::try_from(v).ok()),
            },
            torrent,
        })
    }

    fn load_movies(conn: &Connection, lottery_id: &str) -> Result<Vec<CandidateMovie>, LotteryError> {
        let sql = format!(
            "SELECT {} FROM movies WHERE lottery_id = ?1 ORDER BY position, id",
            MOVIE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let movies = stmt
            .query_map(params![lottery_id], Self::row_to_movie)
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(movies)
    }

    fn load_lottery(conn: &Connection, id: &str) -> Result<Option<Lottery>, LotteryError> {
        let header = conn
            .query_row(
                "SELECT id, created_at, result_name, result_poster, result_year
                 FROM lotteries WHERE id = ?1",
                params![id],
                Self::row_to_header,
            )
            .optional()
            .map_err(db_err)?;

        match header {
            Some(mut lottery) => {
                lottery.movies = Self::load_movies(conn, &lottery.id)?;
                Ok(Some(lottery))
            }
            None => Ok(None),
        }
    }

    /// Lottery row without its movies.
    fn row_to_header(row: &rusqlite::Row) -> rusqlite::Result<Lottery> {
        let created_at: String = row.get(1)?;
        let result_name: Option<String> = row.get(2)?;
        let result = match result_name {
            Some(name) => Some(DrawResult {
                name,
                poster: row.get(3)?,
                year: row.get(4)?,
            }),
            None => None,
        };

        Ok(Lottery {
            id: row.get(0)?,
            created_at: parse_timestamp(&created_at),
            result,
            movies: Vec::new(),
        })
    }
}

impl LotteryStore for SqliteLotteryStore {
    fn create(&self, request: CreateLotteryRequest) -> Result<Lottery, LotteryError> {
        request.validate()?;

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;

        let id = self.unused_id(&tx)?;
        let created_at = Utc::now();

        tx.execute(
            "INSERT INTO lotteries (id, created_at) VALUES (?1, ?2)",
            params![id, format_timestamp(&created_at)],
        )
        .map_err(db_err)?;

        let mut movies = Vec::with_capacity(request.movies.len());
        for (position, record) in request.movies.into_iter().enumerate() {
            let record = record.truncated();
            let genres = serde_json::to_string(&record.genres)
                .map_err(|e| LotteryError::Database(e.to_string()))?;
            let countries = serde_json::to_string(&record.countries)
                .map_err(|e| LotteryError::Database(e.to_string()))?;

            tx.execute(
                "INSERT INTO movies (lottery_id, position, name, poster, year, description,
                    rating_kp, genres, countries, kinopoisk_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    id,
                    position as i64,
                    record.name,
                    record.poster,
                    record.year,
                    record.description,
                    record.rating_kp,
                    genres,
                    countries,
                    record.kinopoisk_id.map(|v| v as i64),
                ],
            )
            .map_err(db_err)?;

            movies.push(CandidateMovie {
                id: tx.last_insert_rowid(),
                lottery_id: id.clone(),
                record,
                torrent: None,
            });
        }

        tx.commit().map_err(db_err)?;

        Ok(Lottery {
            id,
            created_at,
            result: None,
            movies,
        })
    }

    fn get(&self, id: &str) -> Result<Option<Lottery>, LotteryError> {
        let conn = self.lock()?;
        Self::load_lottery(&conn, id)
    }

    fn list(&self) -> Result<Vec<Lottery>, LotteryError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, created_at, result_name, result_poster, result_year
                 FROM lotteries ORDER BY created_at DESC, rowid DESC",
            )
            .map_err(db_err)?;

        let headers = stmt
            .query_map([], Self::row_to_header)
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;

        headers
            .into_iter()
            .map(|mut lottery| {
                lottery.movies = Self::load_movies(&conn, &lottery.id)?;
                Ok(lottery)
            })
            .collect()
    }

    fn set_result(&self, id: &str, result: &DrawResult) -> Result<DrawResult, LotteryError> {
        let conn = self.lock()?;

        let updated = conn
            .execute(
                "UPDATE lotteries SET result_name = ?1, result_poster = ?2, result_year = ?3
                 WHERE id = ?4 AND result_name IS NULL",
                params![result.name, result.poster, result.year, id],
            )
            .map_err(db_err)?;

        if updated == 0 {
            debug!(lottery_id = %id, "Result not written, lottery missing or already drawn");
        }

        let stored = conn
            .query_row(
                "SELECT result_name, result_poster, result_year FROM lotteries WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<u16>>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(db_err)?;

        match stored {
            None => Err(LotteryError::NotFound(id.to_string())),
            Some((Some(name), poster, year)) => Ok(DrawResult { name, poster, year }),
            Some((None, _, _)) => Err(LotteryError::Database(format!(
                "result for lottery {} was not persisted",
                id
            ))),
        }
    }

    fn delete(&self, id: &str) -> Result<Lottery, LotteryError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;

        let lottery =
            Self::load_lottery(&tx, id)?.ok_or_else(|| LotteryError::NotFound(id.to_string()))?;

        tx.execute("DELETE FROM movies WHERE lottery_id = ?1", params![id])
            .map_err(db_err)?;
        tx.execute("DELETE FROM lotteries WHERE id = ?1", params![id])
            .map_err(db_err)?;
        tx.commit().map_err(db_err)?;

        Ok(lottery)
    }

    fn get_movie(&self, movie_id: i64) -> Result<Option<CandidateMovie>, LotteryError> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM movies WHERE id = ?1", MOVIE_COLUMNS);
        conn.query_row(&sql, params![movie_id], Self::row_to_movie)
            .optional()
            .map_err(db_err)
    }

    fn update_movie_torrent(
        &self,
        movie_id: i64,
        torrent: &CachedTorrent,
    ) -> Result<(), LotteryError> {
        let conn = self.lock()?;
        let updated = conn
            .execute(
                "UPDATE movies SET magnet_link = ?1, torrent_quality = ?2, torrent_seeders = ?3,
                    torrent_updated_at = ?4
                 WHERE id = ?5",
                params![
                    torrent.magnet_link,
                    torrent.quality,
                    torrent.seeders,
                    format_timestamp(&torrent.updated_at),
                    movie_id,
                ],
            )
            .map_err(db_err)?;

        if updated == 0 {
            return Err(LotteryError::MovieNotFound(movie_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::tempdir;

    fn create_test_store() -> SqliteLotteryStore {
        SqliteLotteryStore::in_memory().unwrap()
    }

    fn create_test_request() -> CreateLotteryRequest {
        CreateLotteryRequest::new(vec![
            MovieRecord {
                name: "Мы, нижеподписавшиеся".to_string(),
                poster: Some("https://image.example/1.jpg".to_string()),
                year: Some(1980),
                description: Some("Comedy on a night train".to_string()),
                rating_kp: Some(8.1),
                genres: vec!["комедия".to_string(), "драма".to_string()],
                countries: vec!["СССР".to_string()],
                kinopoisk_id: Some(44_168),
            },
            MovieRecord::named("Stalker").with_year(1979),
            MovieRecord::named("Solaris").with_year(1972),
        ])
    }

    fn sample_result() -> DrawResult {
        DrawResult {
            name: "Stalker".to_string(),
            poster: None,
            year: Some(1979),
        }
    }

    #[test]
    fn test_create_lottery() {
        let store = create_test_store();
        let lottery = store.create(create_test_request()).unwrap();

        assert_eq!(lottery.id.len(), 6);
        assert!(lottery.result.is_none());
        assert_eq!(lottery.movies.len(), 3);
        assert!(lottery.movies.iter().all(|m| m.lottery_id == lottery.id));
        assert_eq!(lottery.movies[0].record.name, "Мы, нижеподписавшиеся");
    }

    #[test]
    fn test_create_with_custom_id_length() {
        let store = create_test_store().with_id_length(10);
        let lottery = store.create(create_test_request()).unwrap();
        assert_eq!(lottery.id.len(), 10);
    }

    #[test]
    fn test_create_rejects_single_candidate() {
        let store = create_test_store();
        let result = store.create(CreateLotteryRequest::new(vec![MovieRecord::named("Stalker")]));
        assert!(matches!(result, Err(LotteryError::Validation(_))));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_create_generates_unique_ids() {
        let store = create_test_store().with_id_length(4);
        let ids: HashSet<_> = (0..50)
            .map(|_| store.create(create_test_request()).unwrap().id)
            .collect();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn test_get_lottery_roundtrips_metadata() {
        let store = create_test_store();
        let created = store.create(create_test_request()).unwrap();
        let fetched = store.get(&created.id).unwrap().unwrap();

        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.movies, created.movies);
        let first = &fetched.movies[0].record;
        assert_eq!(first.genres, vec!["комедия", "драма"]);
        assert_eq!(first.countries, vec!["СССР"]);
        assert_eq!(first.kinopoisk_id, Some(44_168));
        assert_eq!(first.rating_kp, Some(8.1));
    }

    #[test]
    fn test_get_unknown_lottery() {
        let store = create_test_store();
        assert!(store.get("nope00").unwrap().is_none());
    }

    #[test]
    fn test_list_newest_first() {
        let store = create_test_store();
        let first = store.create(create_test_request()).unwrap();
        let second = store.create(create_test_request()).unwrap();
        let third = store.create(create_test_request()).unwrap();

        let ids: Vec<_> = store.list().unwrap().into_iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);
    }

    #[test]
    fn test_set_result_first_writer_wins() {
        let store = create_test_store();
        let lottery = store.create(create_test_request()).unwrap();

        let stored = store.set_result(&lottery.id, &sample_result()).unwrap();
        assert_eq!(stored, sample_result());

        let other = DrawResult {
            name: "Solaris".to_string(),
            poster: None,
            year: Some(1972),
        };
        let stored_again = store.set_result(&lottery.id, &other).unwrap();
        assert_eq!(stored_again, sample_result());

        let fetched = store.get(&lottery.id).unwrap().unwrap();
        assert_eq!(fetched.result, Some(sample_result()));
    }

    #[test]
    fn test_set_result_unknown_lottery() {
        let store = create_test_store();
        let result = store.set_result("nope00", &sample_result());
        assert!(matches!(result, Err(LotteryError::NotFound(_))));
    }

    #[test]
    fn test_delete_cascades_to_movies() {
        let store = create_test_store();
        let lottery = store.create(create_test_request()).unwrap();
        let movie_id = lottery.movies[0].id;

        let deleted = store.delete(&lottery.id).unwrap();
        assert_eq!(deleted.id, lottery.id);
        assert_eq!(deleted.movies.len(), 3);

        assert!(store.get(&lottery.id).unwrap().is_none());
        assert!(store.get_movie(movie_id).unwrap().is_none());
    }

    #[test]
    fn test_delete_unknown_lottery() {
        let store = create_test_store();
        assert!(matches!(
            store.delete("nope00"),
            Err(LotteryError::NotFound(_))
        ));
    }

    #[test]
    fn test_update_movie_torrent() {
        let store = create_test_store();
        let lottery = store.create(create_test_request()).unwrap();
        let movie_id = lottery.movies[1].id;

        let torrent = CachedTorrent {
            magnet_link: "magnet:?xt=urn:btih:AAA".to_string(),
            quality: Some("1080p".to_string()),
            seeders: 42,
            updated_at: Utc::now(),
        };
        store.update_movie_torrent(movie_id, &torrent).unwrap();

        let movie = store.get_movie(movie_id).unwrap().unwrap();
        let cached = movie.torrent.unwrap();
        assert_eq!(cached.magnet_link, torrent.magnet_link);
        assert_eq!(cached.quality.as_deref(), Some("1080p"));
        assert_eq!(cached.seeders, 42);
        assert_eq!(
            format_timestamp(&cached.updated_at),
            format_timestamp(&torrent.updated_at)
        );

        // Other candidates are untouched.
        let other = store.get_movie(lottery.movies[0].id).unwrap().unwrap();
        assert!(other.torrent.is_none());
    }

    #[test]
    fn test_update_unknown_movie_torrent() {
        let store = create_test_store();
        let torrent = CachedTorrent {
            magnet_link: "magnet:?xt=urn:btih:AAA".to_string(),
            quality: None,
            seeders: 1,
            updated_at: Utc::now(),
        };
        assert!(matches!(
            store.update_movie_torrent(999, &torrent),
            Err(LotteryError::MovieNotFound(999))
        ));
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lottery.db");

        let id = {
            let store = SqliteLotteryStore::new(&path).unwrap();
            let lottery = store.create(create_test_request()).unwrap();
            store.set_result(&lottery.id, &sample_result()).unwrap();
            lottery.id
        };

        let store = SqliteLotteryStore::new(&path).unwrap();
        let lottery = store.get(&id).unwrap().unwrap();
        assert_eq!(lottery.result, Some(sample_result()));
        assert_eq!(lottery.movies.len(), 3);
    }
}
