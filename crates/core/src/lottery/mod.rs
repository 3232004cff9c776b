//! Lotteries, their candidate movies and the persisted draw result.

mod id;
mod sqlite_store;
mod store;
mod types;

pub use id::{generate_lottery_id, LOTTERY_ID_ALPHABET};
pub use sqlite_store::SqliteLotteryStore;
pub use store::{CreateLotteryRequest, LotteryError, LotteryStore, MIN_CANDIDATES};
pub use types::{CachedTorrent, CandidateMovie, DrawResult, Lottery};
