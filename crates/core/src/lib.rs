pub mod config;
pub mod dispatcher;
pub mod draw;
pub mod jobs;
pub mod lottery;
pub mod metadata;
pub mod metrics;
pub mod poller;
pub mod searcher;
pub mod torrent_client;

pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DispatchMode,
    SanitizedConfig,
};
pub use dispatcher::{
    category_for_key, DispatchError, DispatchOutcome, DispatchStatus, DownloadDispatcher,
    DownloadTarget,
};
pub use draw::{DrawEngine, DrawError};
pub use jobs::{create_job_system, Job, JobHandle, JobWorker};
pub use lottery::{
    CachedTorrent, CandidateMovie, CreateLotteryRequest, DrawResult, Lottery, LotteryError,
    LotteryStore, SqliteLotteryStore,
};
pub use metadata::{KinopoiskClient, MetadataError, MetadataLookup, MovieRecord};
pub use poller::{StatusPoller, TransferSnapshot, TransferStatus};
pub use searcher::{build_discovery, TorrentDiscovery, TorrentMatch};
pub use torrent_client::{create_torrent_client, TorrentClient, TorrentClientError};
