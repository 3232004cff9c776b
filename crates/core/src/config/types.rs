use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub lottery: LotteryConfig,
    /// Movie metadata lookup. Without it `/fetch-movie` is unavailable.
    #[serde(default)]
    pub metadata: Option<MetadataConfig>,
    #[serde(default)]
    pub searcher: SearcherConfig,
    /// Download client. Without it download endpoints are unavailable.
    #[serde(default)]
    pub torrent_client: Option<TorrentClientConfig>,
    #[serde(default)]
    pub downloads: DownloadsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("lottery.db")
}

/// Lottery creation settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LotteryConfig {
    /// Length of generated lottery identifiers.
    #[serde(default = "default_id_length")]
    pub id_length: usize,
    /// Externally reachable base URL, used to build shareable links.
    #[serde(default)]
    pub public_url: Option<String>,
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            id_length: default_id_length(),
            public_url: None,
        }
    }
}

fn default_id_length() -> usize {
    6
}

/// Kinopoisk (kinopoisk.dev) metadata API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetadataConfig {
    /// Base URL of the movie endpoint
    #[serde(default = "default_kinopoisk_url")]
    pub api_url: String,
    /// API key sent as `X-API-KEY`
    pub api_key: String,
    /// Request timeout in seconds (default: 15)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_kinopoisk_url() -> String {
    "https://api.kinopoisk.dev/v1.4/movie".to_string()
}

fn default_timeout() -> u32 {
    15
}

/// Torrent discovery configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearcherConfig {
    /// Request timeout applied to every provider, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Providers in priority order
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
    /// Announce trackers appended to synthesized magnet links, in order
    #[serde(default = "default_trackers")]
    pub trackers: Vec<String>,
}

impl Default for SearcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            providers: default_providers(),
            trackers: default_trackers(),
        }
    }
}

/// A single search provider
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// The Pirate Bay JSON API
    Apibay {
        #[serde(default = "default_apibay_url")]
        url: String,
    },
    /// YTS movie API
    Yts {
        #[serde(default = "default_yts_url")]
        url: String,
    },
    /// Self-hosted Jackett aggregator
    Jackett(JackettConfig),
}

impl ProviderConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderConfig::Apibay { .. } => "apibay",
            ProviderConfig::Yts { .. } => "yts",
            ProviderConfig::Jackett(_) => "jackett",
        }
    }
}

/// Jackett search backend configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct JackettConfig {
    /// Jackett server URL (e.g., "http://localhost:9117")
    pub url: String,
    /// Jackett API key
    pub api_key: String,
    /// Indexer to query, "all" aggregates every configured indexer
    #[serde(default = "default_jackett_indexer")]
    pub indexer: String,
}

fn default_jackett_indexer() -> String {
    "all".to_string()
}

fn default_apibay_url() -> String {
    "https://apibay.org".to_string()
}

fn default_yts_url() -> String {
    "https://yts.mx".to_string()
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::Apibay {
            url: default_apibay_url(),
        },
        ProviderConfig::Yts {
            url: default_yts_url(),
        },
    ]
}

fn default_trackers() -> Vec<String> {
    [
        "udp://tracker.opentrackr.org:1337/announce",
        "udp://open.stealth.si:80/announce",
        "udp://tracker.torrent.eu.org:451/announce",
        "udp://exodus.desync.com:6969/announce",
        "udp://tracker.openbittorrent.com:6969/announce",
        "udp://open.demonii.com:1337/announce",
        "udp://explodie.org:6969/announce",
        "udp://tracker.tiny-vps.com:6969/announce",
    ]
    .iter()
    .map(|t| t.to_string())
    .collect()
}

/// Download client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TorrentClientConfig {
    /// Client backend type
    pub backend: TorrentClientBackend,
    /// qBittorrent-specific configuration (required when backend = "qbittorrent")
    #[serde(default)]
    pub qbittorrent: Option<QBittorrentConfig>,
}

/// Available download client backends
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TorrentClientBackend {
    Qbittorrent,
}

/// qBittorrent Web API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QBittorrentConfig {
    /// WebUI URL (e.g., "http://localhost:8080")
    pub url: String,
    pub username: String,
    pub password: String,
    /// Save path passed with every added torrent
    #[serde(default)]
    pub download_path: Option<String>,
    /// Request timeout in seconds (default: 15)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

/// How download requests are executed
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Discovery and submission finish before the request returns
    #[default]
    Sync,
    /// The request is acknowledged and the work goes to the job queue
    Background,
}

/// Download pipeline settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadsConfig {
    #[serde(default)]
    pub mode: DispatchMode,
    /// Search torrents for every candidate as soon as a lottery is created
    #[serde(default)]
    pub prefetch_on_create: bool,
    /// Capacity of the background job queue
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            mode: DispatchMode::default(),
            prefetch_on_create: false,
            queue_size: default_queue_size(),
        }
    }
}

fn default_queue_size() -> usize {
    64
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub lottery: LotteryConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SanitizedMetadataConfig>,
    pub searcher: SanitizedSearcherConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torrent_client: Option<SanitizedTorrentClientConfig>,
    pub downloads: DownloadsConfig,
}

/// Sanitized metadata config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedMetadataConfig {
    pub api_url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSearcherConfig {
    pub timeout_secs: u32,
    pub providers: Vec<SanitizedProviderConfig>,
    pub trackers: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProviderConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_configured: Option<bool>,
}

/// Sanitized download client config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTorrentClientConfig {
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub password_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            lottery: config.lottery.clone(),
            metadata: config.metadata.as_ref().map(|m| SanitizedMetadataConfig {
                api_url: m.api_url.clone(),
                api_key_configured: !m.api_key.is_empty(),
                timeout_secs: m.timeout_secs,
            }),
            searcher: SanitizedSearcherConfig {
                timeout_secs: config.searcher.timeout_secs,
                providers: config
                    .searcher
                    .providers
                    .iter()
                    .map(|p| match p {
                        ProviderConfig::Apibay { url } | ProviderConfig::Yts { url } => {
                            SanitizedProviderConfig {
                                kind: p.kind().to_string(),
                                url: url.clone(),
                                api_key_configured: None,
                            }
                        }
                        ProviderConfig::Jackett(j) => SanitizedProviderConfig {
                            kind: p.kind().to_string(),
                            url: j.url.clone(),
                            api_key_configured: Some(!j.api_key.is_empty()),
                        },
                    })
                    .collect(),
                trackers: config.searcher.trackers.clone(),
            },
            torrent_client: config
                .torrent_client
                .as_ref()
                .map(|c| SanitizedTorrentClientConfig {
                    backend: match c.backend {
                        TorrentClientBackend::Qbittorrent => "qbittorrent".to_string(),
                    },
                    url: c.qbittorrent.as_ref().map(|q| q.url.clone()),
                    password_configured: c
                        .qbittorrent
                        .as_ref()
                        .is_some_and(|q| !q.password.is_empty()),
                }),
            downloads: config.downloads.clone(),
        }
    }
}
