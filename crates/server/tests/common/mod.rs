//! Common test utilities for API testing with mocks.
//!
//! Builds the full router in-process with mock providers, a mock download
//! client and a mock metadata lookup injected.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use lottery_core::{
    create_job_system,
    searcher::Searcher,
    testing::{MockMetadataLookup, MockSearcher, MockTorrentClient},
    config::DatabaseConfig, Config, DispatchMode, LotteryStore, MetadataLookup, SqliteLotteryStore,
    TorrentClient, TorrentDiscovery,
};
use lottery_server::state::AppState;

/// Re-export fixtures for test convenience
pub use lottery_core::testing::fixtures;

/// Test fixture with fully controllable mocks.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new().await;
/// let response = fixture.post("/create", json!({"movies": [...]})).await;
/// assert_eq!(response.status, StatusCode::OK);
/// ```
pub struct TestFixture {
    pub router: Router,
    pub store: Arc<SqliteLotteryStore>,
    /// Mock torrent provider, the only one configured
    pub searcher: Arc<MockSearcher>,
    pub torrent_client: MockTorrentClient,
    pub metadata: Arc<MockMetadataLookup>,
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub with_torrent_client: bool,
    pub with_metadata: bool,
    pub mode: DispatchMode,
    pub prefetch_on_create: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            with_torrent_client: true,
            with_metadata: true,
            mode: DispatchMode::Sync,
            prefetch_on_create: false,
        }
    }
}

impl TestConfig {
    pub fn without_services() -> Self {
        Self {
            with_torrent_client: false,
            with_metadata: false,
            ..Self::default()
        }
    }

    pub fn background() -> Self {
        Self {
            mode: DispatchMode::Background,
            ..Self::default()
        }
    }

    pub fn prefetch() -> Self {
        Self {
            prefetch_on_create: true,
            ..Self::default()
        }
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let mut config = Config {
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            ..Config::default()
        };
        config.lottery.public_url = Some("http://movies.test".to_string());
        config.downloads.mode = test_config.mode;
        config.downloads.prefetch_on_create = test_config.prefetch_on_create;

        let store = Arc::new(SqliteLotteryStore::new(&db_path).expect("Failed to create store"));
        let searcher = Arc::new(MockSearcher::named("apibay"));
        let torrent_client = MockTorrentClient::new();
        let metadata = Arc::new(MockMetadataLookup::new());

        let discovery = Arc::new(TorrentDiscovery::new(
            vec![Arc::clone(&searcher) as Arc<dyn Searcher>],
            vec!["udp://tracker.test:1337/announce".to_string()],
        ));

        let state = AppState::new(
            config,
            Arc::clone(&store) as Arc<dyn LotteryStore>,
            test_config
                .with_metadata
                .then(|| Arc::clone(&metadata) as Arc<dyn MetadataLookup>),
            discovery,
            test_config
                .with_torrent_client
                .then(|| Arc::new(torrent_client.clone()) as Arc<dyn TorrentClient>),
        );

        let state = match state.dispatcher().cloned() {
            Some(dispatcher) => {
                let (jobs, worker) = create_job_system(dispatcher, 16);
                tokio::spawn(worker.run());
                state.with_jobs(jobs)
            }
            None => state,
        };

        let router = lottery_server::api::create_router(Arc::new(state));

        Self {
            router,
            store,
            searcher,
            torrent_client,
            metadata,
            temp_dir,
        }
    }

    /// Create a lottery through the API and return its id.
    pub async fn create_lottery(&self, movies: &[(&str, u16)]) -> String {
        let response = self
            .post(
                "/create",
                serde_json::json!({ "movies": fixtures::movies(movies) }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.body["lottery_id"]
            .as_str()
            .expect("lottery_id missing")
            .to_string()
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
