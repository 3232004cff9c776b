use std::sync::Arc;

use lottery_core::{
    Config, DispatchMode, DownloadDispatcher, DrawEngine, JobHandle, LotteryStore,
    MetadataLookup, SanitizedConfig, StatusPoller, TorrentClient, TorrentDiscovery,
};

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<dyn LotteryStore>,
    draw: DrawEngine,
    metadata: Option<Arc<dyn MetadataLookup>>,
    dispatcher: Option<Arc<DownloadDispatcher>>,
    poller: Option<StatusPoller>,
    jobs: Option<JobHandle>,
}

impl AppState {
    /// Wire the services together.
    ///
    /// Without a download client there is no dispatcher or poller, and the
    /// download endpoints answer 503.
    pub fn new(
        config: Config,
        store: Arc<dyn LotteryStore>,
        metadata: Option<Arc<dyn MetadataLookup>>,
        discovery: Arc<TorrentDiscovery>,
        torrent_client: Option<Arc<dyn TorrentClient>>,
    ) -> Self {
        let dispatcher = torrent_client.as_ref().map(|client| {
            Arc::new(DownloadDispatcher::new(
                Arc::clone(&store),
                Arc::clone(&discovery),
                Arc::clone(client),
            ))
        });
        let poller = torrent_client.map(StatusPoller::new);

        Self {
            config,
            draw: DrawEngine::new(Arc::clone(&store)),
            store,
            metadata,
            dispatcher,
            poller,
            jobs: None,
        }
    }

    /// Attach the background job queue.
    pub fn with_jobs(mut self, jobs: JobHandle) -> Self {
        self.jobs = Some(jobs);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn store(&self) -> &dyn LotteryStore {
        self.store.as_ref()
    }

    pub fn draw_engine(&self) -> &DrawEngine {
        &self.draw
    }

    pub fn metadata(&self) -> Option<&dyn MetadataLookup> {
        self.metadata.as_deref()
    }

    pub fn dispatcher(&self) -> Option<&Arc<DownloadDispatcher>> {
        self.dispatcher.as_ref()
    }

    pub fn poller(&self) -> Option<&StatusPoller> {
        self.poller.as_ref()
    }

    pub fn jobs(&self) -> Option<&JobHandle> {
        self.jobs.as_ref()
    }

    /// Whether download requests go to the job queue.
    pub fn background_downloads(&self) -> bool {
        self.config.downloads.mode == DispatchMode::Background && self.jobs.is_some()
    }

    /// Absolute link for a path, using `lottery.public_url` when set.
    pub fn public_link(&self, path: &str) -> String {
        match &self.config.lottery.public_url {
            Some(base) => format!("{}{}", base.trim_end_matches('/'), path),
            None => path.to_string(),
        }
    }
}
