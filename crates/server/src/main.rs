use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lottery_core::{
    build_discovery, create_job_system, create_torrent_client, load_config, validate_config,
    KinopoiskClient, LotteryStore, MetadataLookup, SqliteLotteryStore, TorrentClient,
};
use lottery_server::api::create_router;
use lottery_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("LOTTERY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);

    // Create SQLite lottery store
    let store: Arc<dyn LotteryStore> = Arc::new(
        SqliteLotteryStore::new(&config.database.path)
            .context("Failed to create lottery store")?
            .with_id_length(config.lottery.id_length),
    );
    info!("Lottery store initialized");

    // Create metadata lookup if configured
    let metadata: Option<Arc<dyn MetadataLookup>> = match &config.metadata {
        Some(metadata_config) => {
            let client = KinopoiskClient::new(metadata_config)
                .context("Failed to create kinopoisk client")?;
            info!("Metadata lookup: kinopoisk at {}", metadata_config.api_url);
            Some(Arc::new(client))
        }
        None => {
            warn!("No metadata lookup configured, /fetch-movie is disabled");
            None
        }
    };

    // Torrent discovery
    let discovery = Arc::new(
        build_discovery(&config.searcher).context("Failed to create torrent providers")?,
    );
    info!("Torrent providers: {:?}", discovery.provider_names());

    // Create download client if configured
    let torrent_client: Option<Arc<dyn TorrentClient>> = match &config.torrent_client {
        Some(tc_config) => {
            let client =
                create_torrent_client(tc_config).context("Failed to create download client")?;
            info!("Download client: {}", client.name());
            Some(client)
        }
        None => {
            warn!("No download client configured, download endpoints are disabled");
            None
        }
    };

    let state = AppState::new(
        config.clone(),
        store,
        metadata,
        discovery,
        torrent_client,
    );

    // Background jobs run through the dispatcher, so they need a client too
    let dispatcher = state.dispatcher().cloned();
    let (state, worker_task) = match dispatcher {
        Some(dispatcher) => {
            let (jobs, worker) = create_job_system(dispatcher, config.downloads.queue_size);
            (state.with_jobs(jobs), Some(tokio::spawn(worker.run())))
        }
        None => (state, None),
    };
    info!("Download mode: {:?}", config.downloads.mode);

    // Create router
    let app = create_router(Arc::new(state));

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");

    // The router (and with it the last JobHandle) is gone, so the worker
    // drains what is queued and exits.
    if let Some(task) = worker_task {
        if let Err(e) = task.await {
            error!("Job worker failed: {}", e);
        }
        info!("Job worker stopped");
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
