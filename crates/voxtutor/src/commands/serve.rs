//! HTTP server command implementation.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{info, warn};

use voxtutor::config::{self, Config};
use voxtutor::learning::ReviewService;
use voxtutor::server::{self, AppState, RuntimeServices};
use voxtutor::session::SessionManager;
use voxtutor::speech::SpeechAnalyzer;
use voxtutor::store::{FileReviewStore, FileSessionStore, ReviewStore, SessionStore};
use voxtutor::vendor::{OmnidimGateway, VendorGateway};

/// Timeout for each vendor REST call.
const VENDOR_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn run(
    config_path: &str,
    host_override: Option<IpAddr>,
    port_override: Option<u16>,
) -> Result<()> {
    let mut config = Config::load(config_path).await?;

    // CLI overrides config
    if let Some(host) = host_override {
        config.server.host = host.to_string();
    }
    if let Some(port) = port_override {
        config.server.port = port;
    }

    // Resolve storage paths relative to the config file
    let config_path_ref = Path::new(config_path);
    let data_dir = config
        .storage
        .data_dir
        .as_ref()
        .map(|p| config::resolve_path(config_path_ref, p))
        .unwrap_or_else(|| {
            config::resolve_path(config_path_ref, Path::new(config::DEFAULT_DATA_DIR))
        });
    let sessions_dir = data_dir.join(config::DEFAULT_SESSIONS_DIR);
    let reviews_dir = data_dir.join(config::DEFAULT_REVIEWS_DIR);

    let api_key = config
        .vendor
        .api_key
        .clone()
        .or_else(|| std::env::var("OMNIDIM_API_KEY").ok())
        .filter(|key| !key.is_empty())
        .context("vendor API key not configured (set vendor.api_key or OMNIDIM_API_KEY)")?;

    // Vendor gateway shared by sessions and speech analysis
    let client = reqwest::Client::builder()
        .timeout(VENDOR_HTTP_TIMEOUT)
        .build()
        .context("failed to build vendor HTTP client")?;
    let gateway: Arc<dyn VendorGateway> = Arc::new(OmnidimGateway::new(
        client,
        config.vendor.base_url.clone(),
        config.vendor.ws_url.clone(),
        api_key,
    ));

    // Stores and services
    let session_store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(&sessions_dir));
    let review_store: Arc<dyn ReviewStore> = Arc::new(FileReviewStore::new(&reviews_dir));
    let sessions = SessionManager::new(gateway.clone(), session_store);
    let reviews = ReviewService::new(review_store);
    let speech = SpeechAnalyzer::new(gateway);
    info!(data_dir = %data_dir.display(), "Stores initialized");

    // Sweep long-abandoned sessions in the background
    sessions.spawn_expiry_sweeper(
        Duration::from_secs(config.sessions.sweep_interval_seconds),
        chrono::Duration::hours(config.sessions.max_duration_hours as i64),
    );
    info!(
        max_duration_hours = config.sessions.max_duration_hours,
        "Session expiry sweeper started"
    );

    let state = AppState {
        services: RuntimeServices {
            sessions,
            reviews,
            speech,
        },
        max_connections: config.server.max_connections,
    };

    let app = server::build_app(state, config.server.request_timeout_seconds);

    let ip: IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::new(ip, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(addr = %addr, "Starting server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
