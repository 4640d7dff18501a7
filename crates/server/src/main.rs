use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lego_core::{
    load_config, validate_config, BackendClient, DurationProbe, FfprobeProbe, HttpBackend,
    HttpQueueClient, JobOrchestrator, OrchestratorConfig, QueueClient, SanitizedConfig,
};
use lego_server::api::create_router;
use lego_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Config file picked up from the working directory when `LEGO_CONFIG` is unset.
const DEFAULT_CONFIG_FILE: &str = "lego.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_logging();

    // Determine config path
    let config_path = match std::env::var("LEGO_CONFIG") {
        Ok(path) => Some(PathBuf::from(path)),
        Err(_) => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
    };

    // Load configuration
    match &config_path {
        Some(path) => info!("Loading configuration from {:?}", path),
        None => info!("No config file, using defaults and environment"),
    }
    let config = load_config(config_path.as_deref()).context("Failed to load config")?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let sanitized = SanitizedConfig::from(&config);
    info!(
        version = VERSION,
        config = %serde_json::to_string(&sanitized).unwrap_or_default(),
        "Configuration loaded successfully"
    );

    // One connection pool shared by the queue and backend clients
    let http = reqwest::Client::builder()
        .build()
        .context("Failed to create HTTP client")?;

    let queue: Arc<dyn QueueClient> =
        Arc::new(HttpQueueClient::new(http.clone(), config.queue.clone()));
    let backend: Arc<dyn BackendClient> =
        Arc::new(HttpBackend::new(http, config.backend.clone()));
    let probe: Arc<dyn DurationProbe> = Arc::new(FfprobeProbe::new(config.probe.clone()));

    let orchestrator = Arc::new(JobOrchestrator::new(
        OrchestratorConfig::from(&config),
        queue,
        Arc::clone(&backend),
        probe,
    ));
    info!(
        backend = %config.backend.base_url(),
        queue = %config.queue.base_url(),
        tokens = config.queue.tokens,
        "Orchestrator initialized"
    );

    // Create app state and router
    let state = Arc::new(AppState::new(config.clone(), orchestrator, backend));
    let app = create_router(state);

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

    info!("Server shut down");
    Ok(())
}

/// Human-readable logs by default, JSON lines with `LOG_FORMAT=json`.
fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=debug".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
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
    info!("Shutdown signal received");
}
