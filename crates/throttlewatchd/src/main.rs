// # throttlewatchd - traffic throttle lookup daemon
//
// This daemon is a thin integration layer over throttlewatch-core:
// 1. Reading the log level and config path from the environment
// 2. Loading the JSON configuration
// 3. Starting the refresh scheduler against the netcup webservice
// 4. Serving lookups and `/health` over HTTP until SIGTERM/SIGINT
//
// ## Environment
//
// - `THROTTLEWATCH_CONFIG`: Path of the JSON configuration
//   (default: `config.json` next to the executable)
// - `THROTTLEWATCH_LOG_LEVEL`: trace, debug, info, warn or error (default: info)
//
// ## Example
//
// ```bash
// export THROTTLEWATCH_CONFIG=/etc/throttlewatch/config.json
// throttlewatchd
//
// curl 'http://127.0.0.1:51000/webhook/secret-...?ipv4IP=152.53.197.30'
// ```

mod http;

use anyhow::{Context, Result};
use std::env;
use std::future::IntoFuture;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use throttlewatch_core::{
    QueryService, RefreshScheduler, ServiceConfig, SnapshotBuilder, SnapshotStore,
};
use throttlewatch_netcup::NetcupFactory;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Upper bound for the scheduler and HTTP server to stop after a signal
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DaemonExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Parse a log level name (case-insensitive)
fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "THROTTLEWATCH_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

/// Location of the configuration document
fn config_path(explicit: Option<String>) -> PathBuf {
    if let Some(path) = explicit.filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }

    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("config.json")))
        .unwrap_or_else(|| PathBuf::from("config.json"))
}

fn main() -> ExitCode {
    let log_level = env::var("THROTTLEWATCH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_level = match parse_log_level(&log_level) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    info!("Starting throttlewatchd");

    let path = config_path(env::var("THROTTLEWATCH_CONFIG").ok());
    info!("Loading configuration from {}", path.display());
    let config = ServiceConfig::load(&path);
    info!("Configuration loaded: {} account(s)", config.accounts.len());
    if config.accounts.is_empty() {
        warn!("No accounts configured, every lookup will miss");
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DaemonExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let listener = match bind(&config).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return DaemonExitCode::ConfigError;
            }
        };

        if let Err(e) = run_daemon(config, listener).await {
            error!("Daemon error: {:#}", e);
            DaemonExitCode::RuntimeError
        } else {
            DaemonExitCode::CleanShutdown
        }
    });

    result.into()
}

async fn bind(config: &ServiceConfig) -> Result<TcpListener> {
    let addr = format!("{}:{}", config.bind_address, config.port);
    TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to listen on {}", addr))
}

/// Run the scheduler and the HTTP surface until a shutdown signal
async fn run_daemon(config: ServiceConfig, listener: TcpListener) -> Result<()> {
    let store = SnapshotStore::new();
    let factory = Arc::new(NetcupFactory::new(config.request_timeout()));
    let builder = SnapshotBuilder::from_config(factory, &config);
    let (scheduler, mut events) = RefreshScheduler::from_config(builder, store.clone(), &config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_handle = scheduler.spawn(shutdown_rx.clone());

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!("Scheduler event: {:?}", event);
        }
    });

    let app = http::router(&config.webhook_path, QueryService::new(store));
    let mut server_shutdown = shutdown_rx;
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = server_shutdown.wait_for(|stop| *stop).await;
    });
    let mut server_handle = tokio::spawn(server.into_future());

    info!("Lookup service listening on port {}", config.port);
    info!("Lookup path: {}", config.webhook_path);
    info!(
        "Usage: GET/POST {}?{}=YOUR_IP",
        config.webhook_path,
        http::IP_PARAMETER
    );

    let outcome = tokio::select! {
        signal = wait_for_shutdown_signal() => signal.map(|name| {
            info!("Received shutdown signal: {}", name);
        }),
        result = &mut server_handle => Err(anyhow::anyhow!(
            "HTTP server stopped unexpectedly: {:?}",
            result
        )),
    };

    info!("Shutting down daemon");
    let _ = shutdown_tx.send(true);

    let stopped = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
        if !server_handle.is_finished() {
            match (&mut server_handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("HTTP server error during shutdown: {}", e),
                Err(e) => error!("HTTP server task failed: {}", e),
            }
        }
        if let Err(e) = scheduler_handle.await {
            error!("Refresh scheduler task failed: {}", e);
        }
    })
    .await;

    if stopped.is_err() {
        anyhow::bail!("Shutdown timeout after {:?}", SHUTDOWN_TIMEOUT);
    }

    outcome
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(name)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
