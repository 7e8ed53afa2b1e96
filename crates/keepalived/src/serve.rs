//! Serve mode: scheduler plus HTTP surface in one process.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::Context;
use tracing::{error, info};

use keepalive_config::KeepaliveConfig;
use keepalive_health::Monitor;
use keepalive_state::{ProcessState, StatusLedger};

pub async fn run_serve(config_path: &Path, port_override: Option<u16>) -> anyhow::Result<()> {
    info!("keepalive starting");

    let mut settings = KeepaliveConfig::from_file(config_path)
        .and_then(|config| config.resolve())
        .with_context(|| format!("loading {}", config_path.display()))?;
    if let Some(port) = port_override {
        settings.port = port;
    }
    info!(
        targets = settings.targets.len(),
        restart_enabled = settings.restart.token.is_some(),
        "config loaded"
    );

    let process = ProcessState::started_now();
    let ledger = StatusLedger::new();

    // ── Listener ───────────────────────────────────────────────

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    // ── Scheduler ──────────────────────────────────────────────

    let monitor = Monitor::from_settings(&settings, ledger.clone())?;
    monitor
        .start()
        .await
        .context("failed to start scheduler")?;

    // ── HTTP ───────────────────────────────────────────────────

    let router = keepalive_api::build_router(ledger, process, settings.targets.clone());
    info!(%addr, "HTTP server starting");

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    monitor.stop().await;
    served?;

    info!("keepalive stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
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
    info!("shutdown signal received");
}
