// src/main.rs
//! Entry point of the `notification-router` service.
//!
//! Loads configuration, installs the log subscriber, loads the directory
//! manifest and serves the ingress router until Ctrl+C or SIGTERM.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::info;

use notification_router::adapter::http::{controller::HttpController, routes::build_router};
use notification_router::config::app_config::AppConfig;
use notification_router::repository::directory::InMemoryDirectory;
use notification_router::service::dispatch_reporter::TracingReporter;
use notification_router::service::notification_dispatcher::NotificationDispatcher;
use notification_router::telemetry::tracing::init_tracing;
use notification_router::usecase::receive_event::ReceiveEventUseCase;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&cfg.logging).context("failed to initialise tracing")?;

    let directory = match &cfg.directory.path {
        Some(path) => InMemoryDirectory::load_from_file(path)
            .await
            .with_context(|| format!("failed to load directory from {}", path.display()))?,
        None => {
            info!("no directory manifest configured, starting empty");
            InMemoryDirectory::new()
        }
    };

    let dispatcher = NotificationDispatcher::new(Arc::new(directory), Arc::new(TracingReporter))
        .with_fetch_timeout(cfg.directory.fetch_timeout())
        .with_notifier_timeout(cfg.notifier.timeout());
    let usecase = Arc::new(ReceiveEventUseCase::new(Arc::new(dispatcher)));
    let app = build_router(Arc::new(HttpController::new(usecase)));

    let addr = cfg.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "notification-router listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    info!("notification-router stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
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
