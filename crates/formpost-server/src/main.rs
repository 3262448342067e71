#![doc = include_str!("../README.md")]

mod server;

use std::sync::Arc;

use clap::Parser;
use formpost::{SubmissionHandler, SystemClock};
use server::config::{CliArgs, ServerConfig};
use server::notify::ServerNotifier;
use server::service::handler::{IntakeHandler, router};
use server::store::GoogleSheets;
use server::telemetry::init_telemetry;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;

    let handler = build_handler(&config)?;
    let app = router(Arc::new(handler));

    let listener = TcpListener::bind(&config.server_addr).await?;
    log_startup_info(&config);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shut down successfully");
    providers.shutdown();
    Ok(())
}

fn build_handler(config: &ServerConfig) -> anyhow::Result<IntakeHandler> {
    let sheets = GoogleSheets::new(
        config.sheets_api_url.clone(),
        config.sheets_access_token.clone(),
        config.request_timeout,
    )?;
    let notifier = ServerNotifier::from_url(config.webhook_url.clone(), config.request_timeout)?;

    Ok(SubmissionHandler::with_parts(
        config.intake.clone(),
        sheets,
        notifier,
        config.allocation.clone(),
        SystemClock,
    ))
}

fn log_startup_info(config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting intake on {} with allocation {} and config: {:#?}",
            config.server_addr,
            config.allocation,
            config.intake,
        );
    } else {
        tracing::info!(
            "Starting intake on {} for {} target(s), layout {}, allocation {}",
            config.server_addr,
            config.intake.targets.len(),
            config.intake.layout,
            config.allocation,
        );
    }
    if config.webhook_url.is_none() {
        tracing::warn!("SLACK_WEBHOOK_URL is not set, notifications are disabled");
    }
    if config.sheets_access_token.is_none() {
        tracing::warn!("SHEETS_ACCESS_TOKEN is not set, Sheets requests are unauthenticated");
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");
}
