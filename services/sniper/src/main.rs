//! Elective seat sniper
//!
//! Single-binary tool that:
//! 1. Loads targets, session token, and tuning from TOML
//! 2. Polls section occupancy for every target each round
//! 3. Races to submit an enrollment the instant a seat appears free
//! 4. Refreshes the session token through an external login command when
//!    the remote rejects it
//!
//! Exit code is 0 on enrollment (or on an operator-configured round cap),
//! 1 when cancelled before a seat was acquired.

mod config;
mod provider_impl;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use acquire::{
    CredentialCell, CredentialProvider, Driver, DriverConfig, EventSink, RefreshCoordinator,
    TerminalOutcome, TracingSink, Worker,
};
use elective_client::{Credential, ElectiveApi, ElectiveClient};

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting elective-sniper");

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        base_url = %config.session.base_url,
        targets = config.targets.len(),
        max_workers = config.engine.max_workers,
        base_delay_ms = config.engine.base_delay_ms,
        jitter_ms = config.engine.jitter_ms,
        max_rounds = config.engine.max_rounds,
        "configuration loaded"
    );

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.session.request_timeout_secs))
        .build()
        .context("building HTTP client")?;
    let api: Arc<dyn ElectiveApi> = Arc::new(ElectiveClient::new(http, &config.session.base_url));

    let initial = config
        .session
        .resolved_token
        .as_ref()
        .map(|token| Credential::new(token.expose().to_owned()));
    if initial.is_none() {
        info!("no token configured, first round will run the login command");
    }
    let cell = Arc::new(CredentialCell::new(initial));

    let provider: Arc<dyn CredentialProvider> = if config.session.login_command.is_empty() {
        Arc::new(provider_impl::RefreshDisabled)
    } else {
        Arc::new(provider_impl::CommandProvider::new(
            config.session.login_command.clone(),
            Duration::from_secs(config.session.login_timeout_secs),
        ))
    };

    let events: Arc<dyn EventSink> = Arc::new(TracingSink);
    let refresher = Arc::new(RefreshCoordinator::new(
        cell.clone(),
        provider,
        events.clone(),
    ));
    let worker = Arc::new(Worker::new(api, cell, refresher, events.clone()));

    let targets: Vec<_> = config.targets.iter().map(|t| t.to_target()).collect();
    let driver = Driver::new(
        worker,
        targets,
        DriverConfig {
            max_workers: config.engine.max_workers,
            base_delay: Duration::from_millis(config.engine.base_delay_ms),
            jitter: Duration::from_millis(config.engine.jitter_ms),
            max_rounds: config.engine.max_rounds,
        },
        events,
    );

    // First signal flips the flag; the driver stops at its next suspension
    // point without aborting an in-flight attempt
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    match driver.run(shutdown_rx).await {
        TerminalOutcome::Enrolled {
            target,
            round,
            receipt,
        } => {
            info!(target = %target, round, status = receipt.status, "enrollment succeeded");
            // The remote can return 2xx with an embedded failure message;
            // print the body so the operator can verify the enrollment
            println!("{}", receipt.body);
            Ok(())
        }
        TerminalOutcome::RoundLimitReached { rounds } => {
            info!(rounds, "round limit reached without success");
            Ok(())
        }
        TerminalOutcome::Cancelled { round } => {
            warn!(round, "cancelled before a seat was acquired");
            std::process::exit(1);
        }
    }
}

/// Wait for SIGTERM or SIGINT.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, stopping"),
        _ = terminate => info!("received SIGTERM, stopping"),
    }
}
