//! # grouplock
//!
//! ## Startup
//!
//! 1. **Configuration** - file, then `PORT`, then CLI flags
//! 2. **Credential** - persisted session state
//! 3. **Liveness endpoint** - `GET /` on the configured port
//! 4. **Login** - open a session through the gateway
//! 5. **Activation** - event reactor and poll loop
//!
//! A configuration, credential, or bind failure exits with status 1. A login
//! failure is logged and the process keeps serving the liveness endpoint.
//!
//! ## Shutdown
//!
//! Ctrl+C or SIGTERM stops the poll loop and exits 0.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::expect_used)]

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use grouplock::{Cli, activate, load_settings};
use grouplock_core::config::PORT_ENV;
use grouplock_core::load_credential;
use grouplock_session::BridgeConnector;
use grouplock_web::{LivenessServer, ServerConfig};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Arc::new(load_settings(&cli, std::env::var(PORT_ENV).ok())?);

    let credential = load_credential(&config.credential_path).with_context(|| {
        format!(
            "Error reading credential file {}",
            config.credential_path.display()
        )
    })?;

    let server = LivenessServer::bind(ServerConfig::new(config.port))
        .await
        .context("Failed to start liveness endpoint")?;
    let web = tokio::spawn(async move {
        if let Err(e) = server.serve().await {
            error!(error = %e, "Liveness endpoint stopped");
        }
    });

    let connector = BridgeConnector::new(&config.bridge).context("Invalid session gateway URL")?;
    let activation = activate(config, &connector, &credential).await;
    if activation.is_none() {
        info!("Running without an active session; only the liveness endpoint is up");
    }

    wait_for_shutdown().await;

    if let Some(activation) = activation {
        activation.shutdown().await;
    }
    web.abort();

    info!("grouplock stopped");
    Ok(())
}

/// Initialize tracing subscriber with environment filter.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,grouplock=debug,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM.
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
