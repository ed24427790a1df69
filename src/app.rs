//! Startup wiring.
//!
//! Settings are resolved with the precedence CLI flag, then `PORT`, then the
//! configuration file. Once a session is open, the event reactor and the poll
//! loop are started side by side.

use std::sync::Arc;

use anyhow::{Context, Result};
use grouplock_core::{Credential, LockConfig};
use grouplock_reconciler::{EventReactor, PollLoop, PollStopper};
use grouplock_session::SessionConnector;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::cli::Cli;

/// Resolve the effective configuration.
///
/// # Errors
///
/// Returns an error if the configuration file cannot be loaded, `port_env`
/// is not a valid port, or the result fails validation.
pub fn load_settings(cli: &Cli, port_env: Option<String>) -> Result<LockConfig> {
    let mut config = LockConfig::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?
        .with_port_env(port_env)
        .context("Invalid PORT")?;

    if let Some(path) = &cli.credentials {
        config = config.with_credential_path(path.clone());
    }
    if let Some(port) = cli.port {
        config = config.with_port(port);
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// The running title lock.
pub struct Activation {
    reactor: JoinHandle<grouplock_reconciler::Result<()>>,
    poll: JoinHandle<()>,
    stopper: PollStopper,
}

impl Activation {
    /// Handle to stop the poll loop.
    #[must_use]
    pub fn stopper(&self) -> PollStopper {
        self.stopper.clone()
    }

    /// Stop the poll loop, wait for it to finish, and drop the reactor.
    pub async fn shutdown(self) {
        self.stopper.stop();
        if let Err(e) = self.poll.await {
            warn!(error = %e, "Poll loop task ended abnormally");
        }
        self.reactor.abort();
        info!("Group lock deactivated");
    }
}

/// Log in and start both correction flows.
///
/// Returns `None` if login fails; nothing is started and login is not
/// retried.
pub async fn activate(
    config: Arc<LockConfig>,
    connector: &dyn SessionConnector,
    credential: &Credential,
) -> Option<Activation> {
    let session = match connector.login(credential).await {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "Login failed");
            return None;
        }
    };
    info!("Logged in successfully");

    let reactor = EventReactor::new(config.clone(), session.clone()).spawn();
    let (poll, stopper) = PollLoop::new(config.clone(), session).spawn();

    info!(
        group_id = %config.group_id,
        title = %config.locked_title,
        "Group name locker (fast + instant) activated"
    );

    Some(Activation {
        reactor,
        poll,
        stopper,
    })
}
