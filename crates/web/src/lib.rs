//! Liveness endpoint.
//!
//! A single `GET /` route answering with a static line so hosting platforms
//! and uptime monitors can tell the process is up. It shares no state with
//! the title lock.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::expect_used)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Body returned by the liveness route.
pub const ALIVE_MESSAGE: &str = "Group Name Locker Bot is alive!";

/// Default liveness port.
pub const DEFAULT_PORT: u16 = 3000;

/// Web server configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_address: SocketAddr,
}

impl ServerConfig {
    /// Listen on every interface at `port`.
    #[must_use]
    pub const fn new(port: u16) -> Self {
        Self {
            bind_address: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
        }
    }

    /// Listen on a specific address.
    #[must_use]
    pub const fn with_bind_address(mut self, bind_address: SocketAddr) -> Self {
        self.bind_address = bind_address;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PORT)
    }
}

/// Create the liveness router.
#[must_use]
pub fn create_router() -> Router {
    Router::new()
        .route("/", get(alive))
        .layer(TraceLayer::new_for_http())
}

async fn alive() -> &'static str {
    ALIVE_MESSAGE
}

/// A bound liveness server that has not started serving yet.
pub struct LivenessServer {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl LivenessServer {
    /// Bind the listening socket.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bind`] if the address cannot be bound.
    pub async fn bind(config: ServerConfig) -> Result<Self, Error> {
        let listener = TcpListener::bind(config.bind_address)
            .await
            .map_err(|source| Error::Bind {
                address: config.bind_address,
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| Error::Bind {
            address: config.bind_address,
            source,
        })?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Address actually bound, with the real port when `0` was requested.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve requests until the process exits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serve`] if the accept loop fails.
    pub async fn serve(self) -> Result<(), Error> {
        info!("Web server running on port {}", self.local_addr.port());
        axum::serve(self.listener, create_router())
            .await
            .map_err(Error::Serve)
    }
}

/// Web server errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Binding the listening socket failed.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The server stopped with an IO error.
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}
