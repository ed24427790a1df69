//! CLI definition using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::PathBuf;

use clap::Parser;

/// Default configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "grouplock.toml";

/// grouplock - keeps a chat group's title locked
#[derive(Parser, Debug)]
#[command(name = "grouplock")]
#[command(version)]
#[command(about = "Keeps a chat group's title locked to a configured value")]
#[command(
    long_about = "grouplock logs into a chat account, watches one group, and puts the configured title back whenever somebody renames it. A liveness endpoint answers on GET / for uptime monitors."
)]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Session credential file (overrides `credential_path`)
    #[arg(long)]
    pub credentials: Option<PathBuf>,

    /// Liveness port (overrides `port` and the PORT variable)
    #[arg(short, long)]
    pub port: Option<u16>,
}
