//! Command-line and environment configuration for the server binary.

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

/// Command-line arguments, with environment-variable fallbacks.
///
/// A `.env` file in the working directory is honored (loaded in `main`
/// before parsing).
#[derive(Debug, Parser)]
#[command(name = "hashd-server", about = "Asynchronous SHA-512 hashing service over HTTP")]
pub struct CliArgs {
    /// Address the HTTP listener binds to.
    #[arg(long, env = "HASHD_ADDR", default_value = "127.0.0.1:8080")]
    pub addr: String,

    /// Artificial delay, in milliseconds, applied before each digest
    /// computation. Models realistic processing latency; `0` disables it and
    /// correctness never depends on the value.
    #[arg(long, env = "HASHD_HASH_DELAY_MS", default_value_t = 5_000)]
    pub hash_delay_ms: u64,
}

/// Validated runtime configuration derived from [`CliArgs`].
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub hash_delay: Duration,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let listen_addr = args
            .addr
            .parse()
            .with_context(|| format!("invalid listen address `{}`", args.addr))?;

        Ok(Self {
            listen_addr,
            hash_delay: Duration::from_millis(args.hash_delay_ms),
        })
    }
}
