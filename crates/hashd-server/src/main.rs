#![doc = include_str!("../README.md")]

mod server;

use anyhow::Context;
use clap::Parser;
use hashd_core::HashStore;
use server::config::{CliArgs, ServerConfig};
use server::routes::router;
use server::telemetry::init_telemetry;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    init_telemetry();

    let store = Arc::new(HashStore::new());

    // A bind failure here is fatal and reported as such. The listener going
    // away later, by contrast, is the normal graceful-shutdown path.
    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;

    tracing::info!(
        "Starting hash service on {} with a {:?} processing delay",
        config.listen_addr,
        config.hash_delay
    );

    let app = router(Arc::clone(&store), config);

    // When the shutdown future resolves the listener is dropped: subsequent
    // connection attempts are refused outright while already-open requests
    // run to completion.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&store)))
        .await?;

    tracing::info!(
        "Listener closed; draining {} outstanding hash jobs",
        store.outstanding()
    );

    // Accepted computations are never cancelled; the process may only exit
    // once each one has settled into the store.
    store.terminated().await;

    tracing::info!("All accepted submissions settled; exiting");
    Ok(())
}

/// Resolves when the listener must stop accepting connections: a shutdown
/// request over HTTP, Ctrl+C, or (on unix) SIGTERM. The signal paths funnel
/// into the same store transition as the HTTP endpoint, so every route gets
/// the identical drain behavior.
async fn shutdown_signal(store: Arc<HashStore>) {
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
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
            store.begin_shutdown();
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
            store.begin_shutdown();
        },
        () = store.draining() => {
            tracing::info!("Shutdown requested over HTTP");
        },
    }

    tracing::info!("Refusing new connections, draining in-flight work...");
}
