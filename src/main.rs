//! vocascroll-daemon: hosts the coordinator, a headless browser and the
//! observer IPC socket

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vocascroll::browser::Browser;
use vocascroll::config::Config;
use vocascroll::events::StateEvent;
use vocascroll::ipc::Server;
use vocascroll::lifecycle::ShutdownSignal;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "vocascroll-daemon starting"
    );

    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(
        socket_path = ?config.socket_path,
        debounce = ?config.debounce,
        tick_interval = ?config.tick_interval,
        "configuration loaded"
    );

    let mut shutdown = ShutdownSignal::new();

    // Coordinator -> IPC subscribers
    let (event_tx, _event_rx) = broadcast::channel::<StateEvent>(64);

    let browser = Arc::new(Browser::start(
        config.page_settings(),
        config.relay_timeout,
        event_tx.clone(),
    ));

    let server = Server::new(&config.socket_path, Arc::clone(&browser), event_tx.clone())?;

    info!("daemon initialized, entering main loop");

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    info!("shutting down...");
    server.shutdown().await;
    info!("vocascroll-daemon stopped");

    Ok(())
}
