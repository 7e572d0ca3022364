//! Unix domain socket server for IPC
//!
//! Provides request-response communication and push notifications for
//! state change events to subscribed clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::browser::Browser;
use crate::events::StateEvent;

use super::frame::{read_frame, write_frame, ProtocolError};
use super::protocol::{Request, Response};

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: UnixListener,
    browser: Arc<Browser>,
    events: broadcast::Sender<StateEvent>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Bind the socket, replacing a stale one
    pub fn new(
        socket_path: &Path,
        browser: Arc<Browser>,
        events: broadcast::Sender<StateEvent>,
    ) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener,
            browser,
            events,
            shutdown_tx,
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let browser = Arc::clone(&self.browser);
                    let events = self.events.clone();
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, browser, events) => {
                                if let Err(e) = result {
                                    warn!(error = %e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(
        mut stream: UnixStream,
        browser: Arc<Browser>,
        events: broadcast::Sender<StateEvent>,
    ) -> Result<(), ProtocolError> {
        loop {
            let body = match read_frame(&mut stream).await {
                Ok(body) => body,
                Err(ProtocolError::Closed) => {
                    debug!("client disconnected");
                    return Ok(());
                }
                Err(ProtocolError::TooLarge(len)) => {
                    warn!(len, "message too large, disconnecting");
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

            let request: Request = match serde_json::from_slice(&body) {
                Ok(request) => request,
                Err(e) => {
                    debug!(error = %e, "unparseable request");
                    write_frame(&mut stream, &Response::failure("Unknown action")).await?;
                    continue;
                }
            };

            debug!(?request, "received request");

            if request == Request::Subscribe {
                // Subscribe before acknowledging so no event falls in between.
                let rx = events.subscribe();
                write_frame(&mut stream, &Response::ok()).await?;
                debug!("client subscribed to notifications");
                return Self::push_events(stream, rx).await;
            }

            let response = browser.dispatch(request).await;
            write_frame(&mut stream, &response).await?;
        }
    }

    /// Forward state events until the client goes away
    async fn push_events(
        mut stream: UnixStream,
        mut rx: broadcast::Receiver<StateEvent>,
    ) -> Result<(), ProtocolError> {
        loop {
            match rx.recv().await {
                Ok(event) => write_frame(&mut stream, &event).await?,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(()),
            }
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}
