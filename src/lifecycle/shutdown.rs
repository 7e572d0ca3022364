//! Signal handling for graceful shutdown

use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::{debug, error};

/// Handles shutdown signals (SIGTERM, SIGINT)
pub struct ShutdownSignal {
    sigterm: Option<Signal>,
    sigint: Option<Signal>,
}

impl ShutdownSignal {
    /// Register the handlers. A handler that cannot be registered is
    /// logged and skipped.
    pub fn new() -> Self {
        Self {
            sigterm: register(SignalKind::terminate(), "SIGTERM"),
            sigint: register(SignalKind::interrupt(), "SIGINT"),
        }
    }

    /// Wait for a shutdown signal. Never resolves if no handler could be
    /// registered.
    pub async fn wait(&mut self) {
        tokio::select! {
            Some(()) = recv(&mut self.sigterm) => {
                debug!("received SIGTERM");
            }
            Some(()) = recv(&mut self.sigint) => {
                debug!("received SIGINT");
            }
            else => std::future::pending::<()>().await,
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

fn register(kind: SignalKind, name: &str) -> Option<Signal> {
    match signal(kind) {
        Ok(signal) => Some(signal),
        Err(e) => {
            error!(signal = name, error = %e, "failed to register signal handler");
            None
        }
    }
}

async fn recv(signal: &mut Option<Signal>) -> Option<()> {
    match signal {
        Some(signal) => signal.recv().await,
        None => None,
    }
}
