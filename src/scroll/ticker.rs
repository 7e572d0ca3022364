//! Recurring tick primitive

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Period between scroll advances
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(20);

/// Schedules a recurring tick and hands back its cancellation handle
pub trait TickScheduler {
    fn schedule(&mut self, period: Duration) -> TickHandle;
}

/// Owns a scheduled tick; dropping or cancelling it stops the tick
pub struct TickHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TickHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        self.fire();
    }

    fn fire(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.fire();
    }
}

impl std::fmt::Debug for TickHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickHandle")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

/// Tokio-backed scheduler that posts a message into a mailbox every period
///
/// Must be used from within a tokio runtime.
pub struct IntervalTicker<M> {
    tx: mpsc::UnboundedSender<M>,
    make: fn() -> M,
}

impl<M: Send + 'static> IntervalTicker<M> {
    pub fn new(tx: mpsc::UnboundedSender<M>, make: fn() -> M) -> Self {
        Self { tx, make }
    }
}

impl<M: Send + 'static> TickScheduler for IntervalTicker<M> {
    fn schedule(&mut self, period: Duration) -> TickHandle {
        let tx = self.tx.clone();
        let make = self.make;

        let task: JoinHandle<()> = tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if tx.send(make()).is_err() {
                    break;
                }
            }
        });

        TickHandle::new(move || task.abort())
    }
}
