//! Background worker that runs dispatch passes on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config;
use crate::dispatcher::Dispatcher;

/// Periodic driver for [`Dispatcher::run_pass`].
///
/// One pass runs at a time: the loop awaits each pass before the next tick
/// is considered, and missed ticks are skipped rather than bursted.
pub struct DispatchWorker {
    dispatcher: Arc<Dispatcher>,
    period: Duration,
    shutdown: Arc<Notify>,
}

impl DispatchWorker {
    /// Create a worker using the configured dispatch period
    /// (default 10s, env-overridable).
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            period: config::dispatch_period(),
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Handle used to request graceful shutdown.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    /// Spawn the periodic loop.
    pub fn start(self) -> JoinHandle<()> {
        let Self {
            dispatcher,
            period,
            shutdown,
        } = self;

        tokio::spawn(async move {
            info!(period_ms = period.as_millis() as u64, "test dispatcher started");

            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown.notified() => {
                        info!("test dispatcher received shutdown signal");
                        break;
                    }
                    _ = interval.tick() => {
                        match dispatcher.run_pass().await {
                            Ok(summary) => debug!(?summary, "dispatch pass finished"),
                            // Storage faults; keep the item state untouched
                            // and let the next tick retry.
                            Err(err) => error!(error = %err, "dispatch pass aborted"),
                        }
                    }
                }
            }

            info!("test dispatcher stopped");
        })
    }
}
