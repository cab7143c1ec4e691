// =====================================================================================
// TICK LOOP
// =====================================================================================

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, Instrument, Span};

use crate::models::TickSummary;
use crate::services::{HealthMonitor, ServiceRegistry};

/// Drives every service through the health monitor on a fixed interval.
pub struct TickLoop {
    registry: Arc<ServiceRegistry>,
    monitor: Arc<HealthMonitor>,
    period: Duration,
}

impl TickLoop {
    pub fn new(registry: Arc<ServiceRegistry>, monitor: Arc<HealthMonitor>, period: Duration) -> Self {
        Self {
            registry,
            monitor,
            period,
        }
    }

    /// Checks all services concurrently and waits for every check to finish.
    pub async fn tick(&self) -> TickSummary {
        let checks = self
            .registry
            .services()
            .iter()
            .map(|service| self.monitor.check_service(service));

        let mut summary = TickSummary::default();
        for outcome in join_all(checks).await {
            summary.record(outcome);
        }

        info!(
            checked = summary.checked,
            failing = summary.failing,
            triggered = summary.triggered,
            resolved = summary.resolved,
            suppressed = summary.suppressed,
            skipped = summary.skipped,
            "Tick finished"
        );
        summary
    }

    /// Runs until `shutdown` changes. The first tick fires immediately. A tick
    /// still running at shutdown is dropped, so its checks stop where they are.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = self.period.as_secs(),
            services = self.registry.len(),
            "Tick loop starting"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => {
                    debug!("Tick loop shutting down");
                    break;
                }
            }

            // A tick can run for a whole retry budget; shutdown abandons it.
            tokio::select! {
                _ = self.tick() => {}
                _ = shutdown.changed() => {
                    debug!("Tick loop shutting down, abandoning the tick in progress");
                    break;
                }
            }
        }

        info!("Tick loop stopped");
    }

    /// Spawns the loop inside the current span.
    pub fn spawn(self) -> TickHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(self.run(shutdown_rx).instrument(Span::current()));
        TickHandle {
            handle,
            shutdown_tx,
        }
    }
}

pub struct TickHandle {
    handle: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
}

impl TickHandle {
    /// Signals the loop and waits for it to exit. A tick in progress is dropped
    /// rather than finished.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.handle.await;
    }
}
