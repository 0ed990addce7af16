//! Background scheduling for the alert engine.
//!
//! One recurring task per process, independent of any request path. A failed
//! cycle is logged and skipped; the next tick retries naturally. The stop
//! signal is checked between cycles — a running cycle always completes.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use pulsemap_store::RecordStore;

use crate::engine::AlertEngine;

pub const DEFAULT_PERIOD: Duration = Duration::from_secs(120);

/// Owns the alert engine and its cadence. `start` consumes the scheduler
/// and hands back a handle for graceful shutdown.
pub struct AlertScheduler<S> {
    engine: AlertEngine<S>,
    period: Duration,
}

impl<S: RecordStore + 'static> AlertScheduler<S> {
    pub fn new(engine: AlertEngine<S>, period: Duration) -> Self {
        Self { engine, period }
    }

    /// Spawn the recurring cycle task. The first cycle runs immediately.
    pub fn start(self) -> SchedulerHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        info!(period_secs = self.period.as_secs(), "Starting alert scheduler");

        let task = tokio::spawn(async move {
            loop {
                match self.engine.run_cycle().await {
                    Ok(stats) => info!(%stats, "Alert cycle finished"),
                    Err(e) => error!(error = %e, "Alert cycle failed, skipping until next tick"),
                }

                tokio::select! {
                    _ = tokio::time::sleep(self.period) => {}
                    changed = stop_rx.changed() => {
                        // A dropped handle counts as a stop request.
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("Alert scheduler stopped");
        });

        SchedulerHandle {
            stop: stop_tx,
            task,
        }
    }
}

/// Handle to a running scheduler.
pub struct SchedulerHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the scheduler to stop and wait for the current cycle to
    /// finish. Mid-cycle cancellation is not supported.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }
}
