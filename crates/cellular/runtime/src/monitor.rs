//! Background health monitor
//!
//! One long-lived task per running manager. Each tick recomputes the system
//! health report through [`CellularManager::check_health_now`]. A panicking
//! iteration is logged and the loop carries on; the loop ends when it is
//! told to stop or the manager is gone.

use crate::manager::{CellularManager, WeakCellularManager};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Handle to a running monitor task
#[derive(Debug)]
pub struct MonitorHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Signal the loop and wait for it to finish.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                error!(error = %e, "Health monitor task ended abnormally");
            }
        }
    }

    /// Cancel the task without waiting.
    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn the monitor loop for `manager`.
pub(crate) fn spawn(manager: WeakCellularManager, interval: Duration) -> MonitorHandle {
    let (stop, mut stopped) = watch::channel(false);

    let task = tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "Health monitor started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = stopped.changed() => break,
            }

            let Some(manager) = manager.upgrade() else {
                debug!("Manager dropped, health monitor exiting");
                break;
            };
            run_iteration(manager).await;
        }

        info!("Health monitor stopped");
    });

    MonitorHandle { stop, task }
}

async fn run_iteration(manager: CellularManager) {
    let iteration = AssertUnwindSafe(async move { manager.check_health_now() });

    match iteration.catch_unwind().await {
        Ok(report) => debug!(
            overall_status = %report.overall_status,
            health_percentage = report.summary.health_percentage,
            "Health monitor tick"
        ),
        Err(_) => error!("Health monitor iteration panicked, continuing"),
    }
}
