//! Scheduler loop: sleeps until the next cron fire time and runs the cycle.
//!
//! Runs are awaited inline, so fire times that pass while a run is still in
//! progress are skipped rather than queued.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::cron::CronSchedule;
use crate::cycle::{CycleError, NotificationCycle};
use crate::history::RunTrigger;

/// Drive `cycle` on `schedule` until `shutdown` flips to `true` (or its sender is dropped).
pub async fn run_scheduler(
    cycle: Arc<NotificationCycle>,
    schedule: CronSchedule,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!(cron = %schedule, "⏰ Scheduler started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        let now = cycle.clock().now();
        let Some(next) = schedule.next_after(now) else {
            tracing::warn!(cron = %schedule, "schedule has no upcoming fire time, stopping");
            break;
        };
        let wait = (next - now).to_std().unwrap_or_default();
        tracing::debug!(next = %next, wait_secs = wait.as_secs(), "next notification cycle");

        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
            _ = tokio::time::sleep(wait) => {}
        }

        match cycle.run_with_trigger(RunTrigger::Schedule).await {
            Ok(report) if report.is_clean() => {
                tracing::info!(found = report.found, marked = report.marked, "✅ Notification cycle done");
            }
            Ok(report) => {
                tracing::warn!(
                    found = report.found,
                    marked = report.marked,
                    failed = report.failures.len(),
                    "⚠️ Notification cycle finished with failures"
                );
            }
            Err(CycleError::AlreadyRunning) => {}
            Err(e) => tracing::error!(error = %e, "❌ Notification cycle failed"),
        }
    }

    tracing::info!("Scheduler stopped");
}

/// Spawn [`run_scheduler`] as a background tokio task.
/// Send `true` on the returned sender to stop it.
pub fn spawn_scheduler(
    cycle: Arc<NotificationCycle>,
    schedule: CronSchedule,
) -> (JoinHandle<()>, watch::Sender<bool>) {
    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(run_scheduler(cycle, schedule, rx));
    (handle, tx)
}
