//! Periodic cleanup of finished print jobs and abandoned tickets.
//!
//! Each tick deletes completed/failed print jobs older than
//! `PRINT_JOB_RETENTION_HOURS` and cancels waiting/called tickets older
//! than `QUEUE_AUTO_CANCEL_HOURS` (disabled when `0`).

use chrono::{TimeDelta, Utc};
use qdesk_core::types::Timestamp;
use qdesk_db::repositories::{PrintJobRepo, QueueEntryRepo};
use tokio_util::sync::CancellationToken;

use crate::engine::publisher;
use crate::state::AppState;

/// What one sweep removed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub purged_jobs: u64,
    pub cancelled_entries: u64,
}

/// Run the sweep loop until `cancel` is triggered. The first sweep runs
/// immediately.
pub async fn run(state: AppState, cancel: CancellationToken) {
    tracing::info!(
        retention_hours = state.config.print_job_retention_hours,
        auto_cancel_hours = state.config.queue_auto_cancel_hours,
        interval_secs = state.config.sweep_interval().as_secs(),
        "Sweep job started"
    );

    let mut interval = tokio::time::interval(state.config.sweep_interval());

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Sweep job stopping");
                break;
            }
            _ = interval.tick() => {
                match sweep_once(&state).await {
                    Ok(report) if report == SweepReport::default() => {
                        tracing::debug!("Sweep: nothing to clean up");
                    }
                    Ok(report) => {
                        tracing::info!(
                            purged_jobs = report.purged_jobs,
                            cancelled_entries = report.cancelled_entries,
                            "Sweep: cleaned up",
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Sweep: cleanup failed");
                    }
                }
            }
        }
    }
}

/// `hours` before `now`, or `None` when that lies outside the representable
/// range. Nothing stored can be older than such a cutoff.
fn cutoff(now: Timestamp, hours: i64) -> Option<Timestamp> {
    TimeDelta::try_hours(hours).and_then(|age| now.checked_sub_signed(age))
}

/// One sweep pass. Publishes `queue_updated` when tickets were cancelled.
pub async fn sweep_once(state: &AppState) -> Result<SweepReport, sqlx::Error> {
    let now = Utc::now();
    let mut report = SweepReport::default();

    let retention_hours = state.config.print_job_retention_hours.max(0);
    match cutoff(now, retention_hours) {
        Some(before) => {
            report.purged_jobs = PrintJobRepo::delete_terminal_older_than(&state.pool, before).await?;
        }
        None => tracing::warn!(retention_hours, "Sweep: retention out of range, purge skipped"),
    }

    let auto_cancel_hours = state.config.queue_auto_cancel_hours;
    if auto_cancel_hours > 0 {
        match cutoff(now, auto_cancel_hours) {
            Some(before) => {
                report.cancelled_entries = QueueEntryRepo::cancel_stale(&state.pool, before, now).await?;
            }
            None => tracing::warn!(auto_cancel_hours, "Sweep: auto-cancel age out of range, skipped"),
        }

        if report.cancelled_entries > 0 {
            if let Some(waiting) = publisher::current_waiting(&state.pool).await {
                publisher::queue_updated(&state.hub, None, waiting);
            }
        }
    }

    Ok(report)
}
