//! Runs one print job: claim, print, then complete or fail.

use std::sync::Arc;
use std::time::Duration;

use qdesk_core::dispatch::PrintJobRecord;
use qdesk_core::ticket::{TicketData, TicketTemplate};
use qdesk_core::types::DbId;

use crate::client::DispatchApi;
use crate::error::AgentError;
use crate::printer::{PrintError, TicketPrinter};

/// Attempts made to report a result before giving up.
pub const REPORT_ATTEMPTS: u32 = 3;
/// Pause between report attempts.
pub const REPORT_RETRY_DELAY: Duration = Duration::from_millis(250);

/// How a single execution ended.
#[derive(Debug)]
pub enum ExecutionOutcome {
    /// Printed and reported complete.
    Printed,
    /// Claimed but could not be printed; reported failed with this reason.
    Failed(String),
    /// Another agent had it, or it was no longer pending.
    Skipped,
    /// A request to the server failed.
    Error(AgentError),
}

#[derive(Debug, Clone, Copy)]
enum Report<'a> {
    Completed,
    Failed(&'a str),
}

/// Executes print jobs against a [`DispatchApi`] and a [`TicketPrinter`].
#[derive(Clone)]
pub struct JobExecutor {
    api: Arc<dyn DispatchApi>,
    printer: Arc<dyn TicketPrinter>,
}

impl JobExecutor {
    pub fn new(api: Arc<dyn DispatchApi>, printer: Arc<dyn TicketPrinter>) -> Self {
        Self { api, printer }
    }

    pub async fn execute(&self, job_id: DbId) -> ExecutionOutcome {
        let record = match self.api.claim(job_id).await {
            Ok(record) => record,
            Err(e) if e.is_conflict() => {
                tracing::debug!(job_id, error = %e, "Job taken elsewhere, skipping");
                return ExecutionOutcome::Skipped;
            }
            Err(e) => {
                tracing::warn!(job_id, error = %e, "Failed to claim job");
                return ExecutionOutcome::Error(e);
            }
        };

        tracing::info!(
            job_id,
            queue_number = %record.queue_number,
            agent_id = self.api.agent_id(),
            "Claimed print job",
        );

        match self.print(&record).await {
            Ok(()) => match self.report(job_id, Report::Completed).await {
                Ok(()) => {
                    tracing::info!(job_id, queue_number = %record.queue_number, "Ticket printed");
                    ExecutionOutcome::Printed
                }
                Err(e) => {
                    tracing::error!(job_id, error = %e, "Printed but could not report completion");
                    ExecutionOutcome::Error(e)
                }
            },
            Err(reason) => {
                tracing::warn!(job_id, queue_number = %record.queue_number, %reason, "Print failed");
                match self.report(job_id, Report::Failed(&reason)).await {
                    Ok(()) => ExecutionOutcome::Failed(reason),
                    Err(e) => {
                        tracing::error!(job_id, error = %e, "Could not report print failure");
                        ExecutionOutcome::Error(e)
                    }
                }
            }
        }
    }

    /// Send the result of a claimed job, retrying transient errors. A
    /// conflict means the server already settled it and is returned as is.
    async fn report(&self, job_id: DbId, report: Report<'_>) -> Result<(), AgentError> {
        let mut attempt = 1;
        loop {
            let result = match report {
                Report::Completed => self.api.complete(job_id).await,
                Report::Failed(reason) => self.api.fail(job_id, reason).await,
            };
            match result {
                Ok(()) => return Ok(()),
                Err(e) if e.is_conflict() || attempt >= REPORT_ATTEMPTS => return Err(e),
                Err(e) => {
                    tracing::warn!(job_id, attempt, ?report, error = %e, "Report failed, retrying");
                    tokio::time::sleep(REPORT_RETRY_DELAY).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Parse the job's template and hand the ticket to the printer.
    async fn print(&self, record: &PrintJobRecord) -> Result<(), String> {
        let template = TicketTemplate::parse(&record.template_json)
            .map_err(|e| format!("failed to parse template: {e}"))?;
        let data = TicketData {
            queue_number: record.queue_number.clone(),
            type_name: record.type_name.clone(),
            date_time: record.date_time.clone(),
        };

        let printer = Arc::clone(&self.printer);
        tokio::task::spawn_blocking(move || printer.print(&data, &template))
            .await
            .unwrap_or_else(|e| Err(PrintError::Aborted(e.to_string())))
            .map_err(|e| e.to_string())
    }
}
