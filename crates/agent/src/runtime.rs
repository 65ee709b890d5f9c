//! The agent's main loop.
//!
//! ```text
//! CatchingUp -> Subscribing -> BackingOff -> CatchingUp -> ...
//!      \              \              \
//!       +--------------+--------------+--> Stopped (on cancel)
//! ```
//!
//! Catch-up prints everything that went pending while the agent was away,
//! one job at a time. Subscribing reads the live stream and runs each
//! announced job on its own task so printing never stalls the reader.
//! When the stream ends the agent waits out the retry delay and catches up
//! again. Cancellation is observed at each of these boundaries; jobs already
//! running are allowed to finish.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use qdesk_core::dispatch::{EventEnvelope, PrintJobNotice};
use qdesk_core::event_names::EVENT_PRINT_JOB;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::client::DispatchApi;
use crate::executor::{ExecutionOutcome, JobExecutor};
use crate::printer::TicketPrinter;
use crate::sse::SseFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    CatchingUp,
    Subscribing,
    BackingOff,
    Stopped,
}

pub struct AgentRuntime {
    api: Arc<dyn DispatchApi>,
    executor: JobExecutor,
    retry_delay: Duration,
}

impl AgentRuntime {
    pub fn new(
        api: Arc<dyn DispatchApi>,
        printer: Arc<dyn TicketPrinter>,
        retry_delay: Duration,
    ) -> Self {
        let executor = JobExecutor::new(Arc::clone(&api), printer);
        Self {
            api,
            executor,
            retry_delay,
        }
    }

    /// Run until `cancel` fires, then wait for in-flight jobs.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut in_flight = JoinSet::new();
        let mut state = RuntimeState::CatchingUp;

        tracing::info!(agent_id = self.api.agent_id(), "Print agent started");

        while state != RuntimeState::Stopped {
            if cancel.is_cancelled() {
                break;
            }
            state = match state {
                RuntimeState::CatchingUp => self.catch_up(&cancel).await,
                RuntimeState::Subscribing => self.listen(&cancel, &mut in_flight).await,
                RuntimeState::BackingOff => self.back_off(&cancel).await,
                RuntimeState::Stopped => RuntimeState::Stopped,
            };
        }

        if !in_flight.is_empty() {
            tracing::info!(jobs = in_flight.len(), "Waiting for in-flight print jobs");
        }
        while let Some(result) = in_flight.join_next().await {
            log_join(result);
        }
        tracing::info!("Print agent stopped");
    }

    async fn catch_up(&self, cancel: &CancellationToken) -> RuntimeState {
        let pending = match self.api.pending_jobs().await {
            Ok(pending) => pending,
            Err(e) => {
                tracing::warn!(error = %e, "Catch-up failed");
                return RuntimeState::Subscribing;
            }
        };

        if !pending.is_empty() {
            tracing::info!(count = pending.len(), "Catching up on pending print jobs");
        }
        for job in pending {
            if cancel.is_cancelled() {
                return RuntimeState::Stopped;
            }
            self.executor.execute(job.id).await;
        }
        RuntimeState::Subscribing
    }

    async fn listen(
        &self,
        cancel: &CancellationToken,
        in_flight: &mut JoinSet<ExecutionOutcome>,
    ) -> RuntimeState {
        let mut stream = tokio::select! {
            _ = cancel.cancelled() => return RuntimeState::Stopped,
            result = self.api.subscribe() => match result {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to open event stream");
                    return RuntimeState::BackingOff;
                }
            },
        };
        tracing::info!("Listening for print jobs");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return RuntimeState::Stopped,
                Some(result) = in_flight.join_next(), if !in_flight.is_empty() => log_join(result),
                frame = stream.next() => match frame {
                    Some(Ok(frame)) => self.dispatch(frame, in_flight),
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Event stream failed");
                        return RuntimeState::BackingOff;
                    }
                    None => {
                        tracing::info!("Event stream closed by server");
                        return RuntimeState::BackingOff;
                    }
                },
            }
        }
    }

    /// Start an execution for a `print_job` frame; anything else is ignored.
    fn dispatch(&self, frame: SseFrame, in_flight: &mut JoinSet<ExecutionOutcome>) {
        let envelope: EventEnvelope = match serde_json::from_str(&frame.data) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, "Malformed event, ignoring");
                return;
            }
        };
        if envelope.event_type != EVENT_PRINT_JOB {
            tracing::trace!(event_type = %envelope.event_type, "Ignoring event");
            return;
        }
        let notice: PrintJobNotice = match serde_json::from_value(envelope.data) {
            Ok(notice) => notice,
            Err(e) => {
                tracing::warn!(error = %e, "Malformed print_job event, ignoring");
                return;
            }
        };

        tracing::debug!(job_id = notice.job_id, queue_number = %notice.queue_number, "Print job announced");
        let executor = self.executor.clone();
        in_flight.spawn(async move { executor.execute(notice.job_id).await });
    }

    async fn back_off(&self, cancel: &CancellationToken) -> RuntimeState {
        tracing::info!(delay_secs = self.retry_delay.as_secs(), "Reconnecting after delay");
        tokio::select! {
            _ = cancel.cancelled() => RuntimeState::Stopped,
            _ = tokio::time::sleep(self.retry_delay) => RuntimeState::CatchingUp,
        }
    }
}

fn log_join(result: Result<ExecutionOutcome, tokio::task::JoinError>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "Print job task panicked");
    }
}
