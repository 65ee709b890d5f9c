//! Shared fixtures for print agent tests: an in-memory dispatch server and
//! a printer that records what it was asked to print.

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::mpsc;
use qdesk_agent::client::{DispatchApi, EventStream};
use qdesk_agent::error::AgentError;
use qdesk_agent::printer::{PrintError, TicketPrinter};
use qdesk_agent::sse::SseFrame;
use qdesk_core::dispatch::{EventEnvelope, PrintJobNotice, PrintJobRecord};
use qdesk_core::event_names::EVENT_PRINT_JOB;
use qdesk_core::ticket::{TicketData, TicketTemplate};
use qdesk_core::types::DbId;
use reqwest::StatusCode;

/// Job table shared by every fake agent connection.
#[derive(Default)]
pub struct FakeServer {
    jobs: Mutex<BTreeMap<DbId, PrintJobRecord>>,
}

impl FakeServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_job(&self, id: DbId, queue_number: &str) {
        self.add_job_with_template(id, queue_number, r#"{"ShowThanks":false}"#);
    }

    pub fn add_job_with_template(&self, id: DbId, queue_number: &str, template_json: &str) {
        let record = PrintJobRecord {
            id,
            queue_number: queue_number.to_string(),
            type_name: "General".to_string(),
            date_time: "19/10/2026 09:00".to_string(),
            template_json: template_json.to_string(),
            status: "pending".to_string(),
            agent_id: None,
            error_message: None,
        };
        self.jobs.lock().unwrap().insert(id, record);
    }

    pub fn job(&self, id: DbId) -> PrintJobRecord {
        self.jobs.lock().unwrap()[&id].clone()
    }

    pub fn status(&self, id: DbId) -> String {
        self.job(id).status
    }

    pub fn force_status(&self, id: DbId, status: &str) {
        if let Some(job) = self.jobs.lock().unwrap().get_mut(&id) {
            job.status = status.to_string();
        }
    }

    pub fn all_settled(&self) -> bool {
        self.jobs
            .lock()
            .unwrap()
            .values()
            .all(|j| j.status == "completed" || j.status == "failed")
    }

    fn settle(&self, id: DbId, agent_id: &str, status: &str, error: Option<&str>) -> Result<(), AgentError> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| AgentError::NotFound(format!("print job {id}")))?;
        if job.status != "claimed" || job.agent_id.as_deref() != Some(agent_id) {
            return Err(AgentError::Conflict(format!("print job {id}")));
        }
        job.status = status.to_string();
        job.error_message = error.map(str::to_string);
        Ok(())
    }
}

/// One agent's view of a [`FakeServer`].
pub struct FakeDispatch {
    pub server: Arc<FakeServer>,
    agent_id: String,
    streams: Mutex<VecDeque<EventStream>>,
    pub pending_calls: AtomicUsize,
    pub subscribe_calls: AtomicUsize,
    /// Upcoming complete/fail calls to reject with 503 before they reach
    /// the server.
    pub report_failures: AtomicUsize,
    pub report_calls: AtomicUsize,
}

impl FakeDispatch {
    pub fn new(server: &Arc<FakeServer>, agent_id: &str) -> Arc<Self> {
        Arc::new(Self {
            server: Arc::clone(server),
            agent_id: agent_id.to_string(),
            streams: Mutex::new(VecDeque::new()),
            pending_calls: AtomicUsize::new(0),
            subscribe_calls: AtomicUsize::new(0),
            report_failures: AtomicUsize::new(0),
            report_calls: AtomicUsize::new(0),
        })
    }

    /// Queue a stream for the next `subscribe`. Dropping the sender ends it.
    /// With no stream queued, `subscribe` fails.
    pub fn push_stream(&self) -> mpsc::UnboundedSender<Result<SseFrame, AgentError>> {
        let (tx, rx) = mpsc::unbounded();
        self.streams.lock().unwrap().push_back(Box::pin(rx));
        tx
    }

    pub fn subscribes(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    pub fn catch_ups(&self) -> usize {
        self.pending_calls.load(Ordering::SeqCst)
    }

    pub fn reports(&self) -> usize {
        self.report_calls.load(Ordering::SeqCst)
    }

    fn unavailable() -> AgentError {
        AgentError::Status {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: "unavailable".to_string(),
        }
    }

    fn injected_report_failure(&self) -> Result<(), AgentError> {
        self.report_calls.fetch_add(1, Ordering::SeqCst);
        match self
            .report_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        {
            Ok(_) => Err(Self::unavailable()),
            Err(_) => Ok(()),
        }
    }
}

#[async_trait]
impl DispatchApi for FakeDispatch {
    fn agent_id(&self) -> &str {
        &self.agent_id
    }

    async fn pending_jobs(&self) -> Result<Vec<PrintJobRecord>, AgentError> {
        self.pending_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .server
            .jobs
            .lock()
            .unwrap()
            .values()
            .filter(|j| j.status == "pending")
            .cloned()
            .collect())
    }

    async fn subscribe(&self) -> Result<EventStream, AgentError> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        self.streams
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(Self::unavailable)
    }

    async fn claim(&self, job_id: DbId) -> Result<PrintJobRecord, AgentError> {
        let mut jobs = self.server.jobs.lock().unwrap();
        let job = jobs
            .get_mut(&job_id)
            .ok_or_else(|| AgentError::NotFound(format!("print job {job_id}")))?;
        if job.status != "pending" {
            return Err(AgentError::Conflict(format!("print job {job_id}")));
        }
        job.status = "claimed".to_string();
        job.agent_id = Some(self.agent_id.clone());
        Ok(job.clone())
    }

    async fn complete(&self, job_id: DbId) -> Result<(), AgentError> {
        self.injected_report_failure()?;
        self.server.settle(job_id, &self.agent_id, "completed", None)
    }

    async fn fail(&self, job_id: DbId, reason: &str) -> Result<(), AgentError> {
        self.injected_report_failure()?;
        self.server.settle(job_id, &self.agent_id, "failed", Some(reason))
    }
}

/// A `print_job` frame as the server sends it.
pub fn print_job_frame(job_id: DbId, queue_number: &str) -> SseFrame {
    let envelope = EventEnvelope::new(
        EVENT_PRINT_JOB,
        PrintJobNotice {
            job_id,
            queue_number: queue_number.to_string(),
        },
    )
    .unwrap();
    SseFrame {
        event: Some(EVENT_PRINT_JOB.to_string()),
        data: serde_json::to_string(&envelope).unwrap(),
    }
}

/// Records every ticket; optionally fails or takes time to print.
#[derive(Default)]
pub struct RecordingPrinter {
    printed: Mutex<Vec<(TicketData, TicketTemplate)>>,
    fail_with: Option<String>,
    delay: Duration,
}

impl RecordingPrinter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            fail_with: Some(reason.to_string()),
            ..Self::default()
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Self::default()
        })
    }

    pub fn queue_numbers(&self) -> Vec<String> {
        self.printed
            .lock()
            .unwrap()
            .iter()
            .map(|(data, _)| data.queue_number.clone())
            .collect()
    }

    pub fn templates(&self) -> Vec<TicketTemplate> {
        self.printed.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }
}

impl TicketPrinter for RecordingPrinter {
    fn print(&self, data: &TicketData, template: &TicketTemplate) -> Result<(), PrintError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if let Some(reason) = &self.fail_with {
            return Err(PrintError::Device {
                device: "/dev/usb/lp0".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, reason.clone()),
            });
        }
        self.printed
            .lock()
            .unwrap()
            .push((data.clone(), template.clone()));
        Ok(())
    }
}

/// Poll `cond` until it holds, panicking after a few seconds.
pub async fn eventually(what: &str, cond: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !cond() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for: {what}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
