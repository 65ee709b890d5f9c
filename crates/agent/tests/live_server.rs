//! The agent against the real queue server.
//!
//! Serves the application router on an ephemeral port and drives the
//! runtime with [`HttpDispatchClient`], so the JSON bodies, status codes and
//! event stream framing are the ones the server actually produces.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use chrono::Utc;
use common::{eventually, RecordingPrinter};
use qdesk_agent::client::{DispatchApi, HttpDispatchClient};
use qdesk_agent::error::AgentError;
use qdesk_agent::runtime::AgentRuntime;
use qdesk_api::config::ServerConfig;
use qdesk_api::router::build_app_router;
use qdesk_api::state::AppState;
use qdesk_core::types::DbId;
use qdesk_db::models::setting::SETTING_TICKET_TEMPLATE;
use qdesk_db::repositories::{PrintJobRepo, SettingRepo};
use qdesk_events::{Audience, EventHub};
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const TIMEOUT: Duration = Duration::from_secs(5);

struct LiveServer {
    url: String,
    state: AppState,
}

impl LiveServer {
    async fn start() -> Self {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            sse_heartbeat_secs: 1,
            ..ServerConfig::default()
        };
        let state = AppState {
            pool: qdesk_db::create_memory_pool().await.unwrap(),
            hub: Arc::new(EventHub::new(config.subscriber_buffer)),
            config: Arc::new(config),
        };
        let app = build_app_router(state.clone(), &state.config);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}"),
            state,
        }
    }

    fn client(&self, agent_id: &str) -> Arc<HttpDispatchClient> {
        Arc::new(HttpDispatchClient::new(&self.url, agent_id, TIMEOUT).unwrap())
    }

    async fn set_template(&self, raw: &str) {
        SettingRepo::put(&self.state.pool, SETTING_TICKET_TEMPLATE, raw, Utc::now())
            .await
            .unwrap();
    }

    /// Issue a `General` ticket over HTTP and return its print job id.
    async fn issue_ticket(&self) -> DbId {
        let response = reqwest::Client::new()
            .post(format!("{}/api/v1/queue/tickets", self.url))
            .json(&json!({ "service_type_id": 1 }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        let body: Value = response.json().await.unwrap();
        body["data"]["print_job"]["id"].as_i64().unwrap()
    }

    async fn job_status(&self, id: DbId) -> String {
        PrintJobRepo::find_by_id(&self.state.pool, id)
            .await
            .unwrap()
            .unwrap()
            .status
    }

    fn agents_connected(&self) -> usize {
        self.state.hub.subscriber_count(Audience::PrintAgent)
    }
}

fn start_agent(
    client: &Arc<HttpDispatchClient>,
    printer: &Arc<RecordingPrinter>,
) -> (CancellationToken, JoinHandle<()>) {
    let runtime = AgentRuntime::new(client.clone(), printer.clone(), Duration::from_millis(100));
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let handle = tokio::spawn(async move { runtime.run(token).await });
    (cancel, handle)
}

async fn stop(cancel: CancellationToken, handle: JoinHandle<()>) {
    cancel.cancel();
    tokio::time::timeout(TIMEOUT, handle)
        .await
        .expect("agent should stop")
        .unwrap();
}

/// Poll the database until `id` reaches `status`.
async fn wait_for_status(server: &LiveServer, id: DbId, status: &str) {
    let deadline = tokio::time::Instant::now() + TIMEOUT;
    loop {
        let current = server.job_status(id).await;
        if current == status {
            return;
        }
        if tokio::time::Instant::now() > deadline {
            panic!("job {id} stuck in {current}, wanted {status}");
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn announced_ticket_is_printed_with_stored_template() {
    let server = LiveServer::start().await;
    server.set_template(r#"{"ShowThanks":false}"#).await;
    let printer = RecordingPrinter::new();
    let (cancel, handle) = start_agent(&server.client("printer-1"), &printer);

    eventually("agent subscribed", || server.agents_connected() == 1).await;
    // Let at least one heartbeat comment through the decoder first.
    tokio::time::sleep(Duration::from_millis(1500)).await;

    let job_id = server.issue_ticket().await;
    wait_for_status(&server, job_id, "completed").await;

    assert_eq!(printer.queue_numbers(), vec!["A001"]);
    let templates = printer.templates();
    assert!(!templates[0].show_thanks);
    assert!(templates[0].show_type);

    let job = PrintJobRepo::find_by_id(&server.state.pool, job_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.agent_id.as_deref(), Some("printer-1"));

    stop(cancel, handle).await;
    eventually("agent unsubscribed", || server.agents_connected() == 0).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn backlog_is_printed_on_start() {
    let server = LiveServer::start().await;
    let first = server.issue_ticket().await;
    let second = server.issue_ticket().await;
    let printer = RecordingPrinter::new();

    let (cancel, handle) = start_agent(&server.client("printer-1"), &printer);
    wait_for_status(&server, second, "completed").await;
    assert_eq!(server.job_status(first).await, "completed");
    assert_eq!(printer.queue_numbers(), vec!["A001", "A002"]);

    stop(cancel, handle).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn status_codes_map_to_agent_errors() {
    let server = LiveServer::start().await;
    let job_id = server.issue_ticket().await;
    let first = server.client("printer-1");
    let second = server.client("printer-2");

    let pending = first.pending_jobs().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].queue_number, "A001");

    let record = first.claim(job_id).await.unwrap();
    assert_eq!(record.status, "claimed");
    assert_eq!(record.agent_id.as_deref(), Some("printer-1"));

    assert_matches!(second.claim(job_id).await, Err(AgentError::Conflict(_)));
    assert_matches!(first.claim(9_999).await, Err(AgentError::NotFound(_)));
    assert!(first.pending_jobs().await.unwrap().is_empty());

    first.complete(job_id).await.unwrap();
    // Settling a finished job is a no-op.
    first.fail(job_id, "late").await.unwrap();
    assert_eq!(server.job_status(job_id).await, "completed");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn printer_failure_is_reported_to_server() {
    let server = LiveServer::start().await;
    let job_id = server.issue_ticket().await;
    let printer = RecordingPrinter::failing("paper out");

    let (cancel, handle) = start_agent(&server.client("printer-1"), &printer);
    wait_for_status(&server, job_id, "failed").await;
    stop(cancel, handle).await;

    let job = PrintJobRepo::find_by_id(&server.state.pool, job_id)
        .await
        .unwrap()
        .unwrap();
    assert!(job.error_message.unwrap().contains("paper out"));
}
