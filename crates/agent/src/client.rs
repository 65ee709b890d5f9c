//! HTTP side of the dispatch protocol.
//!
//! [`DispatchApi`] is the seam the runtime and executor talk through;
//! [`HttpDispatchClient`] implements it against the queue server.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use qdesk_core::dispatch::{ClaimRequest, CompleteRequest, FailRequest, PrintJobRecord};
use qdesk_core::types::DbId;
use reqwest::{Client, Response, StatusCode};

use crate::error::AgentError;
use crate::sse::{SseDecoder, SseFrame};

/// Frames from the live event stream. Ends when the server closes it.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<SseFrame, AgentError>> + Send>>;

/// Operations an agent performs against the queue server.
///
/// Implementations carry the agent's identity; claims and settlements are
/// made on its behalf.
#[async_trait]
pub trait DispatchApi: Send + Sync {
    /// Identity sent with claims.
    fn agent_id(&self) -> &str;

    /// Every pending job, oldest first.
    async fn pending_jobs(&self) -> Result<Vec<PrintJobRecord>, AgentError>;

    /// Open the live event stream.
    async fn subscribe(&self) -> Result<EventStream, AgentError>;

    /// Claim a job. [`AgentError::Conflict`] when someone else has it.
    async fn claim(&self, job_id: DbId) -> Result<PrintJobRecord, AgentError>;

    /// Mark a claimed job printed.
    async fn complete(&self, job_id: DbId) -> Result<(), AgentError>;

    /// Mark a claimed job failed with a reason.
    async fn fail(&self, job_id: DbId, reason: &str) -> Result<(), AgentError>;
}

/// [`DispatchApi`] over HTTP with reqwest.
#[derive(Clone)]
pub struct HttpDispatchClient {
    base_url: String,
    agent_id: String,
    /// Short calls, bounded by the request timeout.
    client: Client,
    /// The event stream stays open indefinitely, so only connecting is
    /// bounded.
    stream_client: Client,
}

impl HttpDispatchClient {
    pub fn new(
        server_url: &str,
        agent_id: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, AgentError> {
        let client = Client::builder().timeout(request_timeout).build()?;
        let stream_client = Client::builder().connect_timeout(request_timeout).build()?;
        Ok(Self {
            base_url: format!("{}/api/v1/print-agent", server_url.trim_end_matches('/')),
            agent_id: agent_id.into(),
            client,
            stream_client,
        })
    }

    fn job_url(&self, job_id: DbId, action: &str) -> String {
        format!("{}/job/{job_id}/{action}", self.base_url)
    }
}

/// Turn non-success statuses into errors, keeping the body for the log.
async fn check(response: Response, job_id: Option<DbId>) -> Result<Response, AgentError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let subject = match job_id {
        Some(id) => format!("print job {id}"),
        None => "request".to_string(),
    };
    match status {
        StatusCode::CONFLICT => Err(AgentError::Conflict(subject)),
        StatusCode::NOT_FOUND => Err(AgentError::NotFound(subject)),
        _ => Err(AgentError::Status { status, body }),
    }
}

#[async_trait]
impl DispatchApi for HttpDispatchClient {
    fn agent_id(&self) -> &str {
        &self.agent_id
    }

    async fn pending_jobs(&self) -> Result<Vec<PrintJobRecord>, AgentError> {
        let response = self
            .client
            .get(format!("{}/jobs/pending", self.base_url))
            .send()
            .await?;
        let body = check(response, None).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn subscribe(&self) -> Result<EventStream, AgentError> {
        let response = self
            .stream_client
            .get(format!("{}/sse", self.base_url))
            .query(&[("agent_id", self.agent_id.as_str())])
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        let response = check(response, None).await?;

        let mut decoder = SseDecoder::new();
        let frames = response
            .bytes_stream()
            .map(move |chunk| match chunk {
                Ok(bytes) => match decoder.push(&bytes) {
                    Ok(frames) => frames.into_iter().map(Ok).collect::<Vec<_>>(),
                    Err(e) => vec![Err(AgentError::from(e))],
                },
                Err(e) => vec![Err(AgentError::Http(e))],
            })
            .flat_map(futures::stream::iter);
        Ok(Box::pin(frames))
    }

    async fn claim(&self, job_id: DbId) -> Result<PrintJobRecord, AgentError> {
        let response = self
            .client
            .post(self.job_url(job_id, "claim"))
            .json(&ClaimRequest {
                agent_id: self.agent_id.clone(),
            })
            .send()
            .await?;
        let body = check(response, Some(job_id)).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn complete(&self, job_id: DbId) -> Result<(), AgentError> {
        let response = self
            .client
            .post(self.job_url(job_id, "complete"))
            .json(&CompleteRequest {
                agent_id: Some(self.agent_id.clone()),
            })
            .send()
            .await?;
        check(response, Some(job_id)).await?;
        Ok(())
    }

    async fn fail(&self, job_id: DbId, reason: &str) -> Result<(), AgentError> {
        let response = self
            .client
            .post(self.job_url(job_id, "fail"))
            .json(&FailRequest {
                error: reason.to_string(),
                agent_id: Some(self.agent_id.clone()),
            })
            .send()
            .await?;
        check(response, Some(job_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_built_under_the_agent_prefix() {
        let client =
            HttpDispatchClient::new("http://localhost:8080/", "printer-1", Duration::from_secs(5))
                .unwrap();
        assert_eq!(client.base_url, "http://localhost:8080/api/v1/print-agent");
        assert_eq!(
            client.job_url(42, "claim"),
            "http://localhost:8080/api/v1/print-agent/job/42/claim"
        );
        assert_eq!(client.agent_id(), "printer-1");
    }
}
