//! Gateway port and the HTTP implementation.

use crate::models::{StatusReport, SubmissionOutcome};
use async_trait::async_trait;
use error_common::{RevenueError, RevenueResult};
use serde::Serialize;
use std::time::Duration;

/// External payer-network gateway. Both operations block on I/O and honor
/// the caller's timeout; neither retries.
#[async_trait]
pub trait ClearinghouseGateway: Send + Sync {
    async fn submit(&self, payload: &str, timeout: Duration) -> RevenueResult<SubmissionOutcome>;

    /// Idempotent status poll.
    async fn poll(&self, tracking_id: &str, timeout: Duration) -> RevenueResult<StatusReport>;
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
    payload: &'a str,
}

/// JSON-over-HTTP gateway client.
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> RevenueResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| RevenueError::ExternalGateway(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Timeouts and transport failures are retryable gateway errors, never an
/// adjudication outcome.
fn transport(err: reqwest::Error) -> RevenueError {
    if err.is_timeout() {
        RevenueError::ExternalGateway("clearinghouse request timed out".to_string())
    } else {
        RevenueError::ExternalGateway(err.to_string())
    }
}

#[async_trait]
impl ClearinghouseGateway for HttpGateway {
    async fn submit(&self, payload: &str, timeout: Duration) -> RevenueResult<SubmissionOutcome> {
        tracing::debug!(bytes = payload.len(), "submitting claim payload");
        let response = self
            .http
            .post(self.url("claims/submit"))
            .timeout(timeout)
            .json(&SubmitRequest { payload })
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(RevenueError::ExternalGateway(format!(
                "clearinghouse returned HTTP {}",
                response.status()
            )));
        }
        response.json::<SubmissionOutcome>().await.map_err(transport)
    }

    async fn poll(&self, tracking_id: &str, timeout: Duration) -> RevenueResult<StatusReport> {
        tracing::debug!(%tracking_id, "polling claim status");
        let response = self
            .http
            .get(self.url(&format!("claims/{tracking_id}/status")))
            .timeout(timeout)
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(RevenueError::ExternalGateway(format!(
                "clearinghouse returned HTTP {}",
                response.status()
            )));
        }
        response.json::<StatusReport>().await.map_err(transport)
    }
}
