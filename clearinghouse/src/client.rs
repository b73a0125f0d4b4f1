//! Submission client: local pre-validation, then gateway calls.

use crate::gateway::ClearinghouseGateway;
use crate::models::{StatusReport, SubmissionOutcome};
use crate::prevalidate::prevalidate;
use error_common::RevenueResult;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SubmissionClient<G> {
    gateway: G,
    timeout: Duration,
}

impl<G: ClearinghouseGateway> SubmissionClient<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Submit an encoded payload. Structural pre-validation failures are
    /// rejected locally without touching the network. Transport failures
    /// propagate as retryable gateway errors.
    pub async fn submit(
        &self,
        claim_number: &str,
        payload: &str,
    ) -> RevenueResult<SubmissionOutcome> {
        let problems = prevalidate(payload);
        if !problems.is_empty() {
            tracing::warn!(
                %claim_number,
                problems = problems.len(),
                "payload failed structural pre-validation, rejecting locally"
            );
            return Ok(SubmissionOutcome::rejected_locally(problems));
        }

        let outcome = self.gateway.submit(payload, self.timeout).await?;
        tracing::info!(%claim_number, status = ?outcome.status, "claim submitted");
        Ok(outcome)
    }

    /// Poll the gateway for the claim's current adjudication status.
    pub async fn check_status(&self, tracking_id: &str) -> RevenueResult<StatusReport> {
        self.gateway.poll(tracking_id, self.timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RemoteStatus, SubmissionStatus};
    use async_trait::async_trait;
    use error_common::RevenueError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingGateway {
        submits: AtomicUsize,
        polls: AtomicUsize,
        fail_transport: bool,
    }

    impl CountingGateway {
        fn new() -> Self {
            Self {
                submits: AtomicUsize::new(0),
                polls: AtomicUsize::new(0),
                fail_transport: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail_transport: true,
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl ClearinghouseGateway for &CountingGateway {
        async fn submit(
            &self,
            _payload: &str,
            _timeout: Duration,
        ) -> RevenueResult<SubmissionOutcome> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            if self.fail_transport {
                return Err(RevenueError::ExternalGateway("connection reset".to_string()));
            }
            Ok(SubmissionOutcome {
                status: SubmissionStatus::Accepted,
                tracking_id: Some("TRK-1".to_string()),
                rejection_reasons: vec![],
            })
        }

        async fn poll(
            &self,
            _tracking_id: &str,
            _timeout: Duration,
        ) -> RevenueResult<StatusReport> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            Ok(StatusReport {
                status: RemoteStatus::Pending,
                denial_reasons: vec![],
                payment: None,
            })
        }
    }

    fn valid_payload() -> String {
        crate::prevalidate::minimal_payload()
    }

    #[tokio::test]
    async fn well_formed_payload_reaches_the_gateway() {
        let gateway = CountingGateway::new();
        let client = SubmissionClient::new(&gateway);
        let outcome = client.submit("CLM-1", &valid_payload()).await.unwrap();
        assert_eq!(outcome.status, SubmissionStatus::Accepted);
        assert_eq!(outcome.tracking_id.as_deref(), Some("TRK-1"));
        assert_eq!(gateway.submits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn structural_failure_rejects_locally_without_a_network_call() {
        let gateway = CountingGateway::new();
        let client = SubmissionClient::new(&gateway);
        let outcome = client.submit("CLM-1", "CLM*garbage~").await.unwrap();
        assert_eq!(outcome.status, SubmissionStatus::Rejected);
        assert!(outcome.tracking_id.is_none());
        assert!(!outcome.rejection_reasons.is_empty());
        assert_eq!(gateway.submits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn transport_failure_surfaces_as_a_retryable_gateway_error() {
        let gateway = CountingGateway::failing();
        let client = SubmissionClient::new(&gateway);
        let err = client.submit("CLM-1", &valid_payload()).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(err, RevenueError::ExternalGateway(_)));
    }

    #[tokio::test]
    async fn status_poll_delegates_to_the_gateway() {
        let gateway = CountingGateway::new();
        let client = SubmissionClient::new(&gateway).with_timeout(Duration::from_secs(5));
        let report = client.check_status("TRK-1").await.unwrap();
        assert_eq!(report.status, RemoteStatus::Pending);
        assert_eq!(gateway.polls.load(Ordering::SeqCst), 1);
    }
}
