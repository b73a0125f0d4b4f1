//! Wire shapes shared with the payer-network gateway.

use claims_core::ClaimStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Immediate answer to a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Accepted,
    Pending,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub status: SubmissionStatus,
    /// Present when the gateway accepted or queued the claim.
    #[serde(default)]
    pub tracking_id: Option<String>,
    #[serde(default)]
    pub rejection_reasons: Vec<String>,
}

impl SubmissionOutcome {
    /// Local rejection produced by pre-validation, before any network
    /// call.
    pub fn rejected_locally(reasons: Vec<String>) -> Self {
        Self {
            status: SubmissionStatus::Rejected,
            tracking_id: None,
            rejection_reasons: reasons,
        }
    }
}

/// Adjudication status reported by a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteStatus {
    Pending,
    Accepted,
    Rejected,
    Denied,
    PartiallyPaid,
    Paid,
}

impl RemoteStatus {
    /// The claim status a terminal or in-flight remote status maps onto.
    /// `Pending` has no mapping; the claim stays where it is.
    pub fn claim_status(self) -> Option<ClaimStatus> {
        match self {
            RemoteStatus::Pending => None,
            RemoteStatus::Accepted => Some(ClaimStatus::Accepted),
            RemoteStatus::Rejected => Some(ClaimStatus::Rejected),
            RemoteStatus::Denied => Some(ClaimStatus::Denied),
            RemoteStatus::PartiallyPaid => Some(ClaimStatus::PartiallyPaid),
            RemoteStatus::Paid => Some(ClaimStatus::Paid),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub allowed_amount: Option<Decimal>,
    pub paid_amount: Option<Decimal>,
    pub patient_responsibility: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: RemoteStatus,
    #[serde(default)]
    pub denial_reasons: Vec<String>,
    #[serde(default)]
    pub payment: Option<PaymentInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_statuses_deserialize_from_snake_case() {
        let report: StatusReport =
            serde_json::from_str(r#"{"status":"partially_paid"}"#).unwrap();
        assert_eq!(report.status, RemoteStatus::PartiallyPaid);
        assert!(report.denial_reasons.is_empty());
        assert!(report.payment.is_none());
    }

    #[test]
    fn pending_maps_to_no_status_change() {
        assert_eq!(RemoteStatus::Pending.claim_status(), None);
        assert_eq!(
            RemoteStatus::Paid.claim_status(),
            Some(ClaimStatus::Paid)
        );
    }
}
