//! Port over the external durable record store.
//!
//! The engine requires create/read/update on claims, lines, and events,
//! read-only access to plans, patients, and reports, and an atomic
//! status-plus-event commit (the two must land together or not at all).

use crate::models::{Claim, ClaimEvent, ClaimLine, ClaimStatus, InsurancePlan, Patient, Report};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use error_common::RevenueResult;
use uuid::Uuid;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a new claim with its lines and the initial audit event in
    /// one transaction.
    async fn create_claim(
        &self,
        claim: Claim,
        lines: Vec<ClaimLine>,
        event: ClaimEvent,
    ) -> RevenueResult<Claim>;

    async fn claim(&self, id: Uuid) -> RevenueResult<Claim>;

    async fn claim_lines(&self, claim_id: Uuid) -> RevenueResult<Vec<ClaimLine>>;

    /// Persist claim field mutations (monetary outcomes, artifact names,
    /// clearinghouse identifiers). Not for status changes; those go
    /// through [`RecordStore::commit_status`].
    async fn update_claim(&self, claim: &Claim) -> RevenueResult<()>;

    /// Replace the claim's lines wholesale. Used when procedure codes are
    /// regenerated from the source report.
    async fn replace_lines(&self, claim_id: Uuid, lines: Vec<ClaimLine>) -> RevenueResult<()>;

    /// Commit a claim mutation (including its status) together with the
    /// audit event recording it. Atomic: both or neither.
    async fn commit_status(&self, claim: &Claim, event: ClaimEvent) -> RevenueResult<()>;

    async fn append_event(&self, event: ClaimEvent) -> RevenueResult<()>;

    async fn events(&self, claim_id: Uuid) -> RevenueResult<Vec<ClaimEvent>>;

    async fn list_claims(
        &self,
        user_id: Uuid,
        status: Option<ClaimStatus>,
    ) -> RevenueResult<Vec<Claim>>;

    async fn plan(&self, id: Uuid) -> RevenueResult<InsurancePlan>;

    async fn patient(&self, id: Uuid) -> RevenueResult<Patient>;

    async fn report(&self, id: Uuid) -> RevenueResult<Report>;

    /// Service dates of the user's prior accepted/paid lines for a CPT
    /// code. Feeds necessity frequency limits.
    async fn prior_service_dates(
        &self,
        user_id: Uuid,
        cpt_code: &str,
    ) -> RevenueResult<Vec<NaiveDate>>;

    /// Lines belonging to the user's other claims created within the
    /// lookback window. Feeds duplicate-claim detection.
    async fn recent_lines(
        &self,
        user_id: Uuid,
        exclude_claim: Uuid,
        since: DateTime<Utc>,
    ) -> RevenueResult<Vec<ClaimLine>>;
}
