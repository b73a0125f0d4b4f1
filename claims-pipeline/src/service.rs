//! Claim creation and the query surface consumed by the web layer.

use chrono::Utc;
use claim_validation::ChargeCalculator;
use claims_core::{
    generate_claim_number, Claim, ClaimEvent, ClaimLine, ClaimStatus, InsurancePlan, RecordStore,
};
use error_common::{RevenueError, RevenueResult};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Creation input from the report-generation collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateClaimRequest {
    pub report_id: Uuid,
    pub insurance_plan_id: Uuid,
    pub user_id: Uuid,
}

/// One claim with everything the detail view renders.
#[derive(Debug, Clone)]
pub struct ClaimDetail {
    pub claim: Claim,
    pub lines: Vec<ClaimLine>,
    pub events: Vec<ClaimEvent>,
    pub plan: Option<InsurancePlan>,
}

pub struct ClaimService<S> {
    store: Arc<S>,
    pricing: ChargeCalculator,
}

impl<S: RecordStore> ClaimService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            pricing: ChargeCalculator::default(),
        }
    }

    pub fn with_pricing(mut self, pricing: ChargeCalculator) -> Self {
        self.pricing = pricing;
        self
    }

    /// Create a DRAFT claim from a report: lines derived from the
    /// report's panel codes through the fee schedule (bundling applied),
    /// auto-generated claim number, initial `created` event.
    pub async fn create_claim(&self, request: CreateClaimRequest) -> RevenueResult<Claim> {
        let report = self.store.report(request.report_id).await?;
        let plan = self.store.plan(request.insurance_plan_id).await?;
        if plan.user_id != request.user_id {
            return Err(RevenueError::authorization(
                "Insurance plan belongs to a different user",
            ));
        }
        if report.user_id != request.user_id {
            return Err(RevenueError::authorization(
                "Report belongs to a different user",
            ));
        }

        let claim_id = Uuid::new_v4();
        let lines = self.pricing.build_lines(
            claim_id,
            &report.panel_codes,
            &report.diagnosis_codes,
            report.report_date,
        );
        let total = Claim::line_total(&lines);
        let now = Utc::now();
        let claim = Claim {
            id: claim_id,
            user_id: request.user_id,
            report_id: Some(report.id),
            insurance_plan_id: Some(plan.id),
            claim_number: generate_claim_number(),
            total_charge: total,
            status: ClaimStatus::Draft,
            allowed_amount: None,
            paid_amount: None,
            patient_responsibility: None,
            denial_reason: None,
            submission_date: None,
            processed_date: None,
            edi_file: None,
            clearinghouse_id: None,
            created_at: now,
            updated_at: now,
        };
        let event = ClaimEvent::new(
            claim_id,
            "created",
            serde_json::json!({
                "claim_number": claim.claim_number,
                "line_count": lines.len(),
                "total_charge": total,
            }),
        );

        tracing::info!(
            claim_number = %claim.claim_number,
            lines = lines.len(),
            "claim created"
        );
        self.store.create_claim(claim, lines, event).await
    }

    pub async fn list_claims(
        &self,
        user_id: Uuid,
        status: Option<ClaimStatus>,
    ) -> RevenueResult<Vec<Claim>> {
        self.store.list_claims(user_id, status).await
    }

    /// Ownership-checked detail fetch.
    pub async fn get_claim(&self, id: Uuid, requesting_user: Uuid) -> RevenueResult<ClaimDetail> {
        let claim = self.store.claim(id).await?;
        if claim.user_id != requesting_user {
            return Err(RevenueError::authorization(
                "Claim belongs to a different user",
            ));
        }
        let lines = self.store.claim_lines(id).await?;
        let events = self.store.events(id).await?;
        let plan = match claim.insurance_plan_id {
            Some(plan_id) => Some(self.store.plan(plan_id).await?),
            None => None,
        };
        Ok(ClaimDetail {
            claim,
            lines,
            events,
            plan,
        })
    }
}
