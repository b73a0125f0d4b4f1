//! Stage sequencing over one claim.
//!
//! Each stage loads the claim with what it needs, invokes one component,
//! writes one audit event, and commits any status change atomically with
//! that event. Stage failures append a failure event and re-raise; no
//! stage swallows an error.

use crate::lease::ClaimLeases;
use crate::stages::Stage;
use chrono::{Duration, Utc};
use claim_validation::{ChargeCalculator, ClaimValidator, MedicalNecessityValidator};
use claims_core::status::transition;
use claims_core::{
    aggregate_diagnosis_codes, Claim, ClaimEvent, ClaimLine, ClaimStatus, RecordStore,
    ServiceHistory,
};
use clearinghouse::{
    ClearinghouseGateway, RemoteStatus, SubmissionClient, SubmissionStatus,
};
use denial_prediction::{ClaimContext, DenialRiskPredictor};
use edi_codec::{ClaimGraph, Edi837Encoder};
use error_common::{RevenueError, RevenueResult};
use revenue_analytics::RevenueOptimizer;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Days of claim history scanned for duplicate-line detection.
const DUPLICATE_LOOKBACK_DAYS: i64 = 30;

pub struct Orchestrator<S, G> {
    store: Arc<S>,
    validator: ClaimValidator,
    necessity: MedicalNecessityValidator,
    predictor: DenialRiskPredictor,
    pricing: ChargeCalculator,
    encoder: Edi837Encoder,
    client: SubmissionClient<G>,
    optimizer: RevenueOptimizer,
    leases: ClaimLeases,
}

impl<S, G> Orchestrator<S, G>
where
    S: RecordStore,
    G: ClearinghouseGateway,
{
    pub fn new(store: Arc<S>, client: SubmissionClient<G>) -> Self {
        Self {
            store,
            validator: ClaimValidator::new(),
            necessity: MedicalNecessityValidator::default(),
            predictor: DenialRiskPredictor::default(),
            pricing: ChargeCalculator::default(),
            encoder: Edi837Encoder::default(),
            client,
            optimizer: RevenueOptimizer,
            leases: ClaimLeases::new(),
        }
    }

    pub fn with_encoder(mut self, encoder: Edi837Encoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_predictor(mut self, predictor: DenialRiskPredictor) -> Self {
        self.predictor = predictor;
        self
    }

    /// Full pipeline run: stages 1–8 in order under the claim's lease.
    pub async fn run(&self, claim_id: Uuid) -> RevenueResult<()> {
        let _lease = self.leases.acquire(claim_id).await;
        tracing::info!(%claim_id, "pipeline run started");
        for stage in Stage::ALL {
            self.execute(claim_id, stage).await?;
        }
        tracing::info!(%claim_id, "pipeline run completed");
        Ok(())
    }

    /// One stage under the claim's lease. Stages are idempotent given the
    /// same inputs, so a failed run resumes here.
    pub async fn run_stage(&self, claim_id: Uuid, stage: Stage) -> RevenueResult<()> {
        let _lease = self.leases.acquire(claim_id).await;
        self.execute(claim_id, stage).await
    }

    async fn execute(&self, claim_id: Uuid, stage: Stage) -> RevenueResult<()> {
        tracing::debug!(%claim_id, stage = stage.name(), "stage started");
        let result = match stage {
            Stage::EligibilityCheck => self.eligibility_check(claim_id).await,
            Stage::SpecimenTracking => self.specimen_tracking(claim_id).await,
            Stage::MedicalNecessity => self.medical_necessity(claim_id).await,
            Stage::DenialRisk => self.denial_risk(claim_id).await,
            Stage::CodingPricing => self.coding_pricing(claim_id).await,
            Stage::Submission => self.submission(claim_id).await,
            Stage::StatusMonitoring => self.status_monitoring(claim_id).await,
            Stage::RevenueAnalytics => self.revenue_analytics(claim_id).await,
        };
        if let Err(err) = &result {
            tracing::error!(%claim_id, stage = stage.name(), error = %err, "stage failed");
            let event = ClaimEvent::new(
                claim_id,
                format!("{}_failed", stage.name()),
                serde_json::json!({
                    "errors": err.error_messages(),
                    "retryable": err.is_retryable(),
                }),
            );
            if let Err(append_err) = self.store.append_event(event).await {
                tracing::error!(%claim_id, error = %append_err, "failed to record stage failure");
            }
        }
        result
    }

    /// Stage 1: claim validation, plan ownership/activity, and the list
    /// of lines needing prior authorization.
    async fn eligibility_check(&self, claim_id: Uuid) -> RevenueResult<()> {
        let claim = self.store.claim(claim_id).await?;
        let lines = self.store.claim_lines(claim_id).await?;

        let violations = self.validator.validate(&claim, &lines, false);
        if !violations.is_empty() {
            return Err(RevenueError::Validation(violations));
        }

        // The validator guarantees the plan reference is present.
        let plan_id = claim
            .insurance_plan_id
            .ok_or_else(|| RevenueError::validation("Insurance plan is required"))?;
        let plan = self.store.plan(plan_id).await?;
        if plan.user_id != claim.user_id {
            return Err(RevenueError::authorization(
                "Insurance plan belongs to a different user",
            ));
        }
        let plan_active =
            plan.is_active && plan.termination_date.map_or(true, |t| t > Utc::now());
        if !plan_active {
            return Err(RevenueError::validation("Insurance plan is not active"));
        }

        let mut prior_auth_required: Vec<String> = Vec::new();
        for line in &lines {
            if plan.prior_auth_required_codes.contains(&line.cpt_code)
                && !prior_auth_required.contains(&line.cpt_code)
            {
                prior_auth_required.push(line.cpt_code.clone());
            }
        }

        self.store
            .append_event(ClaimEvent::new(
                claim_id,
                Stage::EligibilityCheck.name(),
                serde_json::json!({
                    "violations": [],
                    "plan_active": true,
                    "prior_auth_required": prior_auth_required,
                }),
            ))
            .await
    }

    /// Stage 2: specimen chain of custody reconstructed from the source
    /// report's timestamps.
    async fn specimen_tracking(&self, claim_id: Uuid) -> RevenueResult<()> {
        let claim = self.store.claim(claim_id).await?;
        let payload = match claim.report_id {
            Some(report_id) => {
                let report = self.store.report(report_id).await?;
                let steps = [
                    ("collected", report.collected_at),
                    ("received", report.received_at),
                    ("processed", report.processed_at),
                ];
                let chain: Vec<serde_json::Value> = steps
                    .iter()
                    .filter_map(|(step, at)| {
                        at.map(|at| serde_json::json!({"step": step, "at": at}))
                    })
                    .collect();
                serde_json::json!({
                    "chain": chain,
                    "complete": chain.len() == steps.len(),
                })
            }
            None => serde_json::json!({"no_source_report": true}),
        };
        self.store
            .append_event(ClaimEvent::new(
                claim_id,
                Stage::SpecimenTracking.name(),
                payload,
            ))
            .await
    }

    /// Stage 3: medical-necessity findings are data, never an error.
    async fn medical_necessity(&self, claim_id: Uuid) -> RevenueResult<()> {
        let claim = self.store.claim(claim_id).await?;
        let lines = self.store.claim_lines(claim_id).await?;
        let patient = self.store.patient(claim.user_id).await?;
        let history = self.service_history(claim.user_id, &lines).await?;

        let outcome = self.necessity.evaluate(&lines, &patient, &history);
        tracing::debug!(%claim_id, necessary = outcome.necessary, score = outcome.score, "necessity evaluated");
        self.store
            .append_event(ClaimEvent::new(
                claim_id,
                Stage::MedicalNecessity.name(),
                to_payload(&outcome)?,
            ))
            .await
    }

    /// Stage 4: denial-risk scoring against the pattern catalogue.
    async fn denial_risk(&self, claim_id: Uuid) -> RevenueResult<()> {
        let claim = self.store.claim(claim_id).await?;
        let lines = self.store.claim_lines(claim_id).await?;
        let plan_id = claim
            .insurance_plan_id
            .ok_or_else(|| RevenueError::validation("Insurance plan is required"))?;
        let plan = self.store.plan(plan_id).await?;

        let now = Utc::now();
        let mut context = ClaimContext::new(now);
        context.history = self.service_history(claim.user_id, &lines).await?;
        context.recent_lines = self
            .store
            .recent_lines(
                claim.user_id,
                claim.id,
                now - Duration::days(DUPLICATE_LOOKBACK_DAYS),
            )
            .await?;

        let assessment = self.predictor.assess(&claim, &lines, &plan, &context);
        tracing::info!(
            %claim_id,
            risk_score = assessment.risk_score,
            denial_probability = assessment.denial_probability,
            "denial risk assessed"
        );
        self.store
            .append_event(ClaimEvent::new(
                claim_id,
                Stage::DenialRisk.name(),
                to_payload(&assessment)?,
            ))
            .await
    }

    /// Stage 5: regenerate procedure codes from the report, reprice, and
    /// advance Draft → Ready. Skipped once the claim is past Ready.
    async fn coding_pricing(&self, claim_id: Uuid) -> RevenueResult<()> {
        let mut claim = self.store.claim(claim_id).await?;
        if !matches!(claim.status, ClaimStatus::Draft | ClaimStatus::Ready) {
            return self.skip(claim_id, Stage::CodingPricing, "already_priced").await;
        }
        let mut lines = self.store.claim_lines(claim_id).await?;

        if let Some(report_id) = claim.report_id {
            let report = self.store.report(report_id).await?;
            if !report.panel_codes.is_empty() {
                // Existing-line diagnoses carry over when the report has
                // none of its own.
                let diagnoses = if report.diagnosis_codes.is_empty() {
                    aggregate_diagnosis_codes(&lines)
                } else {
                    report.diagnosis_codes.clone()
                };
                lines = self.pricing.build_lines(
                    claim.id,
                    &report.panel_codes,
                    &diagnoses,
                    report.report_date,
                );
            }
        }
        let total = self.pricing.reprice(&mut lines);
        self.store.replace_lines(claim.id, lines.clone()).await?;

        claim.total_charge = total;
        claim.status = transition(claim.status, ClaimStatus::Ready)?;
        self.store
            .commit_status(
                &claim,
                ClaimEvent::new(
                    claim_id,
                    Stage::CodingPricing.name(),
                    serde_json::json!({
                        "line_count": lines.len(),
                        "total_charge": total,
                        "status": claim.status,
                    }),
                ),
            )
            .await
    }

    /// Stage 6: encode, pre-validate, submit. Claim fields change only
    /// after the gateway call returns; a transport failure leaves the
    /// claim in its last committed status.
    async fn submission(&self, claim_id: Uuid) -> RevenueResult<()> {
        let mut claim = self.store.claim(claim_id).await?;
        if claim.clearinghouse_id.is_some() && claim.status != ClaimStatus::Ready {
            return self.skip(claim_id, Stage::Submission, "already_submitted").await;
        }
        if claim.status != ClaimStatus::Ready {
            return Err(RevenueError::validation(
                "Claim must be priced before submission",
            ));
        }

        let lines = self.store.claim_lines(claim_id).await?;
        let plan_id = claim
            .insurance_plan_id
            .ok_or_else(|| RevenueError::validation("Insurance plan is required"))?;
        let plan = self.store.plan(plan_id).await?;
        if plan.user_id != claim.user_id {
            return Err(RevenueError::authorization(
                "Insurance plan belongs to a different user",
            ));
        }
        let subscriber = self.store.patient(claim.user_id).await?;

        let graph = ClaimGraph::new(&claim, &lines, &subscriber, &plan);
        let document = self.encoder.encode(&graph, None)?;
        let outcome = self.client.submit(&claim.claim_number, &document.content).await?;

        claim.edi_file = Some(document.file_name.clone());
        claim.submission_date = Some(Utc::now());
        claim.status = transition(claim.status, ClaimStatus::Submitted)?;

        match outcome.status {
            SubmissionStatus::Accepted | SubmissionStatus::Pending => {
                claim.clearinghouse_id = outcome.tracking_id.clone();
                self.store
                    .commit_status(
                        &claim,
                        ClaimEvent::new(
                            claim_id,
                            Stage::Submission.name(),
                            serde_json::json!({
                                "status": outcome.status,
                                "tracking_id": outcome.tracking_id,
                                "edi_file": document.file_name,
                                "control_number": document.control_number,
                            }),
                        ),
                    )
                    .await
            }
            SubmissionStatus::Rejected => {
                claim.status = transition(claim.status, ClaimStatus::Rejected)?;
                claim.denial_reason = Some(outcome.rejection_reasons.join("; "));
                self.store
                    .commit_status(
                        &claim,
                        ClaimEvent::new(
                            claim_id,
                            Stage::Submission.name(),
                            serde_json::json!({
                                "status": outcome.status,
                                "rejection_reasons": outcome.rejection_reasons,
                                "edi_file": document.file_name,
                            }),
                        ),
                    )
                    .await
            }
        }
    }

    /// Stage 7: poll the clearinghouse, map the external status onto the
    /// state machine, record next steps.
    async fn status_monitoring(&self, claim_id: Uuid) -> RevenueResult<()> {
        let mut claim = self.store.claim(claim_id).await?;
        let Some(tracking_id) = claim.clearinghouse_id.clone() else {
            return self.skip(claim_id, Stage::StatusMonitoring, "not_submitted").await;
        };

        let report = self.client.check_status(&tracking_id).await?;
        let next_steps = next_steps(report.status);
        let payload = serde_json::json!({
            "external_status": report.status,
            "next_steps": next_steps,
        });

        let Some(target) = report.status.claim_status() else {
            return self
                .store
                .append_event(ClaimEvent::new(
                    claim_id,
                    Stage::StatusMonitoring.name(),
                    payload,
                ))
                .await;
        };

        if claim.status != target {
            // A terminal outcome reported against a Submitted claim
            // passed through acceptance remotely.
            let from = if claim.status == ClaimStatus::Submitted
                && matches!(
                    target,
                    ClaimStatus::Denied | ClaimStatus::PartiallyPaid | ClaimStatus::Paid
                ) {
                transition(claim.status, ClaimStatus::Accepted)?
            } else {
                claim.status
            };
            claim.status = transition(from, target)?;
        }
        if let Some(payment) = &report.payment {
            claim.allowed_amount = payment.allowed_amount;
            claim.paid_amount = payment.paid_amount;
            claim.patient_responsibility = payment.patient_responsibility;
        }
        if !report.denial_reasons.is_empty() {
            claim.denial_reason = Some(report.denial_reasons.join("; "));
        }
        if matches!(
            claim.status,
            ClaimStatus::Denied | ClaimStatus::PartiallyPaid | ClaimStatus::Paid
        ) {
            claim.processed_date = Some(Utc::now());
        }
        self.store
            .commit_status(
                &claim,
                ClaimEvent::new(claim_id, Stage::StatusMonitoring.name(), payload),
            )
            .await
    }

    /// Stage 8: portfolio analytics over the owner's claim history.
    async fn revenue_analytics(&self, claim_id: Uuid) -> RevenueResult<()> {
        let claim = self.store.claim(claim_id).await?;
        let claims = self.store.list_claims(claim.user_id, None).await?;
        let mut portfolio: Vec<(Claim, Vec<ClaimLine>)> = Vec::with_capacity(claims.len());
        for c in claims {
            let lines = self.store.claim_lines(c.id).await?;
            portfolio.push((c, lines));
        }
        let analytics = self.optimizer.analyze(&portfolio, Utc::now());
        self.store
            .append_event(ClaimEvent::new(
                claim_id,
                Stage::RevenueAnalytics.name(),
                to_payload(&analytics)?,
            ))
            .await
    }

    async fn skip(&self, claim_id: Uuid, stage: Stage, reason: &str) -> RevenueResult<()> {
        tracing::debug!(%claim_id, stage = stage.name(), reason, "stage skipped");
        self.store
            .append_event(ClaimEvent::new(
                claim_id,
                stage.name(),
                serde_json::json!({"skipped": reason}),
            ))
            .await
    }

    /// Prior accepted/paid service dates per distinct CPT on the claim.
    async fn service_history(
        &self,
        user_id: Uuid,
        lines: &[ClaimLine],
    ) -> RevenueResult<ServiceHistory> {
        let mut history = ServiceHistory::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for line in lines {
            if seen.insert(&line.cpt_code) {
                let dates = self
                    .store
                    .prior_service_dates(user_id, &line.cpt_code)
                    .await?;
                history.insert(line.cpt_code.clone(), dates);
            }
        }
        Ok(history)
    }
}

/// Stage 7 recommended next steps, keyed off the external status.
pub fn next_steps(status: RemoteStatus) -> Vec<&'static str> {
    match status {
        RemoteStatus::Rejected => vec![
            "Review rejection reasons",
            "Correct the claim",
            "Resubmit",
        ],
        RemoteStatus::Denied => vec![
            "Review denial reason",
            "Gather supporting documentation",
            "Consider appeal",
        ],
        RemoteStatus::Pending => vec!["Continue monitoring"],
        _ => vec!["Monitor for payment"],
    }
}

fn to_payload<T: serde::Serialize>(value: &T) -> RevenueResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| RevenueError::Other(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_steps_follow_the_external_status() {
        assert_eq!(
            next_steps(RemoteStatus::Rejected),
            vec!["Review rejection reasons", "Correct the claim", "Resubmit"]
        );
        assert_eq!(next_steps(RemoteStatus::Pending), vec!["Continue monitoring"]);
        assert_eq!(next_steps(RemoteStatus::Paid), vec!["Monitor for payment"]);
        assert_eq!(
            next_steps(RemoteStatus::Denied),
            vec![
                "Review denial reason",
                "Gather supporting documentation",
                "Consider appeal"
            ]
        );
    }
}
