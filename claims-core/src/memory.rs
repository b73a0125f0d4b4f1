//! In-memory record store. Reference implementation of the port and the
//! backing store for the integration tests.

use crate::models::{Claim, ClaimEvent, ClaimLine, ClaimStatus, InsurancePlan, Patient, Report};
use crate::store::RecordStore;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use error_common::{RevenueError, RevenueResult};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    claims: HashMap<Uuid, Claim>,
    lines: HashMap<Uuid, Vec<ClaimLine>>,
    events: HashMap<Uuid, Vec<ClaimEvent>>,
    plans: HashMap<Uuid, InsurancePlan>,
    patients: HashMap<Uuid, Patient>,
    reports: HashMap<Uuid, Report>,
}

#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_plan(&self, plan: InsurancePlan) {
        self.inner.write().await.plans.insert(plan.id, plan);
    }

    pub async fn insert_patient(&self, patient: Patient) {
        self.inner.write().await.patients.insert(patient.id, patient);
    }

    pub async fn insert_report(&self, report: Report) {
        self.inner.write().await.reports.insert(report.id, report);
    }

    /// Seed a pre-existing claim directly (test setup for history-aware
    /// checks).
    pub async fn insert_claim(&self, claim: Claim, lines: Vec<ClaimLine>) {
        let mut inner = self.inner.write().await;
        inner.lines.insert(claim.id, lines);
        inner.claims.insert(claim.id, claim);
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn create_claim(
        &self,
        claim: Claim,
        lines: Vec<ClaimLine>,
        event: ClaimEvent,
    ) -> RevenueResult<Claim> {
        let mut inner = self.inner.write().await;
        if inner.claims.values().any(|c| c.claim_number == claim.claim_number) {
            return Err(RevenueError::Store(format!(
                "Duplicate claim number: {}",
                claim.claim_number
            )));
        }
        inner.lines.insert(claim.id, lines);
        inner.events.entry(claim.id).or_default().push(event);
        inner.claims.insert(claim.id, claim.clone());
        Ok(claim)
    }

    async fn claim(&self, id: Uuid) -> RevenueResult<Claim> {
        self.inner
            .read()
            .await
            .claims
            .get(&id)
            .cloned()
            .ok_or_else(|| RevenueError::not_found("Claim", id.to_string()))
    }

    async fn claim_lines(&self, claim_id: Uuid) -> RevenueResult<Vec<ClaimLine>> {
        Ok(self
            .inner
            .read()
            .await
            .lines
            .get(&claim_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_claim(&self, claim: &Claim) -> RevenueResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.claims.contains_key(&claim.id) {
            return Err(RevenueError::not_found("Claim", claim.id.to_string()));
        }
        let mut updated = claim.clone();
        updated.updated_at = Utc::now();
        inner.claims.insert(claim.id, updated);
        Ok(())
    }

    async fn replace_lines(&self, claim_id: Uuid, lines: Vec<ClaimLine>) -> RevenueResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.claims.contains_key(&claim_id) {
            return Err(RevenueError::not_found("Claim", claim_id.to_string()));
        }
        inner.lines.insert(claim_id, lines);
        Ok(())
    }

    async fn commit_status(&self, claim: &Claim, event: ClaimEvent) -> RevenueResult<()> {
        // Single lock scope: the claim mutation and its event land together.
        let mut inner = self.inner.write().await;
        if !inner.claims.contains_key(&claim.id) {
            return Err(RevenueError::not_found("Claim", claim.id.to_string()));
        }
        let mut updated = claim.clone();
        updated.updated_at = Utc::now();
        inner.claims.insert(claim.id, updated);
        inner.events.entry(claim.id).or_default().push(event);
        Ok(())
    }

    async fn append_event(&self, event: ClaimEvent) -> RevenueResult<()> {
        self.inner
            .write()
            .await
            .events
            .entry(event.claim_id)
            .or_default()
            .push(event);
        Ok(())
    }

    async fn events(&self, claim_id: Uuid) -> RevenueResult<Vec<ClaimEvent>> {
        Ok(self
            .inner
            .read()
            .await
            .events
            .get(&claim_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_claims(
        &self,
        user_id: Uuid,
        status: Option<ClaimStatus>,
    ) -> RevenueResult<Vec<Claim>> {
        let inner = self.inner.read().await;
        let mut claims: Vec<Claim> = inner
            .claims
            .values()
            .filter(|c| c.user_id == user_id)
            .filter(|c| status.map_or(true, |s| c.status == s))
            .cloned()
            .collect();
        claims.sort_by_key(|c| c.created_at);
        Ok(claims)
    }

    async fn plan(&self, id: Uuid) -> RevenueResult<InsurancePlan> {
        self.inner
            .read()
            .await
            .plans
            .get(&id)
            .cloned()
            .ok_or_else(|| RevenueError::not_found("InsurancePlan", id.to_string()))
    }

    async fn patient(&self, id: Uuid) -> RevenueResult<Patient> {
        self.inner
            .read()
            .await
            .patients
            .get(&id)
            .cloned()
            .ok_or_else(|| RevenueError::not_found("Patient", id.to_string()))
    }

    async fn report(&self, id: Uuid) -> RevenueResult<Report> {
        self.inner
            .read()
            .await
            .reports
            .get(&id)
            .cloned()
            .ok_or_else(|| RevenueError::not_found("Report", id.to_string()))
    }

    async fn prior_service_dates(
        &self,
        user_id: Uuid,
        cpt_code: &str,
    ) -> RevenueResult<Vec<NaiveDate>> {
        let inner = self.inner.read().await;
        let mut dates = Vec::new();
        for claim in inner.claims.values() {
            if claim.user_id != user_id {
                continue;
            }
            if !matches!(
                claim.status,
                ClaimStatus::Accepted | ClaimStatus::PartiallyPaid | ClaimStatus::Paid
            ) {
                continue;
            }
            if let Some(lines) = inner.lines.get(&claim.id) {
                dates.extend(
                    lines
                        .iter()
                        .filter(|l| l.cpt_code == cpt_code)
                        .map(|l| l.service_date),
                );
            }
        }
        dates.sort();
        Ok(dates)
    }

    async fn recent_lines(
        &self,
        user_id: Uuid,
        exclude_claim: Uuid,
        since: DateTime<Utc>,
    ) -> RevenueResult<Vec<ClaimLine>> {
        let inner = self.inner.read().await;
        let mut out = Vec::new();
        for claim in inner.claims.values() {
            if claim.user_id != user_id || claim.id == exclude_claim {
                continue;
            }
            if claim.created_at < since {
                continue;
            }
            if let Some(lines) = inner.lines.get(&claim.id) {
                out.extend(lines.iter().cloned());
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_claim(user_id: Uuid, status: ClaimStatus) -> (Claim, Vec<ClaimLine>) {
        let claim_id = Uuid::new_v4();
        let claim = Claim {
            id: claim_id,
            user_id,
            report_id: None,
            insurance_plan_id: Some(Uuid::new_v4()),
            claim_number: crate::numbers::generate_claim_number(),
            total_charge: dec!(150.00),
            status,
            allowed_amount: None,
            paid_amount: None,
            patient_responsibility: None,
            denial_reason: None,
            submission_date: None,
            processed_date: None,
            edi_file: None,
            clearinghouse_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let lines = vec![ClaimLine {
            id: Uuid::new_v4(),
            claim_id,
            line_number: 1,
            cpt_code: "80053".to_string(),
            description: "Comprehensive metabolic panel".to_string(),
            diagnosis_codes: vec!["E11.9".to_string()],
            charge: dec!(150.00),
            units: 1,
            modifier: None,
            service_date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
        }];
        (claim, lines)
    }

    #[tokio::test]
    async fn create_and_fetch_round_trip() {
        let store = InMemoryStore::new();
        let user = Uuid::new_v4();
        let (claim, lines) = sample_claim(user, ClaimStatus::Draft);
        let event = ClaimEvent::new(claim.id, "created", serde_json::json!({}));
        let created = store.create_claim(claim, lines, event).await.unwrap();

        let fetched = store.claim(created.id).await.unwrap();
        assert_eq!(fetched.claim_number, created.claim_number);
        assert_eq!(store.claim_lines(created.id).await.unwrap().len(), 1);
        assert_eq!(store.events(created.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_claim_numbers_are_refused() {
        let store = InMemoryStore::new();
        let user = Uuid::new_v4();
        let (mut a, lines_a) = sample_claim(user, ClaimStatus::Draft);
        a.claim_number = "CLM-dup".to_string();
        let (mut b, lines_b) = sample_claim(user, ClaimStatus::Draft);
        b.claim_number = "CLM-dup".to_string();

        store
            .create_claim(a.clone(), lines_a, ClaimEvent::new(a.id, "created", serde_json::json!({})))
            .await
            .unwrap();
        let err = store
            .create_claim(b.clone(), lines_b, ClaimEvent::new(b.id, "created", serde_json::json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, RevenueError::Store(_)));
    }

    #[tokio::test]
    async fn commit_status_writes_claim_and_event_together() {
        let store = InMemoryStore::new();
        let user = Uuid::new_v4();
        let (claim, lines) = sample_claim(user, ClaimStatus::Draft);
        let created = store
            .create_claim(claim, lines, ClaimEvent::new(Uuid::new_v4(), "created", serde_json::json!({})))
            .await
            .unwrap();

        let mut updated = created.clone();
        updated.status = ClaimStatus::Ready;
        let event = ClaimEvent::new(created.id, "status_changed", serde_json::json!({"to": "ready"}));
        store.commit_status(&updated, event).await.unwrap();

        assert_eq!(store.claim(created.id).await.unwrap().status, ClaimStatus::Ready);
        let events = store.events(created.id).await.unwrap();
        assert_eq!(events.last().unwrap().event_type, "status_changed");
    }

    #[tokio::test]
    async fn prior_service_dates_only_counts_adjudicated_claims() {
        let store = InMemoryStore::new();
        let user = Uuid::new_v4();
        let (paid, paid_lines) = sample_claim(user, ClaimStatus::Paid);
        let (draft, draft_lines) = sample_claim(user, ClaimStatus::Draft);
        store.insert_claim(paid, paid_lines).await;
        store.insert_claim(draft, draft_lines).await;

        let dates = store.prior_service_dates(user, "80053").await.unwrap();
        assert_eq!(dates.len(), 1);
    }

    #[tokio::test]
    async fn list_claims_filters_by_owner_and_status() {
        let store = InMemoryStore::new();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let (a, a_lines) = sample_claim(owner, ClaimStatus::Draft);
        let (b, b_lines) = sample_claim(owner, ClaimStatus::Paid);
        let (c, c_lines) = sample_claim(stranger, ClaimStatus::Draft);
        store.insert_claim(a, a_lines).await;
        store.insert_claim(b, b_lines).await;
        store.insert_claim(c, c_lines).await;

        assert_eq!(store.list_claims(owner, None).await.unwrap().len(), 2);
        assert_eq!(
            store
                .list_claims(owner, Some(ClaimStatus::Paid))
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
