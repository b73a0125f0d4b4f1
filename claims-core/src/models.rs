use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Insurance claim, the billing unit. Never physically deleted; terminal
/// states are retained for audit and analytics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub id: Uuid,
    pub user_id: Uuid,
    pub report_id: Option<Uuid>,
    pub insurance_plan_id: Option<Uuid>,
    /// Unique business key, `CLM-{base36 ts}-{base36 rand}`.
    pub claim_number: String,
    pub total_charge: Decimal,
    pub status: ClaimStatus,
    pub allowed_amount: Option<Decimal>,
    pub paid_amount: Option<Decimal>,
    pub patient_responsibility: Option<Decimal>,
    pub denial_reason: Option<String>,
    pub submission_date: Option<DateTime<Utc>>,
    pub processed_date: Option<DateTime<Utc>>,
    /// Name of the encoded EDI artifact (`{claimNumber}.edi`).
    pub edi_file: Option<String>,
    /// Tracking identifier assigned by the clearinghouse.
    pub clearinghouse_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Claim {
    /// Sum of `charge × units` over the claim's lines.
    pub fn line_total(lines: &[ClaimLine]) -> Decimal {
        lines
            .iter()
            .map(|line| line.charge * Decimal::from(line.units))
            .sum()
    }

    /// Whether the declared total matches the line total within one cent.
    pub fn reconciles(&self, lines: &[ClaimLine]) -> bool {
        let diff = self.total_charge - Self::line_total(lines);
        diff.abs() <= Decimal::new(1, 2)
    }
}

/// One billed service on a claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimLine {
    pub id: Uuid,
    pub claim_id: Uuid,
    /// 1-based, unique within the claim.
    pub line_number: u32,
    /// 5-digit CPT procedure code.
    pub cpt_code: String,
    pub description: String,
    /// ICD-10 diagnosis codes supporting this line.
    pub diagnosis_codes: Vec<String>,
    pub charge: Decimal,
    pub units: u32,
    pub modifier: Option<String>,
    pub service_date: NaiveDate,
}

/// Diagnosis codes aggregated across lines, deduplicated, first-seen
/// order preserved. Shared by the validator (1–12 per claim) and the EDI
/// HI segment builder.
pub fn aggregate_diagnosis_codes(lines: &[ClaimLine]) -> Vec<String> {
    let mut seen = Vec::new();
    for line in lines {
        for code in &line.diagnosis_codes {
            if !seen.contains(code) {
                seen.push(code.clone());
            }
        }
    }
    seen
}

/// Immutable audit record; one per pipeline stage and per status
/// transition. Append-only; this trail is the only mechanism for
/// reconstructing pipeline history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimEvent {
    pub id: Uuid,
    pub claim_id: Uuid,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ClaimEvent {
    pub fn new(claim_id: Uuid, event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            claim_id,
            event_type: event_type.into(),
            payload,
            note: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Claim lifecycle status. Forward-only; see [`crate::status`] for the
/// permitted edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Draft,
    Ready,
    Submitted,
    Accepted,
    Rejected,
    Denied,
    PartiallyPaid,
    Paid,
    Appealed,
}

/// Billing counterparty. Read-only within this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsurancePlan {
    pub id: Uuid,
    /// Owning user; claims may only bill plans owned by the same user.
    pub user_id: Uuid,
    pub name: String,
    pub payer_id: String,
    pub payer_name: String,
    pub member_id: String,
    pub group_number: Option<String>,
    /// Timely-filing window in days from the date of service.
    pub filing_window_days: u32,
    /// CPT codes this payer requires prior authorization for.
    pub prior_auth_required_codes: Vec<String>,
    /// CPT codes excluded from coverage under this plan.
    pub excluded_codes: Vec<String>,
    pub is_active: bool,
    pub termination_date: Option<DateTime<Utc>>,
}

/// Patient/subscriber demographics. Read-only within this core; consumed
/// by the EDI subscriber loop and the necessity age/gender constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

impl Patient {
    /// Age in whole years as of the given date.
    pub fn age_on(&self, date: NaiveDate) -> Option<u32> {
        self.date_of_birth.and_then(|dob| date.years_since(dob))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

/// Source clinical report. Read-only; supplies the panel codes claim
/// lines are derived from and the specimen custody timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub user_id: Uuid,
    pub report_date: NaiveDate,
    /// Ordered panel/procedure codes observed on the report.
    pub panel_codes: Vec<String>,
    /// Supporting ICD-10 diagnosis codes attached to every derived claim
    /// line.
    pub diagnosis_codes: Vec<String>,
    pub collected_at: Option<DateTime<Utc>>,
    pub received_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
}
