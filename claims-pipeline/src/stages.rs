//! The eight ordered pipeline stages.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    EligibilityCheck = 1,
    SpecimenTracking = 2,
    MedicalNecessity = 3,
    DenialRisk = 4,
    CodingPricing = 5,
    Submission = 6,
    StatusMonitoring = 7,
    RevenueAnalytics = 8,
}

impl Stage {
    /// Execution order of a full pipeline run.
    pub const ALL: [Stage; 8] = [
        Stage::EligibilityCheck,
        Stage::SpecimenTracking,
        Stage::MedicalNecessity,
        Stage::DenialRisk,
        Stage::CodingPricing,
        Stage::Submission,
        Stage::StatusMonitoring,
        Stage::RevenueAnalytics,
    ];

    /// Event-type tag written for this stage.
    pub fn name(self) -> &'static str {
        match self {
            Stage::EligibilityCheck => "eligibility_check",
            Stage::SpecimenTracking => "specimen_tracking",
            Stage::MedicalNecessity => "medical_necessity",
            Stage::DenialRisk => "denial_risk",
            Stage::CodingPricing => "coding_pricing",
            Stage::Submission => "submission",
            Stage::StatusMonitoring => "status_monitoring",
            Stage::RevenueAnalytics => "revenue_analytics",
        }
    }

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Stage> {
        Stage::ALL.into_iter().find(|s| s.number() == n)
    }
}
