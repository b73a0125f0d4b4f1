//! Versioned encoder configuration: trading-partner identity and the
//! billing provider rendered into every interchange.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageIndicator {
    Test,
    Production,
}

impl UsageIndicator {
    pub fn code(self) -> &'static str {
        match self {
            UsageIndicator::Test => "T",
            UsageIndicator::Production => "P",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub org_name: String,
    /// 10-digit National Provider Identifier.
    pub npi: String,
    pub tax_id: String,
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub contact_name: String,
    pub contact_phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdiConfig {
    /// Implementation guide version rendered in GS08 (e.g.
    /// `005010X222A1`).
    pub version: String,
    pub sender_id: String,
    pub sender_qualifier: String,
    pub receiver_id: String,
    pub receiver_qualifier: String,
    pub submitter_name: String,
    pub receiver_name: String,
    pub billing_provider: ProviderInfo,
    pub usage: UsageIndicator,
}

impl Default for EdiConfig {
    fn default() -> Self {
        Self {
            version: "005010X222A1".to_string(),
            sender_id: "REVCYCLE".to_string(),
            sender_qualifier: "ZZ".to_string(),
            receiver_id: "CLEARHOUSE".to_string(),
            receiver_qualifier: "ZZ".to_string(),
            submitter_name: "REVCYCLE BILLING".to_string(),
            receiver_name: "CLEARINGHOUSE".to_string(),
            billing_provider: ProviderInfo {
                org_name: "REVCYCLE LABORATORY".to_string(),
                npi: "1234567893".to_string(),
                tax_id: "123456789".to_string(),
                address_line: "100 COMMERCE WAY".to_string(),
                city: "AUSTIN".to_string(),
                state: "TX".to_string(),
                zip: "78701".to_string(),
                contact_name: "BILLING DEPT".to_string(),
                contact_phone: "5125550100".to_string(),
            },
            usage: UsageIndicator::Test,
        }
    }
}
