//! Stateless claim rule checker.
//!
//! All checks run; all violations are collected. An empty result means the
//! claim is valid.

use claims_core::{aggregate_diagnosis_codes, Claim, ClaimLine};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static CPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}$").expect("CPT pattern"));
// The decimal suffix is mandatory here: payers reject bare category codes
// (e.g. "Z00"), so billing codes must carry the specificity suffix.
static ICD10_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]\d{2}\.\d{1,4}$").expect("ICD-10 pattern"));

/// Maximum distinct diagnosis codes per claim (X12 HI limit).
pub const MAX_DIAGNOSES: usize = 12;

#[derive(Debug, Clone, Default)]
pub struct ClaimValidator;

impl ClaimValidator {
    pub fn new() -> Self {
        Self
    }

    /// Run every check and collect violations in priority order. Claims
    /// flagged as updates may omit the insurance plan reference.
    pub fn validate(&self, claim: &Claim, lines: &[ClaimLine], is_update: bool) -> Vec<String> {
        let mut violations = Vec::new();

        // Required header fields
        if claim.claim_number.trim().is_empty() {
            violations.push("Claim number is required".to_string());
        }
        if claim.insurance_plan_id.is_none() && !is_update {
            violations.push("Insurance plan is required".to_string());
        }

        if claim.total_charge.is_sign_negative() {
            violations.push(format!(
                "Total charge must not be negative ({})",
                claim.total_charge
            ));
        }

        if lines.is_empty() {
            violations.push("Claim must have at least one line".to_string());
        }

        for line in lines {
            if line.cpt_code.trim().is_empty() {
                violations.push(format!("Line {}: Procedure code is required", line.line_number));
            } else if !CPT_RE.is_match(&line.cpt_code) {
                violations.push(format!(
                    "Line {}: CPT code must be 5 digits (got '{}')",
                    line.line_number, line.cpt_code
                ));
            }

            for code in &line.diagnosis_codes {
                if !ICD10_RE.is_match(code) {
                    violations.push(format!(
                        "Line {}: Invalid ICD-10 format: '{}'",
                        line.line_number, code
                    ));
                }
            }

            if line.units == 0 {
                violations.push(format!("Line {}: Units must be positive", line.line_number));
            }
            if line.charge.is_sign_negative() || line.charge.is_zero() {
                violations.push(format!("Line {}: Charge must be positive", line.line_number));
            }
        }

        let mut seen = HashSet::new();
        if lines.iter().any(|l| !seen.insert(l.line_number)) {
            violations.push("Duplicate line numbers are not allowed".to_string());
        }

        let diagnoses = aggregate_diagnosis_codes(lines);
        if !lines.is_empty() && diagnoses.is_empty() {
            violations.push("Claim must carry at least one diagnosis code".to_string());
        }
        if diagnoses.len() > MAX_DIAGNOSES {
            violations.push(format!(
                "Claim carries {} diagnosis codes; at most {} are allowed",
                diagnoses.len(),
                MAX_DIAGNOSES
            ));
        }

        // Reconciliation: declared total vs computed line total, one cent
        // absolute tolerance. The message embeds both values.
        if !lines.is_empty() && !claim.reconciles(lines) {
            let computed = Claim::line_total(lines);
            violations.push(format!(
                "Total charge ({}) does not match sum of line charges ({:.2})",
                claim.total_charge, computed
            ));
        }

        violations
    }
}
