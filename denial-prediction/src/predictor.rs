//! Nine-check denial risk predictor.

use crate::patterns::{self, DenialPatternTable};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use claim_validation::NecessityRuleSet;
use claims_core::{Claim, ClaimLine, InsurancePlan, ServiceHistory};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn multiplier(self) -> f64 {
        match self {
            Severity::High => 1.0,
            Severity::Medium => 0.6,
            Severity::Low => 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskFactor {
    /// Key into the denial pattern table.
    pub pattern: String,
    pub severity: Severity,
    pub detail: String,
    pub recommendation: String,
}

impl RiskFactor {
    fn new(
        pattern: &str,
        severity: Severity,
        detail: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            pattern: pattern.to_string(),
            severity,
            detail: detail.into(),
            recommendation: recommendation.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DenialRiskAssessment {
    /// Weighted average of factor severities, in [0, 1].
    pub risk_score: f64,
    /// Average of pattern-weight × severity-multiplier, clamped to [0, 1].
    pub denial_probability: f64,
    /// Rises with factor count, capped at 0.95.
    pub confidence: f64,
    pub factors: Vec<RiskFactor>,
    pub recommendations: Vec<String>,
}

/// Everything the checks need beyond the claim itself, assembled by the
/// orchestrator so the predictor stays side-effect free.
#[derive(Debug, Clone)]
pub struct ClaimContext {
    /// CPT codes with a prior authorization already on file.
    pub authorized_codes: HashSet<String>,
    pub history: ServiceHistory,
    /// Lines of the user's other recent claims (duplicate lookback).
    pub recent_lines: Vec<ClaimLine>,
    pub now: DateTime<Utc>,
}

impl ClaimContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            authorized_codes: HashSet::new(),
            history: ServiceHistory::new(),
            recent_lines: Vec::new(),
            now,
        }
    }
}

/// Tunables for the structural checks. Configuration data, not code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Modifiers the payer network recognises.
    pub known_modifiers: Vec<String>,
    /// CPT code → modifier the payer requires on that code.
    pub required_modifiers: HashMap<String, String>,
    /// Services no payer in the network covers.
    pub excluded_services: Vec<String>,
    /// Days within the filing deadline that trigger a proximity warning.
    pub filing_warning_days: u32,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            known_modifiers: ["25", "26", "59", "76", "77", "91", "GT", "TC", "QW"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            required_modifiers: HashMap::new(),
            excluded_services: vec!["81599".to_string(), "84999".to_string()],
            filing_warning_days: 14,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DenialRiskPredictor {
    patterns: DenialPatternTable,
    rules: NecessityRuleSet,
    config: PredictorConfig,
}

impl DenialRiskPredictor {
    pub fn new(patterns: DenialPatternTable, rules: NecessityRuleSet, config: PredictorConfig) -> Self {
        Self { patterns, rules, config }
    }

    pub fn assess(
        &self,
        claim: &Claim,
        lines: &[ClaimLine],
        plan: &InsurancePlan,
        context: &ClaimContext,
    ) -> DenialRiskAssessment {
        let mut factors = Vec::new();
        factors.extend(self.check_prior_auth(lines, plan, context));
        factors.extend(self.check_diagnoses(lines));
        factors.extend(self.check_frequency(lines, context));
        factors.extend(self.check_modifier_validity(lines));
        factors.extend(self.check_timely_filing(claim, lines, plan, context));
        factors.extend(self.check_duplicates(lines, context));
        factors.extend(self.check_plan_exclusions(lines, plan));
        factors.extend(self.check_required_modifiers(lines));
        factors.extend(self.check_excluded_services(lines));

        let assessment = self.aggregate(factors);
        tracing::debug!(
            claim_number = %claim.claim_number,
            risk_score = assessment.risk_score,
            denial_probability = assessment.denial_probability,
            factors = assessment.factors.len(),
            "denial risk assessed"
        );
        assessment
    }

    fn aggregate(&self, factors: Vec<RiskFactor>) -> DenialRiskAssessment {
        if factors.is_empty() {
            return DenialRiskAssessment {
                risk_score: 0.0,
                denial_probability: 0.0,
                confidence: 0.5,
                factors,
                recommendations: Vec::new(),
            };
        }

        let n = factors.len() as f64;
        let risk_score = factors.iter().map(|f| f.severity.multiplier()).sum::<f64>() / n;
        let denial_probability = (factors
            .iter()
            .map(|f| self.patterns.weight(&f.pattern) * f.severity.multiplier())
            .sum::<f64>()
            / n)
            .clamp(0.0, 1.0);
        let confidence = (0.5 + 0.05 * n).min(0.95);

        let mut recommendations: Vec<String> = Vec::new();
        for factor in &factors {
            if !recommendations.contains(&factor.recommendation) {
                recommendations.push(factor.recommendation.clone());
            }
        }
        if risk_score > 0.7 {
            recommendations.push("Route claim for manual review before submission".to_string());
        }
        if risk_score > 0.5 {
            recommendations.push("Verify supporting documentation is attached".to_string());
        }

        DenialRiskAssessment {
            risk_score,
            denial_probability,
            confidence,
            factors,
            recommendations,
        }
    }

    fn check_prior_auth(
        &self,
        lines: &[ClaimLine],
        plan: &InsurancePlan,
        context: &ClaimContext,
    ) -> Vec<RiskFactor> {
        lines
            .iter()
            .filter(|l| plan.prior_auth_required_codes.contains(&l.cpt_code))
            .filter(|l| !context.authorized_codes.contains(&l.cpt_code))
            .map(|l| {
                RiskFactor::new(
                    patterns::MISSING_PRIOR_AUTH,
                    Severity::High,
                    format!("{} requires prior authorization under plan {}", l.cpt_code, plan.payer_id),
                    format!("Obtain prior authorization from {} for {}", plan.payer_name, l.cpt_code),
                )
            })
            .collect()
    }

    fn check_diagnoses(&self, lines: &[ClaimLine]) -> Vec<RiskFactor> {
        let mut factors = Vec::new();
        for line in lines {
            if line.diagnosis_codes.is_empty() {
                factors.push(RiskFactor::new(
                    patterns::MISSING_DIAGNOSIS,
                    Severity::High,
                    format!("Line {} carries no diagnosis code", line.line_number),
                    "Add the supporting diagnosis to every service line".to_string(),
                ));
                continue;
            }
            let rules = self.rules.rules_for(&line.cpt_code);
            let prefix_rules: Vec<_> = rules
                .iter()
                .filter(|r| !r.diagnosis_prefixes.is_empty())
                .collect();
            if prefix_rules.is_empty() {
                continue;
            }
            let compatible = prefix_rules.iter().any(|rule| {
                line.diagnosis_codes.iter().any(|code| {
                    rule.diagnosis_prefixes
                        .iter()
                        .any(|p| code.starts_with(p.as_str()))
                })
            });
            if !compatible {
                factors.push(RiskFactor::new(
                    patterns::INVALID_DIAGNOSIS,
                    Severity::Medium,
                    format!(
                        "Diagnoses on line {} do not support {}",
                        line.line_number, line.cpt_code
                    ),
                    "Review diagnosis coding against payer coverage policy".to_string(),
                ));
            }
        }
        factors
    }

    fn check_frequency(&self, lines: &[ClaimLine], context: &ClaimContext) -> Vec<RiskFactor> {
        let mut factors = Vec::new();
        for line in lines {
            for rule in self.rules.rules_for(&line.cpt_code) {
                let Some(limit) = rule.frequency else { continue };
                let prior =
                    context
                        .history
                        .count_within(&line.cpt_code, limit.period_days, line.service_date);
                if prior as u32 >= limit.count {
                    factors.push(RiskFactor::new(
                        patterns::FREQUENCY_EXCEEDED,
                        Severity::High,
                        format!(
                            "{} already performed {} times in {} days",
                            line.cpt_code, prior, limit.period_days
                        ),
                        format!("Document why repeating {} is medically necessary", line.cpt_code),
                    ));
                    break;
                }
            }
        }
        factors
    }

    fn check_modifier_validity(&self, lines: &[ClaimLine]) -> Vec<RiskFactor> {
        lines
            .iter()
            .filter_map(|l| l.modifier.as_deref().map(|m| (l, m)))
            .filter(|(_, m)| !self.config.known_modifiers.iter().any(|k| k == m))
            .map(|(l, m)| {
                RiskFactor::new(
                    patterns::INVALID_MODIFIER,
                    Severity::Medium,
                    format!("Line {} carries unrecognised modifier {m}", l.line_number),
                    "Correct or remove the unrecognised modifier".to_string(),
                )
            })
            .collect()
    }

    /// Filing deadline is strictly `earliest service date +
    /// plan.filing_window_days`, compared against now.
    fn check_timely_filing(
        &self,
        claim: &Claim,
        lines: &[ClaimLine],
        plan: &InsurancePlan,
        context: &ClaimContext,
    ) -> Vec<RiskFactor> {
        let anchor: Option<NaiveDate> = lines
            .iter()
            .map(|l| l.service_date)
            .min()
            .or_else(|| claim.submission_date.map(|d| d.date_naive()));
        let Some(anchor) = anchor else { return Vec::new() };

        let deadline = anchor + Duration::days(i64::from(plan.filing_window_days));
        let today = context.now.date_naive();
        if today > deadline {
            return vec![RiskFactor::new(
                patterns::TIMELY_FILING,
                Severity::High,
                format!("Filing deadline {deadline} has passed"),
                "File immediately and prepare a timely-filing appeal with proof of delay".to_string(),
            )];
        }
        let warning_window = deadline - Duration::days(i64::from(self.config.filing_warning_days));
        if today >= warning_window {
            return vec![RiskFactor::new(
                patterns::TIMELY_FILING,
                Severity::Medium,
                format!("Filing deadline {deadline} is approaching"),
                "Submit the claim before the filing window closes".to_string(),
            )];
        }
        Vec::new()
    }

    fn check_duplicates(&self, lines: &[ClaimLine], context: &ClaimContext) -> Vec<RiskFactor> {
        let mut factors = Vec::new();
        for line in lines {
            let duplicate = context
                .recent_lines
                .iter()
                .any(|r| r.cpt_code == line.cpt_code && r.service_date == line.service_date);
            if duplicate {
                factors.push(RiskFactor::new(
                    patterns::DUPLICATE_CLAIM,
                    Severity::High,
                    format!(
                        "{} on {} already billed on another recent claim",
                        line.cpt_code, line.service_date
                    ),
                    "Confirm this is not a duplicate; append modifier 59/91 if a distinct service".to_string(),
                ));
            }
        }
        factors
    }

    fn check_plan_exclusions(&self, lines: &[ClaimLine], plan: &InsurancePlan) -> Vec<RiskFactor> {
        lines
            .iter()
            .filter(|l| plan.excluded_codes.contains(&l.cpt_code))
            .map(|l| {
                RiskFactor::new(
                    patterns::PLAN_EXCLUSION,
                    Severity::High,
                    format!("{} is excluded under plan {}", l.cpt_code, plan.payer_id),
                    "Bill the patient directly or verify an exception applies".to_string(),
                )
            })
            .collect()
    }

    fn check_required_modifiers(&self, lines: &[ClaimLine]) -> Vec<RiskFactor> {
        lines
            .iter()
            .filter_map(|l| {
                let required = self.config.required_modifiers.get(&l.cpt_code)?;
                (l.modifier.as_deref() != Some(required.as_str())).then(|| {
                    RiskFactor::new(
                        patterns::MISSING_MODIFIER,
                        Severity::Low,
                        format!("{} requires modifier {required}", l.cpt_code),
                        format!("Append modifier {required} to {}", l.cpt_code),
                    )
                })
            })
            .collect()
    }

    fn check_excluded_services(&self, lines: &[ClaimLine]) -> Vec<RiskFactor> {
        lines
            .iter()
            .filter(|l| self.config.excluded_services.contains(&l.cpt_code))
            .map(|l| {
                RiskFactor::new(
                    patterns::EXCLUDED_SERVICE,
                    Severity::High,
                    format!("{} is on the non-covered service list", l.cpt_code),
                    "Obtain an advance beneficiary notice and bill the patient".to_string(),
                )
            })
            .collect()
    }
}
