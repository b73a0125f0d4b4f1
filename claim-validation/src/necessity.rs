//! Medical-necessity rule table.
//!
//! Procedure codes map to zero or more rules. A code with no registered
//! rule is permissively treated as necessary. A procedure is necessary if
//! any of its rules passes; a rule passes only when every constraint it
//! carries is satisfied.

use crate::error::RuleConfigResult;
use claims_core::{ClaimLine, Gender, Patient, ServiceHistory};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `count` occurrences per `period_days`, evaluated against prior
/// accepted/paid history for the same code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FrequencyLimit {
    pub count: u32,
    pub period_days: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NecessityRule {
    /// Acceptable diagnosis-code prefixes; empty means no constraint.
    #[serde(default)]
    pub diagnosis_prefixes: Vec<String>,
    #[serde(default)]
    pub min_age: Option<u32>,
    #[serde(default)]
    pub max_age: Option<u32>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub frequency: Option<FrequencyLimit>,
}

/// Immutable rule table, loaded once at startup. `Default` carries the
/// built-in payer-neutral table; payer-specific tables load from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NecessityRuleSet {
    rules: HashMap<String, Vec<NecessityRule>>,
}

impl NecessityRuleSet {
    pub fn from_json(json: &str) -> RuleConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn rules_for(&self, cpt_code: &str) -> &[NecessityRule] {
        self.rules.get(cpt_code).map(Vec::as_slice).unwrap_or(&[])
    }

    fn rule(prefixes: &[&str]) -> NecessityRule {
        NecessityRule {
            diagnosis_prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
            ..NecessityRule::default()
        }
    }
}

impl Default for NecessityRuleSet {
    fn default() -> Self {
        let mut rules: HashMap<String, Vec<NecessityRule>> = HashMap::new();
        // Comprehensive metabolic panel
        rules.insert(
            "80053".to_string(),
            vec![Self::rule(&["E11", "E78", "I10", "R73", "Z00", "N18"])],
        );
        // Glucose
        rules.insert(
            "82947".to_string(),
            vec![Self::rule(&["E11", "R73", "Z13", "O24"])],
        );
        // Hemoglobin A1c: diabetes monitoring, four per year
        rules.insert(
            "83036".to_string(),
            vec![NecessityRule {
                diagnosis_prefixes: vec!["E11".to_string(), "R73".to_string()],
                frequency: Some(FrequencyLimit { count: 4, period_days: 365 }),
                ..NecessityRule::default()
            }],
        );
        // Lipid panel: twice per year
        rules.insert(
            "80061".to_string(),
            vec![NecessityRule {
                diagnosis_prefixes: vec!["E78".to_string(), "Z13".to_string(), "I10".to_string()],
                frequency: Some(FrequencyLimit { count: 2, period_days: 365 }),
                ..NecessityRule::default()
            }],
        );
        // TSH
        rules.insert(
            "84443".to_string(),
            vec![Self::rule(&["E03", "E05", "R53", "Z13"])],
        );
        // PSA screening: male, 40+
        rules.insert(
            "84153".to_string(),
            vec![NecessityRule {
                diagnosis_prefixes: vec!["C61".to_string(), "R97".to_string(), "Z12".to_string()],
                min_age: Some(40),
                gender: Some(Gender::Male),
                ..NecessityRule::default()
            }],
        );
        Self { rules }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LineNecessity {
    pub line_number: u32,
    pub cpt_code: String,
    pub necessary: bool,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NecessityOutcome {
    pub necessary: bool,
    /// 0–100: fraction of lines whose necessity check passed.
    pub score: f64,
    pub recommendations: Vec<String>,
    pub lines: Vec<LineNecessity>,
}

#[derive(Debug, Clone, Default)]
pub struct MedicalNecessityValidator {
    rules: NecessityRuleSet,
}

impl MedicalNecessityValidator {
    pub fn new(rules: NecessityRuleSet) -> Self {
        Self { rules }
    }

    pub fn evaluate(
        &self,
        lines: &[ClaimLine],
        patient: &Patient,
        history: &ServiceHistory,
    ) -> NecessityOutcome {
        let mut results = Vec::with_capacity(lines.len());
        let mut recommendations: Vec<String> = Vec::new();

        for line in lines {
            let rules = self.rules.rules_for(&line.cpt_code);
            let (necessary, reasons) = if rules.is_empty() {
                (true, Vec::new())
            } else {
                self.any_rule_passes(rules, line, patient, history)
            };

            if !necessary {
                let doc = format!(
                    "Attach documentation supporting medical necessity for {}",
                    line.cpt_code
                );
                if !recommendations.contains(&doc) {
                    recommendations.push(doc);
                }
                if reasons.iter().any(|r| r.contains("frequency")) {
                    let auth = format!(
                        "Obtain prior authorization before repeating {} within the limit period",
                        line.cpt_code
                    );
                    if !recommendations.contains(&auth) {
                        recommendations.push(auth);
                    }
                }
            }

            results.push(LineNecessity {
                line_number: line.line_number,
                cpt_code: line.cpt_code.clone(),
                necessary,
                reasons,
            });
        }

        let passed = results.iter().filter(|r| r.necessary).count();
        let score = if results.is_empty() {
            100.0
        } else {
            100.0 * passed as f64 / results.len() as f64
        };
        let necessary = passed == results.len();

        tracing::debug!(score, necessary, lines = results.len(), "necessity evaluation");
        NecessityOutcome { necessary, score, recommendations, lines: results }
    }

    /// Any passing rule makes the line necessary; failure reasons come
    /// from the closest rule (the one with the fewest violated
    /// constraints).
    fn any_rule_passes(
        &self,
        rules: &[NecessityRule],
        line: &ClaimLine,
        patient: &Patient,
        history: &ServiceHistory,
    ) -> (bool, Vec<String>) {
        let mut best_failures: Option<Vec<String>> = None;
        for rule in rules {
            let failures = self.rule_failures(rule, line, patient, history);
            if failures.is_empty() {
                return (true, Vec::new());
            }
            if best_failures
                .as_ref()
                .map_or(true, |b| failures.len() < b.len())
            {
                best_failures = Some(failures);
            }
        }
        (false, best_failures.unwrap_or_default())
    }

    fn rule_failures(
        &self,
        rule: &NecessityRule,
        line: &ClaimLine,
        patient: &Patient,
        history: &ServiceHistory,
    ) -> Vec<String> {
        let mut failures = Vec::new();

        if !rule.diagnosis_prefixes.is_empty() {
            let supported = line.diagnosis_codes.iter().any(|code| {
                rule.diagnosis_prefixes
                    .iter()
                    .any(|prefix| code.starts_with(prefix.as_str()))
            });
            if !supported {
                failures.push(format!(
                    "No diagnosis on the line supports {} (expected one of prefixes {})",
                    line.cpt_code,
                    rule.diagnosis_prefixes.join(", ")
                ));
            }
        }

        if rule.min_age.is_some() || rule.max_age.is_some() {
            match patient.age_on(line.service_date) {
                Some(age) => {
                    if rule.min_age.is_some_and(|min| age < min)
                        || rule.max_age.is_some_and(|max| age > max)
                    {
                        failures.push(format!("Patient age {age} is outside the covered range"));
                    }
                }
                // Unverifiable constraint counts as unmet.
                None => failures.push("Patient date of birth is unknown".to_string()),
            }
        }

        if let Some(required) = rule.gender {
            if patient.gender != Some(required) {
                failures.push("Patient gender does not match the covered population".to_string());
            }
        }

        if let Some(limit) = rule.frequency {
            let prior = history.count_within(&line.cpt_code, limit.period_days, line.service_date);
            if prior as u32 >= limit.count {
                failures.push(format!(
                    "frequency limit reached: {} of {} allowed in {} days",
                    prior, limit.count, limit.period_days
                ));
            }
        }

        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn patient(gender: Gender, birth_year: i32) -> Patient {
        Patient {
            id: Uuid::new_v4(),
            first_name: "Sam".to_string(),
            last_name: "Okafor".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(birth_year, 1, 1),
            gender: Some(gender),
            address_line: None,
            city: None,
            state: None,
            zip: None,
        }
    }

    fn lab_line(n: u32, cpt: &str, dx: &[&str]) -> ClaimLine {
        ClaimLine {
            id: Uuid::new_v4(),
            claim_id: Uuid::new_v4(),
            line_number: n,
            cpt_code: cpt.to_string(),
            description: String::new(),
            diagnosis_codes: dx.iter().map(|s| s.to_string()).collect(),
            charge: dec!(100.00),
            units: 1,
            modifier: None,
            service_date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
        }
    }

    #[test]
    fn unregistered_code_is_permissively_necessary() {
        let v = MedicalNecessityValidator::default();
        let outcome = v.evaluate(
            &[lab_line(1, "99999", &[])],
            &patient(Gender::Female, 1990),
            &ServiceHistory::new(),
        );
        assert!(outcome.necessary);
        assert_eq!(outcome.score, 100.0);
    }

    #[test]
    fn supported_diagnosis_passes_and_unsupported_fails() {
        let v = MedicalNecessityValidator::default();
        let ok = v.evaluate(
            &[lab_line(1, "80053", &["E11.9"])],
            &patient(Gender::Female, 1990),
            &ServiceHistory::new(),
        );
        assert!(ok.necessary);

        let bad = v.evaluate(
            &[lab_line(1, "80053", &["M54.5"])],
            &patient(Gender::Female, 1990),
            &ServiceHistory::new(),
        );
        assert!(!bad.necessary);
        assert_eq!(bad.score, 0.0);
        assert!(bad
            .recommendations
            .iter()
            .any(|r| r.contains("documentation")));
    }

    #[test]
    fn score_is_the_fraction_of_passing_lines() {
        let v = MedicalNecessityValidator::default();
        let outcome = v.evaluate(
            &[
                lab_line(1, "80053", &["E11.9"]),
                lab_line(2, "84443", &["M54.5"]),
            ],
            &patient(Gender::Female, 1990),
            &ServiceHistory::new(),
        );
        assert!(!outcome.necessary);
        assert_eq!(outcome.score, 50.0);
    }

    #[test]
    fn gender_and_age_constraints_apply() {
        let v = MedicalNecessityValidator::default();
        let psa = lab_line(1, "84153", &["Z12.5"]);

        let ok = v.evaluate(
            &[psa.clone()],
            &patient(Gender::Male, 1960),
            &ServiceHistory::new(),
        );
        assert!(ok.necessary);

        let wrong_gender = v.evaluate(
            &[psa.clone()],
            &patient(Gender::Female, 1960),
            &ServiceHistory::new(),
        );
        assert!(!wrong_gender.necessary);

        let too_young = v.evaluate(
            &[psa],
            &patient(Gender::Male, 2000),
            &ServiceHistory::new(),
        );
        assert!(!too_young.necessary);
    }

    #[test]
    fn frequency_limit_counts_prior_adjudicated_services() {
        let v = MedicalNecessityValidator::default();
        let a1c = lab_line(1, "83036", &["E11.9"]);

        let mut history = ServiceHistory::new();
        history.insert(
            "83036",
            vec![
                NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            ],
        );
        let outcome = v.evaluate(&[a1c.clone()], &patient(Gender::Male, 1970), &history);
        assert!(!outcome.necessary);
        assert!(outcome
            .recommendations
            .iter()
            .any(|r| r.contains("prior authorization")));

        // One service aged out of the window leaves room for another.
        let mut thinner = ServiceHistory::new();
        thinner.insert(
            "83036",
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            ],
        );
        let outcome = v.evaluate(&[a1c], &patient(Gender::Male, 1970), &thinner);
        assert!(outcome.necessary);
    }

    #[test]
    fn rule_table_loads_from_json() {
        let json = r#"{"rules": {"97110": [{"diagnosis_prefixes": ["M54"], "frequency": {"count": 12, "period_days": 90}}]}}"#;
        let table = NecessityRuleSet::from_json(json).unwrap();
        assert_eq!(table.rules_for("97110").len(), 1);
        assert!(table.rules_for("80053").is_empty());
    }
}
