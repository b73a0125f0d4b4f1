//! Charge capture: fee-schedule pricing with panel bundling.

use crate::error::RuleConfigResult;
use chrono::NaiveDate;
use claims_core::{Claim, ClaimLine};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A panel code whose components must not be billed separately when the
/// panel itself is billed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleRule {
    pub panel_code: String,
    pub component_codes: Vec<String>,
}

/// CPT code → base price table plus bundling rules. Immutable after load;
/// `Default` carries the built-in laboratory schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeSchedule {
    prices: HashMap<String, Decimal>,
    descriptions: HashMap<String, String>,
    bundles: Vec<BundleRule>,
    /// Applied when a code is absent from the price table.
    fallback_price: Decimal,
}

impl FeeSchedule {
    pub fn from_json(json: &str) -> RuleConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn price(&self, cpt_code: &str) -> Decimal {
        self.prices
            .get(cpt_code)
            .copied()
            .unwrap_or(self.fallback_price)
    }

    pub fn description(&self, cpt_code: &str) -> String {
        self.descriptions
            .get(cpt_code)
            .cloned()
            .unwrap_or_else(|| format!("Procedure {cpt_code}"))
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        let entries: [(&str, &str, Decimal); 10] = [
            ("80053", "Comprehensive metabolic panel", Decimal::new(15000, 2)),
            ("82947", "Glucose, quantitative", Decimal::new(10000, 2)),
            ("83036", "Hemoglobin A1c", Decimal::new(7500, 2)),
            ("80061", "Lipid panel", Decimal::new(12000, 2)),
            ("82465", "Cholesterol, total", Decimal::new(3000, 2)),
            ("84478", "Triglycerides", Decimal::new(2800, 2)),
            ("83718", "HDL cholesterol", Decimal::new(3200, 2)),
            ("84443", "Thyroid stimulating hormone", Decimal::new(8500, 2)),
            ("85025", "Complete blood count with differential", Decimal::new(4500, 2)),
            ("84153", "Prostate specific antigen", Decimal::new(9000, 2)),
        ];
        let mut prices = HashMap::new();
        let mut descriptions = HashMap::new();
        for (code, description, price) in entries {
            prices.insert(code.to_string(), price);
            descriptions.insert(code.to_string(), description.to_string());
        }
        let bundles = vec![
            BundleRule {
                panel_code: "80053".to_string(),
                component_codes: vec!["82947".to_string()],
            },
            BundleRule {
                panel_code: "80061".to_string(),
                component_codes: vec![
                    "82465".to_string(),
                    "84478".to_string(),
                    "83718".to_string(),
                ],
            },
        ];
        Self {
            prices,
            descriptions,
            bundles,
            fallback_price: Decimal::new(5000, 2),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChargeCalculator {
    schedule: FeeSchedule,
}

impl ChargeCalculator {
    pub fn new(schedule: FeeSchedule) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &FeeSchedule {
        &self.schedule
    }

    /// Deduplicate codes and drop components covered by a billed panel.
    pub fn apply_bundles(&self, codes: &[String]) -> Vec<String> {
        let mut kept: Vec<String> = Vec::new();
        for code in codes {
            if !kept.contains(code) {
                kept.push(code.clone());
            }
        }
        let bundled: Vec<&str> = self
            .schedule
            .bundles
            .iter()
            .filter(|b| kept.contains(&b.panel_code))
            .flat_map(|b| b.component_codes.iter().map(String::as_str))
            .collect();
        kept.retain(|code| !bundled.contains(&code.as_str()));
        kept
    }

    /// Build priced claim lines from procedure codes (post-bundling),
    /// numbering from 1.
    pub fn build_lines(
        &self,
        claim_id: Uuid,
        codes: &[String],
        diagnosis_codes: &[String],
        service_date: NaiveDate,
    ) -> Vec<ClaimLine> {
        let billable = self.apply_bundles(codes);
        billable
            .iter()
            .enumerate()
            .map(|(idx, code)| ClaimLine {
                id: Uuid::new_v4(),
                claim_id,
                line_number: idx as u32 + 1,
                cpt_code: code.clone(),
                description: self.schedule.description(code),
                diagnosis_codes: diagnosis_codes.to_vec(),
                charge: self.schedule.price(code),
                units: 1,
                modifier: None,
                service_date,
            })
            .collect()
    }

    /// Reprice lines from the schedule where the code is known; unknown
    /// codes keep their existing charge. Returns the recomputed total.
    pub fn reprice(&self, lines: &mut [ClaimLine]) -> Decimal {
        for line in lines.iter_mut() {
            if let Some(price) = self.schedule.prices.get(&line.cpt_code) {
                line.charge = *price;
            }
        }
        Claim::line_total(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bundling_drops_components_of_a_billed_panel() {
        let calc = ChargeCalculator::default();
        let kept = calc.apply_bundles(&codes(&["80061", "82465", "84443"]));
        assert_eq!(kept, codes(&["80061", "84443"]));
    }

    #[test]
    fn bundling_keeps_components_billed_without_their_panel() {
        let calc = ChargeCalculator::default();
        let kept = calc.apply_bundles(&codes(&["82465", "84478"]));
        assert_eq!(kept, codes(&["82465", "84478"]));
    }

    #[test]
    fn duplicate_codes_collapse_to_one_line() {
        let calc = ChargeCalculator::default();
        let lines = calc.build_lines(
            Uuid::new_v4(),
            &codes(&["85025", "85025"]),
            &["Z00.00".to_string()],
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        );
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].line_number, 1);
        assert_eq!(lines[0].charge, dec!(45.00));
    }

    #[test]
    fn built_lines_are_numbered_and_priced() {
        let calc = ChargeCalculator::default();
        let lines = calc.build_lines(
            Uuid::new_v4(),
            &codes(&["80053", "84443"]),
            &["E11.9".to_string()],
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        );
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line_number, 1);
        assert_eq!(lines[1].line_number, 2);
        assert_eq!(Claim::line_total(&lines), dec!(235.00));
    }

    #[test]
    fn unknown_codes_fall_back_to_the_default_price() {
        let calc = ChargeCalculator::default();
        assert_eq!(calc.schedule().price("99999"), dec!(50.00));
    }

    #[test]
    fn reprice_updates_known_codes_and_returns_total() {
        let calc = ChargeCalculator::default();
        let mut lines = calc.build_lines(
            Uuid::new_v4(),
            &codes(&["80053"]),
            &["E11.9".to_string()],
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        );
        lines[0].charge = dec!(1.00); // drifted price
        let total = calc.reprice(&mut lines);
        assert_eq!(total, dec!(150.00));
        assert_eq!(lines[0].charge, dec!(150.00));
    }
}
