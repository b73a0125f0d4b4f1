//! Claim-outcome aggregation and forecasting.

use chrono::{DateTime, Duration, Utc};
use claims_core::{Claim, ClaimLine, ClaimStatus};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// Receivables older than this many days count as aged.
const AGED_RECEIVABLE_DAYS: i64 = 60;

#[derive(Debug, Clone, Serialize)]
pub struct CollectionForecast {
    pub next_30_days: Decimal,
    pub next_60_days: Decimal,
    pub next_90_days: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueAnalytics {
    pub claim_count: usize,
    pub total_billed: Decimal,
    pub total_collected: Decimal,
    pub outstanding: Decimal,
    /// `collected / billed`, 0 when nothing has been billed.
    pub collection_rate: f64,
    /// Denied share of adjudicated claims.
    pub denial_rate: f64,
    pub average_days_to_payment: Option<f64>,
    /// Billed charge per procedure code.
    pub revenue_by_cpt: HashMap<String, Decimal>,
    /// Denial reasons by descending frequency, top five.
    pub top_denial_reasons: Vec<(String, usize)>,
    pub forecast: CollectionForecast,
    pub recommendations: Vec<String>,
}

/// Aggregates historical claim outcomes. `now` is injected so the aged-
/// receivables cutoff and tests stay deterministic.
#[derive(Debug, Clone, Default)]
pub struct RevenueOptimizer;

impl RevenueOptimizer {
    pub fn analyze(
        &self,
        claims: &[(Claim, Vec<ClaimLine>)],
        now: DateTime<Utc>,
    ) -> RevenueAnalytics {
        let mut total_billed = Decimal::ZERO;
        let mut total_collected = Decimal::ZERO;
        let mut outstanding = Decimal::ZERO;
        let mut adjudicated = 0usize;
        let mut denied = 0usize;
        let mut payment_days: Vec<i64> = Vec::new();
        let mut revenue_by_cpt: HashMap<String, Decimal> = HashMap::new();
        let mut denial_counts: HashMap<String, usize> = HashMap::new();
        let mut aged_receivables = 0usize;

        for (claim, lines) in claims {
            if !billed(claim.status) {
                continue;
            }
            total_billed += claim.total_charge;
            total_collected += claim.paid_amount.unwrap_or(Decimal::ZERO);

            for line in lines {
                *revenue_by_cpt
                    .entry(line.cpt_code.clone())
                    .or_insert(Decimal::ZERO) += line.charge * Decimal::from(line.units);
            }

            match claim.status {
                ClaimStatus::Submitted | ClaimStatus::Accepted => {
                    outstanding += claim.total_charge;
                    if let Some(submitted) = claim.submission_date {
                        if now - submitted > Duration::days(AGED_RECEIVABLE_DAYS) {
                            aged_receivables += 1;
                        }
                    }
                }
                ClaimStatus::Denied => {
                    adjudicated += 1;
                    denied += 1;
                    if let Some(reason) = &claim.denial_reason {
                        *denial_counts.entry(reason.clone()).or_insert(0) += 1;
                    }
                }
                ClaimStatus::PartiallyPaid | ClaimStatus::Paid | ClaimStatus::Appealed => {
                    adjudicated += 1;
                    if let (Some(submitted), Some(processed)) =
                        (claim.submission_date, claim.processed_date)
                    {
                        payment_days.push((processed - submitted).num_days());
                    }
                }
                _ => {}
            }
        }

        let rate = if total_billed.is_zero() {
            Decimal::ZERO
        } else {
            total_collected / total_billed
        };
        let collection_rate = rate.to_f64().unwrap_or(0.0);
        let denial_rate = if adjudicated == 0 {
            0.0
        } else {
            denied as f64 / adjudicated as f64
        };
        let average_days_to_payment = if payment_days.is_empty() {
            None
        } else {
            Some(payment_days.iter().sum::<i64>() as f64 / payment_days.len() as f64)
        };

        let mut top_denial_reasons: Vec<(String, usize)> = denial_counts.into_iter().collect();
        top_denial_reasons.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_denial_reasons.truncate(5);

        // Linear forecast: outstanding receivables are expected to
        // collect at the trailing rate, spread evenly over 90 days.
        let expected = (outstanding * rate).round_dp(2);
        let forecast = CollectionForecast {
            next_30_days: (expected / Decimal::from(3)).round_dp(2),
            next_60_days: (expected * Decimal::from(2) / Decimal::from(3)).round_dp(2),
            next_90_days: expected,
        };

        let mut recommendations = Vec::new();
        if denial_rate > 0.10 {
            recommendations.push(
                "Denial rate exceeds 10%: review top denial reasons and tighten front-end claim checks"
                    .to_string(),
            );
        }
        if total_billed > Decimal::ZERO && collection_rate < 0.85 {
            recommendations.push(
                "Collection rate below 85%: follow up on outstanding and underpaid claims"
                    .to_string(),
            );
        }
        if aged_receivables > 0 {
            recommendations.push(format!(
                "{aged_receivables} claim(s) outstanding for more than {AGED_RECEIVABLE_DAYS} days: escalate with the payer"
            ));
        }

        tracing::debug!(
            claims = claims.len(),
            billed = %total_billed,
            collected = %total_collected,
            "revenue analytics computed"
        );
        RevenueAnalytics {
            claim_count: claims.len(),
            total_billed,
            total_collected,
            outstanding,
            collection_rate,
            denial_rate,
            average_days_to_payment,
            revenue_by_cpt,
            top_denial_reasons,
            forecast,
            recommendations,
        }
    }
}

/// Draft and Ready claims have not been billed and carry no analytics
/// weight.
fn billed(status: ClaimStatus) -> bool {
    !matches!(status, ClaimStatus::Draft | ClaimStatus::Ready)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()
    }

    fn claim(status: ClaimStatus, total: Decimal) -> Claim {
        Claim {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            report_id: None,
            insurance_plan_id: None,
            claim_number: "CLM-x".to_string(),
            total_charge: total,
            status,
            allowed_amount: None,
            paid_amount: None,
            patient_responsibility: None,
            denial_reason: None,
            submission_date: None,
            processed_date: None,
            edi_file: None,
            clearinghouse_id: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn line(cpt: &str, charge: Decimal) -> ClaimLine {
        ClaimLine {
            id: Uuid::new_v4(),
            claim_id: Uuid::new_v4(),
            line_number: 1,
            cpt_code: cpt.to_string(),
            description: String::new(),
            diagnosis_codes: vec!["E11.9".to_string()],
            charge,
            units: 1,
            modifier: None,
            service_date: now().date_naive(),
        }
    }

    #[test]
    fn empty_portfolio_yields_zeroes_without_division_errors() {
        let analytics = RevenueOptimizer.analyze(&[], now());
        assert_eq!(analytics.total_billed, Decimal::ZERO);
        assert_eq!(analytics.collection_rate, 0.0);
        assert_eq!(analytics.denial_rate, 0.0);
        assert!(analytics.average_days_to_payment.is_none());
        assert!(analytics.recommendations.is_empty());
    }

    #[test]
    fn collection_and_denial_rates_cover_adjudicated_claims() {
        let mut paid = claim(ClaimStatus::Paid, dec!(200));
        paid.paid_amount = Some(dec!(150));
        paid.submission_date = Some(now() - Duration::days(40));
        paid.processed_date = Some(now() - Duration::days(10));
        let mut denied = claim(ClaimStatus::Denied, dec!(100));
        denied.denial_reason = Some("Missing prior authorization".to_string());

        let portfolio = vec![
            (paid, vec![line("80053", dec!(200))]),
            (denied, vec![line("83036", dec!(100))]),
            (claim(ClaimStatus::Draft, dec!(999)), vec![]),
        ];
        let analytics = RevenueOptimizer.analyze(&portfolio, now());

        assert_eq!(analytics.total_billed, dec!(300));
        assert_eq!(analytics.total_collected, dec!(150));
        assert_eq!(analytics.collection_rate, 0.5);
        assert_eq!(analytics.denial_rate, 0.5);
        assert_eq!(analytics.average_days_to_payment, Some(30.0));
        assert_eq!(analytics.revenue_by_cpt["80053"], dec!(200));
        assert_eq!(
            analytics.top_denial_reasons,
            vec![("Missing prior authorization".to_string(), 1)]
        );
        // Both thresholds tripped.
        assert!(analytics.recommendations.iter().any(|r| r.contains("Denial rate")));
        assert!(analytics
            .recommendations
            .iter()
            .any(|r| r.contains("Collection rate")));
    }

    #[test]
    fn forecast_is_linear_over_outstanding_receivables() {
        let mut paid = claim(ClaimStatus::Paid, dec!(100));
        paid.paid_amount = Some(dec!(90));
        let mut open = claim(ClaimStatus::Submitted, dec!(300));
        open.submission_date = Some(now() - Duration::days(5));

        let portfolio = vec![(paid, vec![]), (open, vec![])];
        let analytics = RevenueOptimizer.analyze(&portfolio, now());

        assert_eq!(analytics.outstanding, dec!(300));
        // rate = 90 / 400, expected = 300 * 0.225 = 67.50
        assert_eq!(analytics.forecast.next_90_days, dec!(67.50));
        assert_eq!(analytics.forecast.next_30_days, dec!(22.50));
        assert_eq!(analytics.forecast.next_60_days, dec!(45.00));
    }

    #[test]
    fn aged_receivables_trigger_an_escalation_recommendation() {
        let mut stale = claim(ClaimStatus::Submitted, dec!(100));
        stale.submission_date = Some(now() - Duration::days(75));
        let analytics = RevenueOptimizer.analyze(&[(stale, vec![])], now());
        assert!(analytics
            .recommendations
            .iter()
            .any(|r| r.contains("more than 60 days")));
    }
}
