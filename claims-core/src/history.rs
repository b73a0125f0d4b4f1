//! Prior-service history snapshot handed to the rule engines.

use chrono::NaiveDate;
use std::collections::HashMap;

/// Prior accepted/paid service dates keyed by CPT code. Assembled by the
/// orchestrator from the record store so the rule engines stay stateless.
#[derive(Debug, Clone, Default)]
pub struct ServiceHistory {
    dates: HashMap<String, Vec<NaiveDate>>,
}

impl ServiceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, cpt_code: impl Into<String>, dates: Vec<NaiveDate>) {
        self.dates.insert(cpt_code.into(), dates);
    }

    /// Occurrences of the code within `period_days` before `as_of`.
    pub fn count_within(&self, cpt_code: &str, period_days: u32, as_of: NaiveDate) -> usize {
        let window_start = as_of - chrono::Duration::days(i64::from(period_days));
        self.dates
            .get(cpt_code)
            .map(|dates| {
                dates
                    .iter()
                    .filter(|d| **d > window_start && **d <= as_of)
                    .count()
            })
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting_respects_the_window() {
        let mut history = ServiceHistory::new();
        history.insert(
            "83036",
            vec![
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            ],
        );
        let as_of = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(history.count_within("83036", 90, as_of), 1);
        assert_eq!(history.count_within("83036", 500, as_of), 2);
        assert_eq!(history.count_within("85025", 500, as_of), 0);
    }
}
