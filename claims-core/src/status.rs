//! Claim status state machine.
//!
//! Forward progression with two escape edges:
//! `Draft → Ready → Submitted → {Accepted | Rejected} →
//! {Denied | PartiallyPaid | Paid} → Appealed`, plus `Rejected → Draft`
//! for external correction. Same-state transitions are accepted as no-ops
//! so a stage can replay without violating monotonicity.

use crate::models::ClaimStatus;
use error_common::{RevenueError, RevenueResult};

impl ClaimStatus {
    /// Statuses this claim may transition into next.
    pub fn successors(self) -> &'static [ClaimStatus] {
        match self {
            ClaimStatus::Draft => &[ClaimStatus::Ready],
            ClaimStatus::Ready => &[ClaimStatus::Submitted],
            ClaimStatus::Submitted => &[ClaimStatus::Accepted, ClaimStatus::Rejected],
            ClaimStatus::Accepted => &[
                ClaimStatus::Denied,
                ClaimStatus::PartiallyPaid,
                ClaimStatus::Paid,
            ],
            ClaimStatus::Rejected => &[ClaimStatus::Draft],
            ClaimStatus::Denied | ClaimStatus::PartiallyPaid | ClaimStatus::Paid => {
                &[ClaimStatus::Appealed]
            }
            ClaimStatus::Appealed => &[],
        }
    }

    pub fn can_transition_to(self, next: ClaimStatus) -> bool {
        self == next || self.successors().contains(&next)
    }

    /// Adjudicated end states retained for audit and analytics.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ClaimStatus::Denied | ClaimStatus::PartiallyPaid | ClaimStatus::Paid | ClaimStatus::Appealed
        )
    }

    /// Short name used in audit events.
    pub fn as_str(self) -> &'static str {
        match self {
            ClaimStatus::Draft => "draft",
            ClaimStatus::Ready => "ready",
            ClaimStatus::Submitted => "submitted",
            ClaimStatus::Accepted => "accepted",
            ClaimStatus::Rejected => "rejected",
            ClaimStatus::Denied => "denied",
            ClaimStatus::PartiallyPaid => "partially_paid",
            ClaimStatus::Paid => "paid",
            ClaimStatus::Appealed => "appealed",
        }
    }
}

/// Validate a transition, returning the new status on success.
pub fn transition(from: ClaimStatus, to: ClaimStatus) -> RevenueResult<ClaimStatus> {
    if from.can_transition_to(to) {
        Ok(to)
    } else {
        Err(RevenueError::validation(format!(
            "Invalid claim status transition: {} -> {}",
            from.as_str(),
            to.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ClaimStatus; 9] = [
        ClaimStatus::Draft,
        ClaimStatus::Ready,
        ClaimStatus::Submitted,
        ClaimStatus::Accepted,
        ClaimStatus::Rejected,
        ClaimStatus::Denied,
        ClaimStatus::PartiallyPaid,
        ClaimStatus::Paid,
        ClaimStatus::Appealed,
    ];

    #[test]
    fn happy_path_is_permitted() {
        assert!(ClaimStatus::Draft.can_transition_to(ClaimStatus::Ready));
        assert!(ClaimStatus::Ready.can_transition_to(ClaimStatus::Submitted));
        assert!(ClaimStatus::Submitted.can_transition_to(ClaimStatus::Accepted));
        assert!(ClaimStatus::Accepted.can_transition_to(ClaimStatus::Paid));
        assert!(ClaimStatus::Paid.can_transition_to(ClaimStatus::Appealed));
    }

    #[test]
    fn no_transition_skips_submitted() {
        // Nothing before Submitted may reach an adjudication state directly.
        for early in [ClaimStatus::Draft, ClaimStatus::Ready] {
            for late in [
                ClaimStatus::Accepted,
                ClaimStatus::Rejected,
                ClaimStatus::Denied,
                ClaimStatus::Paid,
                ClaimStatus::PartiallyPaid,
                ClaimStatus::Appealed,
            ] {
                assert!(!early.can_transition_to(late), "{early:?} -> {late:?}");
            }
        }
    }

    #[test]
    fn terminal_states_only_escape_to_appealed() {
        for terminal in [ClaimStatus::Paid, ClaimStatus::Denied] {
            for next in ALL {
                let ok = terminal.can_transition_to(next);
                assert_eq!(ok, next == ClaimStatus::Appealed || next == terminal);
            }
        }
    }

    #[test]
    fn rejected_loops_back_to_draft_only() {
        assert_eq!(ClaimStatus::Rejected.successors(), &[ClaimStatus::Draft]);
    }

    #[test]
    fn same_state_is_a_noop() {
        for status in ALL {
            assert!(status.can_transition_to(status));
        }
    }

    #[test]
    fn invalid_transition_is_a_validation_error() {
        let err = transition(ClaimStatus::Draft, ClaimStatus::Paid).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
