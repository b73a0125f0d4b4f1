// HTTP-status classification consumed by the web layer. The core does not
// own the HTTP plumbing; it only supplies the classification.

use crate::types::RevenueError;

impl RevenueError {
    /// HTTP status the API layer should respond with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::Encoding(_) => 400,
            Self::Authorization(_) => 403,
            Self::NotFound { .. } => 404,
            Self::ExternalGateway(_) => 502,
            Self::Store(_) | Self::Other(_) => 500,
        }
    }
}

/// Stable machine-readable codes for audit payloads and API responses.
pub mod claim {
    pub const VALIDATION_FAILED: &str = "CLAIM_1001";
    pub const RECONCILIATION_MISMATCH: &str = "CLAIM_1002";
    pub const PLAN_OWNERSHIP_MISMATCH: &str = "CLAIM_1003";
}

pub mod edi {
    pub const MISSING_DIAGNOSIS: &str = "EDI_2001";
    pub const ENVELOPE_INVALID: &str = "EDI_2002";
}

pub mod gateway {
    pub const SUBMIT_FAILED: &str = "GATEWAY_3001";
    pub const POLL_FAILED: &str = "GATEWAY_3002";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_taxonomy() {
        assert_eq!(RevenueError::validation("x").status_code(), 400);
        assert_eq!(RevenueError::authorization("x").status_code(), 403);
        assert_eq!(RevenueError::not_found("Claim", "1").status_code(), 404);
        assert_eq!(RevenueError::ExternalGateway("x".into()).status_code(), 502);
        assert_eq!(RevenueError::Store("x".into()).status_code(), 500);
    }
}
