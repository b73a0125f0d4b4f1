//! Common error handling for the RevCycle claims engine
//!
//! Every subsystem in the revenue cycle (validation, encoding, submission,
//! pipeline orchestration) reports failures through the shared
//! [`RevenueError`] taxonomy defined here. The taxonomy distinguishes
//! caller-correctable findings from retryable transport failures so the
//! orchestrator and the API layer can classify outcomes consistently.
//!
//! # Error Categories
//!
//! - **Validation**: business-rule violations, surfaced as a list of
//!   messages; recoverable by caller correction, never retried
//! - **Authorization**: ownership mismatch; never retried
//! - **NotFound**: missing referenced record; never retried
//! - **ExternalGateway**: clearinghouse transport/timeout failure;
//!   retryable with backoff, never interpreted as a denial
//! - **Encoding**: malformed or incomplete claim graph that cannot produce
//!   valid EDI; fatal for the pipeline run until the claim is corrected
//! - **Store**: record-store failure; infrastructure, retryable
//!
//! # Example
//!
//! ```rust
//! use error_common::{RevenueError, RevenueResult};
//!
//! fn require_plan(plan_id: Option<&str>) -> RevenueResult<&str> {
//!     plan_id.ok_or_else(|| RevenueError::validation("Insurance plan is required"))
//! }
//!
//! let err = require_plan(None).unwrap_err();
//! assert_eq!(err.status_code(), 400);
//! assert!(!err.is_retryable());
//! ```

pub mod codes;
pub mod types;

pub use codes::*;
pub use types::*;
