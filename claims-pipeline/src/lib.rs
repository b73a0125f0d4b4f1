//! Pipeline orchestrator for the RevCycle claims engine
//!
//! Sequences a claim through eight ordered stages (eligibility, specimen
//! tracking, medical necessity, denial risk, coding/pricing, submission,
//! status monitoring, revenue analytics), writing one audit event per
//! stage and advancing claim status on transitions. Runs over one claim
//! serialize through a per-claim lease; stages are independently
//! invocable so a failed run can resume at the failed stage.
//!
//! Also carries the claim creation and query surface consumed by the web
//! layer.

pub mod lease;
pub mod orchestrator;
pub mod service;
pub mod stages;

pub use lease::*;
pub use orchestrator::*;
pub use service::*;
pub use stages::*;
