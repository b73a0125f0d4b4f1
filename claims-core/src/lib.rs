//! Claim domain model for the RevCycle claims engine
//!
//! Provides the billing unit records shared by every pipeline stage:
//! - Claim, ClaimLine, and the append-only ClaimEvent audit trail
//! - Claim status state machine (monotonic forward progression)
//! - Claim number generation
//! - `RecordStore` port over the external durable store, with atomic
//!   status-plus-event commits
//! - In-memory reference store for tests

pub mod history;
pub mod memory;
pub mod models;
pub mod numbers;
pub mod status;
pub mod store;

pub use history::*;
pub use memory::*;
pub use models::*;
pub use numbers::*;
pub use store::*;
