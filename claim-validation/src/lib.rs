//! Claim rule validation for the RevCycle claims engine
//!
//! Three stateless rule engines:
//! - [`ClaimValidator`]: structural and reconciliation checks over a claim
//!   plus its lines; findings are data (a list of violation strings),
//!   never errors
//! - [`MedicalNecessityValidator`]: CPT-keyed rule table correlating
//!   procedures with diagnosis prefixes, age/gender constraints, and
//!   frequency limits
//! - [`ChargeCalculator`]: fee-schedule pricing with panel bundling

pub mod error;
pub mod necessity;
pub mod pricing;
pub mod validator;

pub use error::*;
pub use necessity::*;
pub use pricing::*;
pub use validator::*;
