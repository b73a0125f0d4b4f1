//! Denial risk prediction for the RevCycle claims engine
//!
//! Scores a claim against a weighted catalogue of historical denial
//! patterns before submission. Nine independent checks emit risk factors
//! tagged high/medium/low; the predictor aggregates them into a risk
//! score, a denial probability, a confidence value, and remediation
//! recommendations. Findings are data, never errors.

pub mod patterns;
pub mod predictor;

pub use patterns::*;
pub use predictor::*;
