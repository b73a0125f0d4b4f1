//! Revenue analytics for the RevCycle claims engine
//!
//! Aggregates a user's claim outcomes into collection/denial metrics, a
//! linear 30/60/90-day collection forecast, and improvement
//! recommendations. Pure aggregation over records supplied by the
//! caller; nothing here touches a store or the network.

pub mod optimizer;

pub use optimizer::*;
