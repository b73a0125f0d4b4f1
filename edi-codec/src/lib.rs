//! ANSI X12 837P encoder for the RevCycle claims engine
//!
//! Renders a claim graph (claim + subscriber + plan + lines) into the
//! professional-claim segment stream consumed by clearinghouses. The
//! encoder is deterministic and side-effect free: identical input plus a
//! fixed control number yields byte-identical output, which downstream
//! ingestion depends on.
//!
//! One canonical encoder, configured through a versioned [`EdiConfig`]
//! (sender/receiver identity, billing provider, test-vs-production flag).

pub mod config;
pub mod encoder;
pub mod error;
pub mod segments;

pub use config::*;
pub use encoder::*;
pub use error::*;
pub use segments::*;
