//! Clearinghouse submission client for the RevCycle claims engine
//!
//! Sends encoded 837P payloads to the payer-network gateway and polls
//! adjudication status. Structural pre-validation happens locally before
//! any network call; transport failures surface as retryable gateway
//! errors and are never interpreted as acceptance or denial. The client
//! performs no in-process retries; retry policy belongs to the caller.

pub mod client;
pub mod gateway;
pub mod models;
pub mod prevalidate;

pub use client::*;
pub use gateway::*;
pub use models::*;
pub use prevalidate::*;
