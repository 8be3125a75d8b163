//! Shared types for the Casal engine
//!
//! Common types used across the client and engine crates: cache entities,
//! wire-level request/response types, and the identity-mapping layer.

pub mod client;
pub mod ids;
pub mod models;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use ids::{Fingerprint, Fingerprinted, LocalId, RemoteId};
pub use models::ModelError;
