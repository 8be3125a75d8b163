//! Casal Client - HTTP gateway to the membership authority
//!
//! Turns authenticated intents into validated responses: builds the calls,
//! enforces the `{success, data}` envelope contract, and surfaces typed
//! failures with per-call timeout and cancellation. Retry decisions belong to
//! the caller; this layer never retries on its own.

pub mod config;
pub mod error;
pub mod http;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;

// Re-export shared wire types for convenience
pub use shared::client::{Envelope, JoinRequest, LoginRequest, RemoteEvent, RemotePerson};
