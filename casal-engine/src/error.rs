//! Engine error types

use thiserror::Error;

use crate::store::StoreError;
use casal_client::ClientError;

/// Engine error type
///
/// Gateway and broker failures propagate unchanged; the engine itself only
/// introduces storage wrapping. A failed pass always surfaces one of these,
/// never a partially-successful result.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The account was removed, possibly concurrently with the caller
    #[error("no such account: {0}")]
    NoSuchAccount(String),

    /// A bounded wait elapsed before token renewal completed
    #[error("token renewal timed out")]
    TimedOut,

    /// Local cache fault; the in-flight pass is aborted, prior cache state
    /// is preserved
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    /// Gateway failure, propagated verbatim
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Session file I/O failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Session file (de)serialization failure
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
