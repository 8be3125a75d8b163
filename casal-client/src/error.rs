//! Gateway error types

use thiserror::Error;

/// Gateway error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure; retryable by re-running the whole pass later
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    /// The per-call deadline elapsed before a response arrived
    #[error("request timed out")]
    TimedOut,

    /// The issuer cancelled the call
    #[error("request cancelled")]
    Cancelled,

    /// The authority violated the response envelope contract
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The authority rejected the supplied credentials
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The authority rejected the token on an authenticated call
    #[error("authorisation failure")]
    Authorisation,

    /// The authority locked the account after repeated login failures
    #[error("too many login attempts")]
    TooManyAttempts,

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller already sits at another table for this event
    #[error("already seated at another table")]
    AlreadySeated,

    /// The table id is stale; it was removed remotely
    #[error("table not found")]
    TableNotFound,

    /// Any other non-success status
    #[error("authority returned status {0}")]
    Api(u16),
}

/// Result type for gateway operations
pub type ClientResult<T> = Result<T, ClientError>;
