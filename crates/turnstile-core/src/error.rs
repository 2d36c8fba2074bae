//! Error types for the session lifecycle.

use std::time::Duration;
use thiserror::Error;

/// Errors raised by a [`TokenStore`](crate::store::TokenStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A session with the same token is already stored.
    #[error("token already present in store")]
    DuplicateKey,

    /// No session is stored under the requested token.
    #[error("token not found")]
    NotFound,

    /// The backing store could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backing store did not answer within the configured bound.
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
}

impl StoreError {
    /// Whether the caller may retry the operation with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout(_))
    }
}

/// Errors surfaced by the issuer, refresher, validator and role gate.
///
/// `UnknownToken` also covers expired tokens: callers cannot tell the two
/// apart.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token is absent, superseded by a refresh, or past its TTL.
    #[error("unknown token")]
    UnknownToken,

    /// The `Authorization` header is missing or not `Bearer <token>`.
    #[error("malformed authorization header")]
    MalformedAuthHeader,

    /// The token does not carry the ADMIN role (or is unknown).
    #[error("admin role required")]
    Forbidden,

    /// Persistence failed; retryable and never an authorization outcome.
    #[error("infrastructure error: {0}")]
    Infrastructure(StoreError),
}

impl AuthError {
    /// Authorization failures are reported to clients as 401/403.
    pub fn is_authorization_failure(&self) -> bool {
        !matches!(self, AuthError::Infrastructure(_))
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AuthError::UnknownToken,
            other => AuthError::Infrastructure(other),
        }
    }
}

/// Invalid lifecycle configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("session ttl must be greater than zero")]
    ZeroTtl,

    #[error("admin subject must not be empty")]
    EmptyAdminSubject,

    #[error("sweep interval must be greater than zero")]
    ZeroSweepInterval,
}
