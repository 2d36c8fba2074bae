//! Access validation for secured requests.

use crate::clock::Clock;
use crate::error::AuthError;
use crate::session::token_prefix;
use crate::store::TokenStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn parse_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MalformedAuthHeader)?;
    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::MalformedAuthHeader)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::MalformedAuthHeader);
    }
    Ok(token)
}

/// Resolves a bearer token to its subject while the session is unexpired.
pub struct AccessValidator {
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
}

impl AccessValidator {
    pub fn new(store: Arc<dyn TokenStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Validate an `Authorization` header value at `now`.
    pub async fn validate(&self, authorization: Option<&str>, now: DateTime<Utc>) -> Result<String, AuthError> {
        let token = parse_bearer(authorization)?;
        self.validate_token(token, now).await
    }

    /// Validate an `Authorization` header value against the injected clock.
    pub async fn validate_now(&self, authorization: Option<&str>) -> Result<String, AuthError> {
        self.validate(authorization, self.clock.now()).await
    }

    /// Validate a bare token at `now`. Absent and expired tokens both yield
    /// [`AuthError::UnknownToken`].
    pub async fn validate_token(&self, token: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        match self.store.find_valid(token, now).await? {
            Some(session) => Ok(session.subject),
            None => {
                tracing::debug!(token = token_prefix(token), "Rejected absent or expired token");
                Err(AuthError::UnknownToken)
            }
        }
    }
}
