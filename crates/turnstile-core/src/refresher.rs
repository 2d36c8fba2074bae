//! Token refresh.

use crate::clock::Clock;
use crate::error::{AuthError, StoreError};
use crate::session::{MAX_TOKEN_ATTEMPTS, Session, generate_token, token_prefix};
use crate::store::TokenStore;
use std::sync::Arc;

/// Exchanges a known token for a new one, keeping subject and role.
pub struct SessionRefresher {
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
}

impl SessionRefresher {
    pub fn new(store: Arc<dyn TokenStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Replace `old_token` with a freshly generated token and restart its
    /// validity window. The old token stops resolving in the same step.
    ///
    /// Expired tokens can still be refreshed as long as they have not been
    /// evicted; unknown tokens fail with [`AuthError::UnknownToken`] and
    /// leave the store untouched.
    pub async fn refresh(&self, old_token: &str) -> Result<Session, AuthError> {
        for attempt in 1..=MAX_TOKEN_ATTEMPTS {
            let new_token = generate_token();
            match self.store.replace(old_token, &new_token, self.clock.now()).await {
                Ok(session) => {
                    tracing::info!(
                        subject = %session.subject,
                        old = token_prefix(old_token),
                        new = token_prefix(&session.token),
                        "Refreshed session"
                    );
                    return Ok(session);
                }
                Err(StoreError::NotFound) => {
                    tracing::debug!(token = token_prefix(old_token), "Refresh of unknown token");
                    return Err(AuthError::UnknownToken);
                }
                Err(StoreError::DuplicateKey) => {
                    tracing::warn!(attempt, "Generated token collided, regenerating");
                }
                Err(e) => return Err(AuthError::Infrastructure(e)),
            }
        }

        Err(AuthError::Infrastructure(StoreError::DuplicateKey))
    }
}
