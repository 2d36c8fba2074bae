//! Session issuance at login.

use crate::clock::Clock;
use crate::error::{AuthError, StoreError};
use crate::session::{MAX_TOKEN_ATTEMPTS, RolePolicy, Session, generate_token, token_prefix};
use crate::store::TokenStore;
use std::sync::Arc;

/// Creates and stores a new session for every login.
pub struct SessionIssuer {
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    policy: RolePolicy,
}

impl SessionIssuer {
    pub fn new(store: Arc<dyn TokenStore>, clock: Arc<dyn Clock>, policy: RolePolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &RolePolicy {
        &self.policy
    }

    /// Issue a session for `subject`.
    ///
    /// **The password is not verified.** Any credentials are accepted and
    /// the password is neither stored nor logged. Only infrastructure
    /// failures can make this return an error.
    pub async fn issue(&self, subject: &str, _password: &str) -> Result<Session, AuthError> {
        let role = self.policy.role_for(subject);

        for attempt in 1..=MAX_TOKEN_ATTEMPTS {
            let session = Session::new(subject, role, generate_token(), self.clock.now());
            match self.store.insert(session.clone()).await {
                Ok(()) => {
                    tracing::info!(
                        subject = %session.subject,
                        role = %session.role,
                        token = token_prefix(&session.token),
                        "Issued session"
                    );
                    return Ok(session);
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
