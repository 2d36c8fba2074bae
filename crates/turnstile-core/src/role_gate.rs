//! Role-based gating.
//!
//! Unlike [`AccessValidator`](crate::validator::AccessValidator), the role
//! gate does not look at expiry: a token keeps its role until it is
//! refreshed away or evicted.

use crate::error::AuthError;
use crate::session::{Role, token_prefix};
use crate::store::TokenStore;
use crate::validator::parse_bearer;
use std::sync::Arc;

pub struct RoleGate {
    store: Arc<dyn TokenStore>,
}

impl RoleGate {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Role bound to `token`, or `None` if the token is unknown.
    pub async fn role_of(&self, token: &str) -> Result<Option<Role>, AuthError> {
        Ok(self.store.find_any(token).await?.map(|s| s.role))
    }

    /// Accept only ADMIN tokens. USER and unknown tokens are rejected with
    /// the same [`AuthError::Forbidden`].
    pub async fn require_admin(&self, authorization: Option<&str>) -> Result<(), AuthError> {
        let token = parse_bearer(authorization)?;
        match self.role_of(token).await? {
            Some(Role::Admin) => Ok(()),
            other => {
                tracing::debug!(token = token_prefix(token), role = ?other, "Admin access refused");
                Err(AuthError::Forbidden)
            }
        }
    }
}
