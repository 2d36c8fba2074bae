//! Store doubles shared by the unit tests.

use crate::error::StoreError;
use crate::session::Session;
use crate::store::TokenStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Store whose backend is always down.
pub(crate) struct UnavailableStore;

fn down() -> StoreError {
    StoreError::Unavailable("connection refused".to_string())
}

#[async_trait]
impl TokenStore for UnavailableStore {
    fn ttl(&self) -> Duration {
        Duration::from_secs(30)
    }

    async fn insert(&self, _session: Session) -> Result<(), StoreError> {
        Err(down())
    }

    async fn replace(
        &self,
        _old_token: &str,
        _new_token: &str,
        _new_issued_at: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        Err(down())
    }

    async fn find_valid(&self, _token: &str, _now: DateTime<Utc>) -> Result<Option<Session>, StoreError> {
        Err(down())
    }

    async fn find_any(&self, _token: &str) -> Result<Option<Session>, StoreError> {
        Err(down())
    }

    async fn evict_issued_before(&self, _cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        Err(down())
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Err(down())
    }
}
