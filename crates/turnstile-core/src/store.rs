//! Keyed session storage.
//!
//! A [`TokenStore`] is the single shared mutable resource of the lifecycle.
//! Every mutation goes through [`TokenStore::insert`] or
//! [`TokenStore::replace`]; components never edit a [`Session`] in place.

use crate::error::StoreError;
use crate::session::Session;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

/// Storage contract shared by the in-memory and SQL backends.
///
/// `replace` must be atomic with respect to concurrent lookups: a reader
/// sees either the old key or the new key, never both and never neither.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Store-wide validity window used by [`TokenStore::find_valid`].
    fn ttl(&self) -> Duration;

    /// Add a new session keyed by its token.
    async fn insert(&self, session: Session) -> Result<(), StoreError>;

    /// Re-key the session stored under `old_token` and reset its issuance
    /// time. Fails with [`StoreError::NotFound`] without side effects when
    /// `old_token` is absent.
    async fn replace(
        &self,
        old_token: &str,
        new_token: &str,
        new_issued_at: DateTime<Utc>,
    ) -> Result<Session, StoreError>;

    /// The session under `token` if it is present and `now - issued_at < ttl`.
    /// Absent and expired are both reported as `None`.
    async fn find_valid(&self, token: &str, now: DateTime<Utc>) -> Result<Option<Session>, StoreError>;

    /// The session under `token`, ignoring expiry.
    async fn find_any(&self, token: &str) -> Result<Option<Session>, StoreError>;

    /// Remove every session issued strictly before `cutoff`.
    async fn evict_issued_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError>;

    /// Number of stored sessions, expired ones included.
    async fn len(&self) -> Result<usize, StoreError>;
}

/// In-process store guarded by a single lock, which makes every operation
/// linearizable.
pub struct MemoryTokenStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemoryTokenStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("session map lock poisoned".to_string())
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    fn ttl(&self) -> Duration {
        self.ttl
    }

    async fn insert(&self, session: Session) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        if sessions.contains_key(&session.token) {
            return Err(StoreError::DuplicateKey);
        }
        sessions.insert(session.token.clone(), session);
        Ok(())
    }

    async fn replace(
        &self,
        old_token: &str,
        new_token: &str,
        new_issued_at: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        if !sessions.contains_key(old_token) {
            return Err(StoreError::NotFound);
        }
        if old_token != new_token && sessions.contains_key(new_token) {
            return Err(StoreError::DuplicateKey);
        }

        let mut session = sessions.remove(old_token).ok_or(StoreError::NotFound)?;
        session.token = new_token.to_string();
        session.issued_at = new_issued_at;
        sessions.insert(session.token.clone(), session.clone());
        Ok(session)
    }

    async fn find_valid(&self, token: &str, now: DateTime<Utc>) -> Result<Option<Session>, StoreError> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        Ok(sessions
            .get(token)
            .filter(|s| s.is_live(now, self.ttl))
            .cloned())
    }

    async fn find_any(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        Ok(sessions.get(token).cloned())
    }

    async fn evict_issued_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        let before = sessions.len();
        sessions.retain(|_, s| s.issued_at >= cutoff);
        Ok(before - sessions.len())
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.sessions.read().map_err(poisoned)?.len())
    }
}
