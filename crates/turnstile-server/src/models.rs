use serde::{Deserialize, Serialize};
use std::time::Duration;
use turnstile_core::{Role, Session};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    /// Accepted but never checked.
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub access_token: String,
}

/// Body returned by login and refresh.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionResponse {
    pub access_token: String,
    /// Seconds until the token stops validating. The legacy response carried
    /// milliseconds here (30000 for the default window).
    pub expires_in: u64,
    pub username: String,
    /// Issuance time in Unix milliseconds.
    pub time_generated: i64,
    pub role: Role,
}

impl SessionResponse {
    pub fn new(session: Session, ttl: Duration) -> Self {
        Self {
            time_generated: session.issued_at.timestamp_millis(),
            access_token: session.token,
            expires_in: ttl.as_secs(),
            username: session.subject,
            role: session.role,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PingResponse {
    pub ok: bool,
    pub user: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminResponse {
    pub ok: bool,
    pub role: Role,
}
