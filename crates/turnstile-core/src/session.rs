//! The session record and the role policy applied at login.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Closed set of roles a session can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// A token bound to a subject, a role and its most recent issuance time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Identity supplied at login.
    pub subject: String,
    /// Fixed at issuance; never changed by refresh.
    pub role: Role,
    /// Opaque lookup key, regenerated on every issuance and refresh.
    pub token: String,
    /// Time of the last issuance or refresh.
    pub issued_at: DateTime<Utc>,
}

impl Session {
    pub fn new(subject: impl Into<String>, role: Role, token: String, issued_at: DateTime<Utc>) -> Self {
        Self {
            subject: subject.into(),
            role,
            token,
            issued_at,
        }
    }

    /// First instant at which the session no longer validates.
    pub fn expires_at(&self, ttl: Duration) -> DateTime<Utc> {
        self.issued_at
            .checked_add_signed(ttl_delta(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// `now - issued_at < ttl`; the upper boundary is exclusive.
    pub fn is_live(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.issued_at) < ttl_delta(ttl)
    }
}

pub(crate) fn ttl_delta(ttl: Duration) -> TimeDelta {
    TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX)
}

/// Maps a login subject to its role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePolicy {
    admin_subject: String,
}

impl RolePolicy {
    pub fn new(admin_subject: impl Into<String>) -> Self {
        Self {
            admin_subject: admin_subject.into(),
        }
    }

    pub fn admin_subject(&self) -> &str {
        &self.admin_subject
    }

    pub fn role_for(&self, subject: &str) -> Role {
        if subject == self.admin_subject {
            Role::Admin
        } else {
            Role::User
        }
    }
}

/// Attempts made when a freshly generated token collides with a stored one.
pub(crate) const MAX_TOKEN_ATTEMPTS: usize = 3;

/// Fresh opaque token drawn from the OS random source.
pub fn generate_token() -> String {
    Uuid::new_v4().to_string()
}

/// Short token prefix that is safe to put in logs.
pub fn token_prefix(token: &str) -> &str {
    match token.char_indices().nth(8) {
        Some((idx, _)) => &token[..idx],
        None => token,
    }
}
