//! Session lifecycle configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for token issuance, validation and eviction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long a token validates after issuance or refresh.
    #[serde(default = "default_ttl", with = "humantime_serde")]
    pub ttl: Duration,

    /// Subject that receives the ADMIN role at login.
    #[serde(default = "default_admin_subject")]
    pub admin_subject: String,

    /// Extra time an expired session is kept (and still answers role
    /// lookups) before the sweeper removes it.
    #[serde(default = "default_eviction_grace", with = "humantime_serde")]
    pub eviction_grace: Duration,

    /// How often the sweeper runs.
    #[serde(default = "default_sweep_interval", with = "humantime_serde")]
    pub sweep_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: default_ttl(),
            admin_subject: default_admin_subject(),
            eviction_grace: default_eviction_grace(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl.is_zero() {
            return Err(ConfigError::ZeroTtl);
        }
        if self.admin_subject.trim().is_empty() {
            return Err(ConfigError::EmptyAdminSubject);
        }
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::ZeroSweepInterval);
        }
        Ok(())
    }

    /// Age past which a session is evicted.
    pub fn retention(&self) -> Duration {
        self.ttl.saturating_add(self.eviction_grace)
    }
}

fn default_ttl() -> Duration {
    Duration::from_secs(30)
}

fn default_admin_subject() -> String {
    "sergi".to_string()
}

fn default_eviction_grace() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(60)
}

/// Serde adapter for durations written as `"30s"`, `"5m"`, `"1h 30m"`.
pub mod humantime_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
