use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};
use turnstile_core::SessionConfig;
use turnstile_core::config::humantime_serde;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub compat: CompatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, e.g. "0.0.0.0:8080"
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Prefix for every API route, e.g. "/jwt". Empty serves from the root.
    #[serde(default)]
    pub path_prefix: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            path_prefix: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,

    /// Path to the SQLite file when `backend = "sqlite"`.
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,

    /// Bound on a single database round-trip.
    #[serde(default = "default_op_timeout", with = "humantime_serde")]
    pub op_timeout: Duration,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_backend() -> StoreBackend {
    StoreBackend::Memory
}

fn default_sqlite_path() -> String {
    "data/turnstile.sqlite".to_string()
}

fn default_op_timeout() -> Duration {
    Duration::from_secs(2)
}

fn default_max_connections() -> u32 {
    5
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            sqlite_path: default_sqlite_path(),
            op_timeout: default_op_timeout(),
            max_connections: default_max_connections(),
        }
    }
}

/// Switches that restore the legacy wire format. Together with
/// `server.path_prefix = "/jwt"` they let the old interactive client talk to
/// this server unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompatConfig {
    /// Answer `/admin/test` with 200 and put the verdict in the body text.
    #[serde(default)]
    pub admin_status_in_body: bool,

    /// Answer `/auth/refresh` with the new token as bare `text/plain`
    /// instead of a session object.
    #[serde(default)]
    pub refresh_bare_token: bool,
}

/// Values given on the command line or through the environment. They win
/// over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind: Option<String>,
    pub ttl: Option<Duration>,
    pub admin_subject: Option<String>,
    pub store: Option<StoreBackend>,
}

impl AppConfig {
    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(bind) = overrides.bind {
            self.server.bind = bind;
        }
        if let Some(ttl) = overrides.ttl {
            self.session.ttl = ttl;
        }
        if let Some(admin_subject) = overrides.admin_subject {
            self.session.admin_subject = admin_subject;
        }
        if let Some(store) = overrides.store {
            self.store.backend = store;
        }
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.session.validate()?;

        let prefix = &self.server.path_prefix;
        if !prefix.is_empty() && (!prefix.starts_with('/') || prefix.ends_with('/')) {
            anyhow::bail!("server.path_prefix must start with '/' and not end with '/' (got '{prefix}')");
        }
        if self.store.op_timeout.is_zero() {
            anyhow::bail!("store.op_timeout must be greater than zero");
        }
        Ok(())
    }
}

/// Read the TOML config at `path`. A missing file yields the defaults.
pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "Config file not found, using defaults");
        return Ok(AppConfig::default());
    }
    let raw = fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&raw)?;
    Ok(cfg)
}
