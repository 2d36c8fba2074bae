use crate::config::{AppConfig, CompatConfig, StoreBackend};
use std::sync::Arc;
use turnstile_adapter_sqlite::{SqliteStoreOptions, SqliteTokenStore};
use turnstile_core::{Clock, MemoryTokenStore, SessionManager, SystemClock, TokenStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    sessions: SessionManager,
    compat: CompatConfig,
}

impl AppState {
    pub fn new(sessions: SessionManager, compat: CompatConfig) -> Self {
        Self {
            inner: Arc::new(AppStateInner { sessions, compat }),
        }
    }

    /// Build the configured token store and the session components on top.
    pub async fn init(cfg: &AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn TokenStore> = match cfg.store.backend {
            StoreBackend::Memory => Arc::new(MemoryTokenStore::new(cfg.session.ttl)),
            StoreBackend::Sqlite => {
                let options = SqliteStoreOptions {
                    ttl: cfg.session.ttl,
                    op_timeout: cfg.store.op_timeout,
                    max_connections: cfg.store.max_connections,
                };
                Arc::new(SqliteTokenStore::open_file(&cfg.store.sqlite_path, options).await?)
            }
        };
        tracing::info!(backend = ?cfg.store.backend, "Token store initialised");

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let sessions = SessionManager::new(store, clock, cfg.session.clone());
        Ok(Self::new(sessions, cfg.compat.clone()))
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.inner.sessions
    }

    pub fn compat(&self) -> &CompatConfig {
        &self.inner.compat
    }
}
