//! Wiring of the lifecycle components over one shared store and clock.

use crate::clock::Clock;
use crate::config::SessionConfig;
use crate::issuer::SessionIssuer;
use crate::refresher::SessionRefresher;
use crate::role_gate::RoleGate;
use crate::session::RolePolicy;
use crate::store::TokenStore;
use crate::sweeper::spawn_sweeper;
use crate::validator::AccessValidator;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub struct SessionManager {
    pub issuer: SessionIssuer,
    pub refresher: SessionRefresher,
    pub validator: AccessValidator,
    pub role_gate: RoleGate,
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl SessionManager {
    /// Build all components around `store`. The store's own TTL drives both
    /// validation and eviction; `config.ttl` should match it.
    pub fn new(store: Arc<dyn TokenStore>, clock: Arc<dyn Clock>, config: SessionConfig) -> Self {
        if store.ttl() != config.ttl {
            tracing::warn!(
                store_ttl = ?store.ttl(),
                config_ttl = ?config.ttl,
                "Store TTL differs from configured TTL; the store's value wins"
            );
        }

        let policy = RolePolicy::new(config.admin_subject.clone());
        Self {
            issuer: SessionIssuer::new(store.clone(), clock.clone(), policy),
            refresher: SessionRefresher::new(store.clone(), clock.clone()),
            validator: AccessValidator::new(store.clone(), clock.clone()),
            role_gate: RoleGate::new(store.clone()),
            store,
            clock,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Age past which the sweeper evicts a session: the store's TTL plus
    /// the configured grace.
    pub fn retention(&self) -> Duration {
        self.store.ttl().saturating_add(self.config.eviction_grace)
    }

    /// Start the background eviction task for this manager's store.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        spawn_sweeper(
            self.store.clone(),
            self.clock.clone(),
            self.config.sweep_interval,
            self.retention(),
        )
    }
}
