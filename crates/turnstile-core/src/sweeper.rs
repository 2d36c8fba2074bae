//! Periodic eviction of sessions past their TTL plus grace period.

use crate::clock::Clock;
use crate::error::StoreError;
use crate::session::ttl_delta;
use crate::store::TokenStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Remove every session issued more than `retention` ago.
pub async fn sweep_once(store: &dyn TokenStore, clock: &dyn Clock, retention: Duration) -> Result<usize, StoreError> {
    let Some(cutoff) = clock.now().checked_sub_signed(ttl_delta(retention)) else {
        return Ok(0);
    };
    let removed = store.evict_issued_before(cutoff).await?;
    if removed > 0 {
        tracing::info!(removed, %cutoff, "Evicted stale sessions");
    }
    Ok(removed)
}

/// Run [`sweep_once`] every `interval` until the returned handle is aborted.
/// Store errors are logged and the next tick tries again.
pub fn spawn_sweeper(
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    retention: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = sweep_once(store.as_ref(), clock.as_ref(), retention).await {
                tracing::warn!(error = %e, retryable = e.is_retryable(), "Session sweep failed");
            }
        }
    })
}
