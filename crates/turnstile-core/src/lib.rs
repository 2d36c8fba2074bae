//! # turnstile-core
//!
//! Lifecycle of short-lived opaque access tokens.
//!
//! A login creates a [`Session`] that binds a random token to a subject, a
//! role and an issuance time. The token validates while
//! `now - issued_at < ttl`. Refreshing swaps the token and restarts the
//! window in one atomic store operation, after which the old token no
//! longer resolves.
//!
//! | Component | Reads | Writes | Looks at expiry |
//! |-----------|-------|--------|-----------------|
//! | [`SessionIssuer`] | | `insert` | |
//! | [`SessionRefresher`] | | `replace` | no |
//! | [`AccessValidator`] | `find_valid` | | yes |
//! | [`RoleGate`] | `find_any` | | no |
//!
//! Tokens are opaque: nothing is encoded in them and every check is a
//! server-side lookup in a [`TokenStore`].

pub mod clock;
pub mod config;
pub mod error;
pub mod issuer;
pub mod manager;
pub mod refresher;
pub mod role_gate;
pub mod session;
pub mod store;
pub mod sweeper;
pub mod validator;

#[cfg(test)]
mod testing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SessionConfig;
pub use error::{AuthError, ConfigError, StoreError};
pub use issuer::SessionIssuer;
pub use manager::SessionManager;
pub use refresher::SessionRefresher;
pub use role_gate::RoleGate;
pub use session::{Role, RolePolicy, Session, generate_token, token_prefix};
pub use store::{MemoryTokenStore, TokenStore};
pub use sweeper::{spawn_sweeper, sweep_once};
pub use validator::{AccessValidator, parse_bearer};
