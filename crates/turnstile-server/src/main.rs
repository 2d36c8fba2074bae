use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod handlers;
mod models;
mod routes;
mod state;

use config::{ConfigOverrides, StoreBackend};
use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "turnstile-server", version, about = "Opaque access-token server")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, env = "TURNSTILE_CONFIG", default_value = "turnstile.toml")]
    config: PathBuf,

    /// Bind address, overrides `server.bind`
    #[arg(long, env = "TURNSTILE_BIND")]
    bind: Option<String>,

    /// Token lifetime such as "30s", overrides `session.ttl`
    #[arg(long, env = "TURNSTILE_TTL", value_parser = humantime::parse_duration)]
    ttl: Option<Duration>,

    /// Subject granted the ADMIN role, overrides `session.admin_subject`
    #[arg(long, env = "TURNSTILE_ADMIN_SUBJECT")]
    admin_subject: Option<String>,

    /// Token store backend, overrides `store.backend`
    #[arg(long, env = "TURNSTILE_STORE", value_enum)]
    store: Option<StoreBackend>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bind: self.bind.clone(),
            ttl: self.ttl,
            admin_subject: self.admin_subject.clone(),
            store: self.store,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?.apply(cli.overrides());
    cfg.validate()?;

    tracing::warn!("Passwords are NOT verified: every login is accepted and only the username is used");
    tracing::info!(
        ttl = %humantime::format_duration(cfg.session.ttl),
        admin_subject = %cfg.session.admin_subject,
        "Session policy"
    );

    let state = AppState::init(&cfg).await?;
    let sweeper = state.sessions().spawn_sweeper();

    let app = routes::create_router(state, &cfg.server.path_prefix);

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind).await?;
    tracing::info!("turnstile-server listening on {}", cfg.server.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    tracing::info!("turnstile-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
