//! Tracker entry-point: loads settings, selects a store, and serves the REST API.

mod server;

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{ServerConfig, ServerSettings, create_server};
use tracker::inbound::http::health::HealthState;
use tracker::inbound::http::state::HttpState;
use tracker::outbound::memory::InMemoryTrackerStore;
use tracker::outbound::persistence::{DbPool, DieselTrackerStore, PoolConfig, run_migrations};
use tracker::startup::wire_http_state;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load_from_iter(std::env::args_os())
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;

    let http_state = build_http_state(&settings).await?;
    let config = ServerConfig::new(settings.bind_addr(), http_state);
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(server::make_metrics());

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    info!(addr = %settings.bind_addr(), "tracker listening");
    health_state.mark_ready();

    let draining = health_state.clone();
    actix_web::rt::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            draining.begin_draining();
        }
    });
    server.await
}

/// Wire handler state over PostgreSQL when a database URL is configured,
/// falling back to the volatile in-memory store otherwise.
async fn build_http_state(settings: &ServerSettings) -> std::io::Result<HttpState> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let options = settings.startup_options();

    let state = match &settings.database_url {
        Some(url) => {
            let migration_url = url.clone();
            let applied = tokio::task::spawn_blocking(move || run_migrations(&migration_url))
                .await
                .map_err(|e| std::io::Error::other(format!("migration task failed: {e}")))?
                .map_err(std::io::Error::other)?;
            info!(applied, "database schema up to date");

            let mut pool_config = PoolConfig::new(url.as_str());
            if let Some(max) = settings.db_max_connections {
                pool_config = pool_config.with_max_size(max);
            }
            let pool = DbPool::new(pool_config)
                .await
                .map_err(std::io::Error::other)?;
            wire_http_state(Arc::new(DieselTrackerStore::new(pool)), clock, options).await
        }
        None => {
            warn!("no database configured; state is held in memory and lost on exit");
            wire_http_state(Arc::new(InMemoryTrackerStore::new()), clock, options).await
        }
    };
    state.map_err(std::io::Error::other)
}
