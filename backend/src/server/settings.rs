//! Process settings loaded via OrthoConfig.
//!
//! Values come from `TRACKER_*` environment variables, an optional
//! configuration file, and command-line flags, in OrthoConfig's usual
//! precedence.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use tracker::startup::StartupOptions;

const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
const DEFAULT_PORT: u16 = 8080;

/// Settings controlling how the tracker binds, persists and seeds.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "TRACKER")]
pub struct ServerSettings {
    /// Interface to listen on.
    pub host: Option<IpAddr>,
    /// Port to listen on.
    pub port: Option<u16>,
    /// PostgreSQL connection string; the in-memory store is used when unset.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Identity fixture file registering users and their bearer tokens.
    pub fixtures_path: Option<PathBuf>,
    /// Repair membership drift at startup instead of only reporting it.
    #[ortho_config(default = false)]
    pub reconcile_on_startup: bool,
}

impl ServerSettings {
    /// Socket address the server binds to.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(
            self.host.unwrap_or(DEFAULT_HOST),
            self.port.unwrap_or(DEFAULT_PORT),
        )
    }

    /// Options for the startup sequence.
    pub fn startup_options(&self) -> StartupOptions {
        StartupOptions {
            fixtures_path: self.fixtures_path.clone(),
            reconcile: self.reconcile_on_startup,
        }
    }
}
