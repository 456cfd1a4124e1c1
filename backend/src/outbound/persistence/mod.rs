//! PostgreSQL persistence adapter using Diesel ORM.
//!
//! [`DieselTrackerStore`] implements the `TrackerStore` port on top of
//! `diesel-async` and a `bb8` pool. Row structs and the schema stay private
//! to this module; the domain only ever sees its own entities.
//!
//! # Example
//!
//! ```ignore
//! use tracker::outbound::persistence::{DbPool, DieselTrackerStore, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/tracker")).await?;
//! let store = DieselTrackerStore::new(pool);
//! ```

mod diesel_tracker_store;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_tracker_store::DieselTrackerStore;
pub use migrations::{MIGRATIONS, MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
