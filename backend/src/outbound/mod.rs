//! Driven adapters.
//!
//! `memory` keeps the whole tracker in process and backs tests and
//! single-node deployments. `persistence` stores it in PostgreSQL.

pub mod memory;
pub mod persistence;
