//! HTTP inbound adapter exposing the REST endpoints.

pub mod auth;
pub mod dto;
pub mod error;
pub mod health;
pub mod projects;
pub mod routes;
pub mod state;
pub mod tasks;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub(crate) mod validation;

pub use error::ApiResult;
