//! Multi-tenant issue tracker.
//!
//! The crate is laid out hexagonally:
//!
//! - [`domain`] holds identities, projects, tasks, the membership ledger and
//!   the authorisation guard, together with the ports they depend on.
//! - [`inbound`] adapts HTTP requests onto the domain's driving ports.
//! - [`outbound`] implements the driven ports over memory and PostgreSQL.
//! - [`startup`] seeds identities and audits the store before serving.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod startup;
#[cfg(test)]
mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
