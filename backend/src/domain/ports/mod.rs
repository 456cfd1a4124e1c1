//! Domain ports defining the edges of the hexagon.
//!
//! Driving ports (`ProjectCommand`, `ProjectQuery`, `TaskCommand`,
//! `TaskQuery`, `UserDirectory`, `ReferenceLookup`) are what inbound
//! adapters call. Driven ports (`TrackerStore`, `AccessTokenVerifier`) are
//! what the domain needs from outbound adapters. Each port exposes a typed
//! error so adapters map their failures into predictable variants.

mod macros;
pub(crate) use macros::define_port_error;

mod access_token_verifier;
mod project_command;
mod project_query;
mod reference_lookup;
mod task_command;
mod task_query;
mod tracker_store;
mod user_directory;

#[cfg(test)]
pub use access_token_verifier::MockAccessTokenVerifier;
pub use access_token_verifier::{
    AccessTokenError, AccessTokenVerifier, FixtureAccessTokenVerifier,
};
#[cfg(test)]
pub use project_command::MockProjectCommand;
pub use project_command::{CreateProjectRequest, ProjectCommand};
#[cfg(test)]
pub use project_query::MockProjectQuery;
pub use project_query::ProjectQuery;
#[cfg(test)]
pub use reference_lookup::MockReferenceLookup;
pub use reference_lookup::{FixtureReferenceLookup, ReferenceLookup};
#[cfg(test)]
pub use task_command::MockTaskCommand;
pub use task_command::{CreateTaskRequest, TaskCommand};
#[cfg(test)]
pub use task_query::MockTaskQuery;
pub use task_query::TaskQuery;
#[cfg(test)]
pub use tracker_store::MockTrackerStore;
pub use tracker_store::{ChangeSet, TrackerStore, TrackerStoreError, Write};
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::{RegisterUserRequest, UserDirectory};
