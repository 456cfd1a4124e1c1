//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccessTokenVerifier, ProjectCommand, ProjectQuery, ReferenceLookup, TaskCommand, TaskQuery,
    UserDirectory,
};

/// Dependency bundle for HTTP handlers.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use mockable::DefaultClock;
/// use tracker::domain::ports::FixtureAccessTokenVerifier;
/// use tracker::domain::{ProjectRegistry, ReferenceResolver, TaskEngine, UserDirectoryService};
/// use tracker::inbound::http::state::HttpState;
/// use tracker::outbound::memory::InMemoryTrackerStore;
///
/// let store = Arc::new(InMemoryTrackerStore::new());
/// let registry = Arc::new(ProjectRegistry::new(Arc::clone(&store), Arc::new(DefaultClock)));
/// let engine = Arc::new(TaskEngine::new(Arc::clone(&store), Arc::new(DefaultClock)));
/// let state = HttpState {
///     projects: registry.clone(),
///     projects_query: registry,
///     tasks: engine.clone(),
///     tasks_query: engine,
///     users: Arc::new(UserDirectoryService::new(Arc::clone(&store))),
///     references: Arc::new(ReferenceResolver::new(store)),
///     tokens: Arc::new(FixtureAccessTokenVerifier),
/// };
/// let _users = state.users.clone();
/// ```
#[derive(Clone)]
pub struct HttpState {
    /// Project creation and team staffing.
    pub projects: Arc<dyn ProjectCommand>,
    /// Project listings.
    pub projects_query: Arc<dyn ProjectQuery>,
    /// Task creation, workflow and comments.
    pub tasks: Arc<dyn TaskCommand>,
    /// Task listings.
    pub tasks_query: Arc<dyn TaskQuery>,
    /// Identity directory; also resolves authenticated actors.
    pub users: Arc<dyn UserDirectory>,
    /// Display summaries for the entities a response mentions.
    pub references: Arc<dyn ReferenceLookup>,
    /// Bearer token verification.
    pub tokens: Arc<dyn AccessTokenVerifier>,
}
