//! Startup orchestration shared by the binary and integration tests.
//!
//! Seeds identity fixtures, audits the back-reference mirror and assembles
//! the HTTP state over a chosen [`TrackerStore`].

use std::path::PathBuf;
use std::sync::Arc;

use mockable::Clock;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::ports::{AccessTokenVerifier, FixtureAccessTokenVerifier, TrackerStore};
use crate::domain::{
    Error, MembershipAuditService, ProjectRegistry, ReferenceResolver, TaskEngine,
    UserDirectoryService,
};
use crate::inbound::http::state::HttpState;
use crate::outbound::memory::{FixtureError, IdentityFixtures};

/// Errors raised while preparing the service.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The identity fixture file is unusable.
    #[error(transparent)]
    Fixtures(#[from] FixtureError),
    /// Seeding or the membership audit failed.
    #[error("startup failed: {0}")]
    Domain(#[from] Error),
}

/// Startup behaviour switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupOptions {
    /// Identity fixtures to register; without them every token is rejected.
    pub fixtures_path: Option<PathBuf>,
    /// Repair back-reference drift instead of only reporting it.
    pub reconcile: bool,
}

/// Seed identities, audit the store and build handler state.
///
/// # Errors
/// Returns [`StartupError`] when fixtures cannot be loaded or seeded, or
/// when the store cannot be audited.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use mockable::DefaultClock;
/// use tracker::outbound::memory::InMemoryTrackerStore;
/// use tracker::startup::{StartupOptions, wire_http_state};
///
/// # async fn run() -> Result<(), tracker::startup::StartupError> {
/// let store = Arc::new(InMemoryTrackerStore::new());
/// let state = wire_http_state(store, Arc::new(DefaultClock), StartupOptions::default()).await?;
/// # let _ = state;
/// # Ok(())
/// # }
/// ```
pub async fn wire_http_state<S>(
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    options: StartupOptions,
) -> Result<HttpState, StartupError>
where
    S: TrackerStore + 'static,
{
    let directory = Arc::new(UserDirectoryService::new(Arc::clone(&store)));

    let tokens: Arc<dyn AccessTokenVerifier> = match &options.fixtures_path {
        Some(path) => {
            let fixtures = IdentityFixtures::load(path)?;
            Arc::new(fixtures.seed(directory.as_ref(), store.as_ref()).await?)
        }
        None => {
            warn!("no identity fixtures configured; every bearer token will be rejected");
            Arc::new(FixtureAccessTokenVerifier)
        }
    };

    let auditor = MembershipAuditService::new(Arc::clone(&store));
    let report = if options.reconcile {
        auditor.reconcile().await?
    } else {
        auditor.audit().await?
    };
    if report.is_consistent() {
        info!("membership ledger consistent");
    } else if !options.reconcile {
        warn!(
            drifted = report.drift.len(),
            dangling = report.dangling.len(),
            "membership ledger drift detected; restart with reconcile enabled to repair"
        );
    }

    let registry = Arc::new(ProjectRegistry::new(Arc::clone(&store), Arc::clone(&clock)));
    let engine = Arc::new(TaskEngine::new(Arc::clone(&store), clock));
    let references = Arc::new(ReferenceResolver::new(Arc::clone(&store)));
    Ok(HttpState {
        projects: registry.clone(),
        projects_query: registry,
        tasks: engine.clone(),
        tasks_query: engine,
        users: directory,
        references,
        tokens,
    })
}
