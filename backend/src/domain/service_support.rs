//! Shared helpers for services that validate, read, stage and commit.
//!
//! Multi-entity mutations run as attempts: load fresh state, stage a
//! [`ChangeSet`](super::ports::ChangeSet), commit. A stale revision aborts
//! the attempt and the whole thing is replayed after a short backoff.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use serde_json::json;
use tracing::{error, warn};

use super::ports::{TrackerStore, TrackerStoreError};
use super::{
    Error, FieldViolations, MembershipLedger, Project, ProjectId, RequiredText, Task, TaskId,
    User, UserId,
};

/// Bounded exponential backoff for optimistic commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    initial_delay: Duration,
}

impl RetryPolicy {
    /// Build a policy. `attempts` is clamped to at least one.
    pub fn new(attempts: u32, initial_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            initial_delay,
        }
    }

    /// Total attempts, including the first.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    fn delay_before(&self, retry: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2_u32.saturating_pow(retry.saturating_sub(1)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(25))
    }
}

/// Why one attempt did not complete.
#[derive(Debug)]
pub(crate) enum AttemptError {
    /// A revision check failed; the attempt may be replayed.
    Stale { entity: String, id: String },
    /// Any other failure; returned to the caller as is.
    Fatal(Error),
}

impl From<Error> for AttemptError {
    fn from(value: Error) -> Self {
        Self::Fatal(value)
    }
}

impl From<TrackerStoreError> for AttemptError {
    fn from(value: TrackerStoreError) -> Self {
        match value {
            TrackerStoreError::RevisionMismatch { entity, id } => Self::Stale { entity, id },
            other => Self::Fatal(map_store_error(other)),
        }
    }
}

/// Run `attempt` until it succeeds, fails fatally or the policy is exhausted.
///
/// Exhaustion surfaces as `conflict`.
pub(crate) async fn retry_stale<T, F, Fut>(
    policy: RetryPolicy,
    operation: &'static str,
    mut attempt: F,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    let mut tried = 0;
    loop {
        tried += 1;
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(AttemptError::Fatal(err)) => return Err(err),
            Err(AttemptError::Stale { entity, id }) if tried >= policy.attempts => {
                warn!(operation, %entity, %id, tried, "giving up after concurrent writes");
                return Err(Error::conflict(format!(
                    "{entity} {id} kept changing concurrently; retry the request"
                ))
                .with_details(json!({ "entity": entity, "id": id })));
            }
            Err(AttemptError::Stale { entity, id }) => {
                let delay = policy.delay_before(tried);
                warn!(operation, %entity, %id, tried, ?delay, "stale revision, retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Translate a store failure into a domain error.
pub(crate) fn map_store_error(error: TrackerStoreError) -> Error {
    match error {
        TrackerStoreError::Connection { message } => {
            warn!(%message, "tracker store unavailable");
            Error::service_unavailable("tracker store is unavailable")
        }
        TrackerStoreError::Query { message } => {
            error!(%message, "tracker store query failed");
            Error::internal(format!("tracker store query failed: {message}"))
        }
        TrackerStoreError::RevisionMismatch { entity, id } => {
            Error::conflict(format!("{entity} {id} was modified concurrently"))
        }
        TrackerStoreError::MissingEntity { entity, id } => {
            Error::not_found(format!("{entity} {id} not found"))
        }
        TrackerStoreError::DuplicateEmail { email } => {
            Error::conflict(format!("email {email} is already registered")).with_details(json!({
                "fields": [{
                    "field": "email",
                    "code": "duplicate",
                    "message": "Email is already registered",
                }],
            }))
        }
    }
}

/// Trim `raw` and record `message` against `field` when nothing remains.
pub(crate) fn required_text(
    violations: &mut FieldViolations,
    field: &str,
    raw: &str,
    message: &str,
) -> Option<RequiredText> {
    let text = RequiredText::new(raw);
    if text.is_none() {
        violations.push(field, "missing_field", message);
    }
    text
}

/// Parse a required value, recording `missing` when blank and `invalid`
/// when it does not parse.
pub(crate) fn required_parsed<T: FromStr>(
    violations: &mut FieldViolations,
    field: &str,
    raw: &str,
    missing: &str,
    invalid: &str,
) -> Option<T> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        violations.push(field, "missing_field", missing);
        return None;
    }
    let parsed = trimmed.parse().ok();
    if parsed.is_none() {
        violations.push(field, "invalid_value", invalid);
    }
    parsed
}

/// Parse a list of identity ids, recording one violation per bad entry.
pub(crate) fn parse_user_ids(
    violations: &mut FieldViolations,
    field: &str,
    raws: &[String],
) -> Vec<UserId> {
    raws.iter()
        .filter_map(|raw| {
            let parsed = raw.parse::<UserId>().ok();
            if parsed.is_none() {
                violations.push(
                    field,
                    "invalid_value",
                    format!("`{raw}` is not a valid user identifier"),
                );
            }
            parsed
        })
        .collect()
}

/// Load a project or fail with `not_found`.
pub(crate) async fn require_project<S: TrackerStore + ?Sized>(
    store: &S,
    id: &ProjectId,
) -> Result<Project, Error> {
    store
        .find_project(id)
        .await
        .map_err(map_store_error)?
        .ok_or_else(|| Error::not_found("Project not found"))
}

/// Verify `ledger` against a `project` loaded in an earlier read.
///
/// The project and its identities are separate reads, so a commit landing
/// between them looks like drift. If the project has moved on since it was
/// loaded the attempt is stale; otherwise the drift is real.
pub(crate) async fn verify_loaded_project<S: TrackerStore + ?Sized>(
    store: &S,
    ledger: &MembershipLedger,
    project: &Project,
) -> Result<(), AttemptError> {
    if ledger.mirrors_project(project) {
        return Ok(());
    }
    let current = require_project(store, &project.id).await?;
    if current.revision != project.revision {
        return Err(AttemptError::Stale {
            entity: "project".to_owned(),
            id: project.id.to_string(),
        });
    }
    ledger.verify_project(project).map_err(AttemptError::from)
}

/// Load a task or fail with `not_found`.
pub(crate) async fn require_task<S: TrackerStore + ?Sized>(
    store: &S,
    id: &TaskId,
) -> Result<Task, Error> {
    store
        .find_task(id)
        .await
        .map_err(map_store_error)?
        .ok_or_else(|| Error::not_found("Task not found"))
}

/// Load an identity or fail with `not_found`.
pub(crate) async fn require_user<S: TrackerStore + ?Sized>(
    store: &S,
    id: &UserId,
) -> Result<User, Error> {
    store
        .find_user(id)
        .await
        .map_err(map_store_error)?
        .ok_or_else(|| Error::not_found("User not found"))
}
