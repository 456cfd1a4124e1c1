//! Domain primitives, aggregates and services.
//!
//! Purpose: model identities, projects and tasks together with the rules
//! that govern how they reference one another. Keep the types transport
//! agnostic; inbound and outbound adapters reach the domain only through
//! [`ports`].
//!
//! Public surface:
//! - Entities: [`User`], [`Project`], [`Task`] and [`Comment`].
//! - [`can_perform`] and [`authorize`]: the single authorization decision
//!   table.
//! - [`MembershipLedger`]: keeps identity back-references in step with the
//!   authoritative project and task sets.
//! - Services: [`ProjectRegistry`], [`TaskEngine`], [`UserDirectoryService`],
//!   [`ReferenceResolver`] and [`MembershipAuditService`].
//! - [`Error`] and [`ErrorCode`]: the transport-agnostic failure payload.

pub mod authorization;
pub mod error;
mod identifiers;
pub mod membership;
mod membership_audit;
pub mod ports;
mod project;
mod project_registry;
mod references;
pub(crate) mod service_support;
mod task;
mod task_engine;
mod text;
mod trace_id;
mod user;
mod user_directory;

pub use self::authorization::{Action, Actor, Decision, DenialReason, authorize, can_perform};
pub use self::error::{Error, ErrorCode, FieldViolation, FieldViolations};
pub use self::identifiers::{CommentId, ProjectId, Revision, TaskId, UserId};
pub use self::membership::{AuditReport, DanglingReference, Drift, MembershipLedger};
pub use self::membership_audit::MembershipAuditService;
pub use self::project::{Project, ProjectStatus};
pub use self::project_registry::ProjectRegistry;
pub use self::references::{
    ProjectRef, ReferenceResolver, ReferenceSet, ResolvedReferences, TaskRef, UserRef,
};
pub use self::service_support::RetryPolicy;
pub use self::task::{Comment, Task, TaskPriority, TaskSpec, TaskStatus, TaskType};
pub use self::task_engine::TaskEngine;
pub use self::text::RequiredText;
pub use self::trace_id::TraceId;
pub use self::user::{EmailAddress, PasswordHash, Role, UnknownRole, User, UserValidationError};
pub use self::user_directory::UserDirectoryService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use tracker::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
