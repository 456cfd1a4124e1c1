//! Authorization guard.
//!
//! Every access rule lives in [`can_perform`], a pure function over the
//! actor and a tagged description of the action and its target. Services
//! consult it before each read or mutation; it never touches storage.
//!
//! | Action                 | Allowed when                                       |
//! |------------------------|----------------------------------------------------|
//! | `CreateProject`        | actor is an admin                                  |
//! | `ReadProject`          | actor owns the project or is on its team           |
//! | `UpdateProjectTeam`    | actor owns the project                             |
//! | `AssignTasks`          | actor is an admin                                  |
//! | `CreateTask`           | admin, owns the project, assignee on the team      |
//! | `UpdateTaskStatus`     | actor is the assignee                              |
//! | `CommentOnTask`        | actor is the assignee or owns the project          |
//! | `ReadAllTasks`         | actor is an admin                                  |
//! | `ReadOwnTasks`         | always                                             |
//! | `ReadDirectory`        | actor is an admin                                  |

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::{Error, Project, Role, Task, UserId};

/// The authenticated identity performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Actor {
    /// Identity performing the action.
    pub id: UserId,
    /// Role read from the stored identity.
    pub role: Role,
}

impl Actor {
    /// Build an actor from an identity id and role.
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Whether the actor holds the admin role.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// An action together with the entities it targets.
#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    /// Create a new project.
    CreateProject,
    /// Read a project or its task list.
    ReadProject {
        /// Target project.
        project: &'a Project,
    },
    /// Replace a project's team.
    UpdateProjectTeam {
        /// Target project.
        project: &'a Project,
    },
    /// Create tasks in general, before a project is resolved.
    AssignTasks,
    /// Create a task in `project` assigned to `assignee`.
    CreateTask {
        /// Parent project.
        project: &'a Project,
        /// Intended assignee.
        assignee: &'a UserId,
    },
    /// Change a task's status.
    UpdateTaskStatus {
        /// Target task.
        task: &'a Task,
    },
    /// Append a comment to a task.
    CommentOnTask {
        /// Target task.
        task: &'a Task,
        /// The task's parent project.
        project: &'a Project,
    },
    /// List every task in the system.
    ReadAllTasks,
    /// List the actor's own assigned tasks.
    ReadOwnTasks,
    /// Read identities other than oneself.
    ReadDirectory,
}

/// Stable reason attached to every denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// No authenticated actor was supplied.
    NotAuthenticated,
    /// The action requires the admin role.
    NotAdmin,
    /// The actor does not own the target project.
    NotOwner,
    /// The actor neither owns nor belongs to the target project.
    NotMember,
    /// The actor is not the task's assignee.
    NotAssignee,
    /// The intended assignee is not on the project team.
    AssigneeNotMember,
}

impl DenialReason {
    /// Stable wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotAuthenticated => "not_authenticated",
            Self::NotAdmin => "not_admin",
            Self::NotOwner => "not_owner",
            Self::NotMember => "not_member",
            Self::NotAssignee => "not_assignee",
            Self::AssigneeNotMember => "assignee_not_member",
        }
    }

    fn message(self) -> &'static str {
        match self {
            Self::NotAuthenticated => "authentication required",
            Self::NotAdmin => "admin role required",
            Self::NotOwner => "only the owning admin may do this",
            Self::NotMember => "not a member of this project",
            Self::NotAssignee => "only the assignee may do this",
            Self::AssigneeNotMember => "Assigned user must be a team member",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a guard evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The action may proceed.
    Allow,
    /// The action is refused for the given reason.
    Deny(DenialReason),
}

impl Decision {
    fn allow_if(condition: bool, reason: DenialReason) -> Self {
        if condition {
            Self::Allow
        } else {
            Self::Deny(reason)
        }
    }
}

/// Decide whether `actor` may perform `action`.
///
/// Rules are checked in a fixed order and the first failing rule supplies the
/// denial reason.
///
/// # Examples
/// ```
/// use tracker::domain::{Action, Actor, Decision, DenialReason, Role, UserId, can_perform};
///
/// let member = Actor::new(UserId::random(), Role::Member);
/// assert_eq!(
///     can_perform(Some(&member), &Action::CreateProject),
///     Decision::Deny(DenialReason::NotAdmin),
/// );
/// assert_eq!(can_perform(None, &Action::ReadOwnTasks), Decision::Deny(DenialReason::NotAuthenticated));
/// ```
pub fn can_perform(actor: Option<&Actor>, action: &Action<'_>) -> Decision {
    let Some(actor) = actor else {
        return Decision::Deny(DenialReason::NotAuthenticated);
    };
    match action {
        Action::CreateProject
        | Action::AssignTasks
        | Action::ReadAllTasks
        | Action::ReadDirectory => Decision::allow_if(actor.is_admin(), DenialReason::NotAdmin),
        Action::ReadProject { project } => Decision::allow_if(
            project.is_owned_by(&actor.id) || project.has_member(&actor.id),
            DenialReason::NotMember,
        ),
        Action::UpdateProjectTeam { project } => {
            Decision::allow_if(project.is_owned_by(&actor.id), DenialReason::NotOwner)
        }
        Action::CreateTask { project, assignee } => {
            if !actor.is_admin() {
                Decision::Deny(DenialReason::NotAdmin)
            } else if !project.is_owned_by(&actor.id) {
                Decision::Deny(DenialReason::NotOwner)
            } else {
                Decision::allow_if(project.has_member(assignee), DenialReason::AssigneeNotMember)
            }
        }
        Action::UpdateTaskStatus { task } => {
            Decision::allow_if(task.assigned_to == actor.id, DenialReason::NotAssignee)
        }
        Action::CommentOnTask { task, project } => Decision::allow_if(
            task.assigned_to == actor.id || project.is_owned_by(&actor.id),
            DenialReason::NotAssignee,
        ),
        Action::ReadOwnTasks => Decision::Allow,
    }
}

/// Evaluate the guard and translate a denial into a domain [`Error`].
///
/// `AssigneeNotMember` is an input problem and maps to `invalid_request`
/// against the `assignedTo` field; missing authentication maps to
/// `unauthorized`; every other denial maps to `forbidden`. The reason code is
/// always present under `details.reason`.
pub fn authorize(actor: Option<&Actor>, action: &Action<'_>) -> Result<(), Error> {
    match can_perform(actor, action) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => {
            debug!(
                actor = ?actor.map(|a| a.id.to_string()),
                reason = reason.as_str(),
                "guard denied action"
            );
            Err(denial_error(reason))
        }
    }
}

fn denial_error(reason: DenialReason) -> Error {
    let message = reason.message();
    match reason {
        DenialReason::NotAuthenticated => Error::unauthorized(message),
        DenialReason::AssigneeNotMember => Error::invalid_request(message).with_details(json!({
            "reason": reason.as_str(),
            "fields": [{
                "field": "assignedTo",
                "code": "not_team_member",
                "message": message,
            }],
        })),
        _ => Error::forbidden(message).with_details(json!({ "reason": reason.as_str() })),
    }
}

#[cfg(test)]
mod tests;
