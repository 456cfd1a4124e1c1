//! Driving port for project mutations.

use async_trait::async_trait;

use crate::domain::{Actor, Error, Project, ProjectId};

/// Raw input for creating a project.
///
/// Fields arrive unvalidated; the service reports every violation at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateProjectRequest {
    /// Project name; required.
    pub name: String,
    /// Project description; required.
    pub description: String,
    /// Initial team, as identity id strings.
    pub team_member_ids: Vec<String>,
}

/// Driving port for creating projects and staffing their teams.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectCommand: Send + Sync {
    /// Create a project owned by `actor`.
    ///
    /// # Errors
    /// `invalid_request` on missing fields or unknown team ids, `forbidden`
    /// when the actor is not an admin.
    async fn create_project(
        &self,
        actor: &Actor,
        request: CreateProjectRequest,
    ) -> Result<Project, Error>;

    /// Replace the team of `project_id` with `team_member_ids`.
    ///
    /// # Errors
    /// `not_found` for an unknown project, `forbidden` unless the actor owns
    /// it, `consistency_violation` when back-references have drifted and
    /// `conflict` when concurrent writers exhaust the retry budget.
    async fn update_team(
        &self,
        actor: &Actor,
        project_id: &ProjectId,
        team_member_ids: Vec<String>,
    ) -> Result<Project, Error>;
}
