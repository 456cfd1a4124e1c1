//! Driving port for project reads.

use async_trait::async_trait;

use crate::domain::{Actor, Error, Project, ProjectId};

/// Driving port for listing and fetching projects.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectQuery: Send + Sync {
    /// Projects visible to `actor`: owned ones for admins, team memberships
    /// for members.
    async fn list_projects(&self, actor: &Actor) -> Result<Vec<Project>, Error>;

    /// Fetch one project the actor owns or belongs to.
    async fn get_project(&self, actor: &Actor, project_id: &ProjectId) -> Result<Project, Error>;
}
