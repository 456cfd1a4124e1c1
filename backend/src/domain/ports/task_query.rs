//! Driving port for task reads.

use async_trait::async_trait;

use crate::domain::{Actor, Error, ProjectId, Task};

/// Driving port for the three task listings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskQuery: Send + Sync {
    /// Tasks of a project the actor owns or belongs to.
    async fn list_by_project(&self, actor: &Actor, project_id: &ProjectId)
    -> Result<Vec<Task>, Error>;

    /// Tasks assigned to the actor.
    async fn list_mine(&self, actor: &Actor) -> Result<Vec<Task>, Error>;

    /// Every task; admins only.
    async fn list_all(&self, actor: &Actor) -> Result<Vec<Task>, Error>;
}
