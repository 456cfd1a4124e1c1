//! Driving port for task mutations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Actor, Error, Task, TaskId};

/// Raw input for creating a task.
///
/// Enumerations arrive as strings so that out-of-range values are reported
/// alongside missing fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTaskRequest {
    /// Short summary; required.
    pub title: String,
    /// Detailed description; required.
    pub description: String,
    /// Parent project id; required.
    pub project_id: String,
    /// Assignee id; required and on the project team.
    pub assigned_to: String,
    /// One of `bug`, `feature`, `improvement`.
    pub task_type: String,
    /// One of `low`, `medium`, `high`, `urgent`.
    pub priority: String,
    /// Optional deadline.
    pub due_date: Option<DateTime<Utc>>,
}

/// Driving port for creating tasks, moving them through the workflow and
/// discussing them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskCommand: Send + Sync {
    /// Create a task in a project the actor owns.
    async fn create_task(&self, actor: &Actor, request: CreateTaskRequest)
    -> Result<Task, Error>;

    /// Move a task to `status`; only its assignee may do so.
    async fn update_status(
        &self,
        actor: &Actor,
        task_id: &TaskId,
        status: &str,
    ) -> Result<Task, Error>;

    /// Append a comment; allowed for the assignee and the owning admin.
    async fn add_comment(&self, actor: &Actor, task_id: &TaskId, content: &str)
    -> Result<Task, Error>;
}
