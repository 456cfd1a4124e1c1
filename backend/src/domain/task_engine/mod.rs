//! Task engine: task creation, the status workflow and comment threads.
//!
//! Creating a task writes three records: the task itself, the parent
//! project's task list and the assignee's back-reference. They are committed
//! as one change set.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use super::ports::{ChangeSet, CreateTaskRequest, TaskCommand, TaskQuery, TrackerStore};
use super::service_support::{
    AttemptError, RetryPolicy, map_store_error, require_project, require_task, required_parsed,
    required_text, retry_stale, verify_loaded_project,
};
use super::{
    Action, Actor, Error, FieldViolations, MembershipLedger, ProjectId, RequiredText, Task,
    TaskId, TaskPriority, TaskSpec, TaskStatus, TaskType, UserId, authorize,
};

/// Task engine service implementing [`TaskCommand`] and [`TaskQuery`].
pub struct TaskEngine<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

// Manual impl: `#[derive(Clone)]` would require `S: Clone`, but only the
// `Arc` handle is cloned.
impl<S> Clone for TaskEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            retry: self.retry,
        }
    }
}

impl<S> TaskEngine<S> {
    /// Create an engine over `store`.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the retry policy used for contended commits.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

fn validate_new_task(request: &CreateTaskRequest) -> Result<TaskSpec, Error> {
    let mut v = FieldViolations::default();
    let title = required_text(&mut v, "title", &request.title, "Title is required");
    let description = required_text(
        &mut v,
        "description",
        &request.description,
        "Description is required",
    );
    let project_id: Option<ProjectId> = required_parsed(
        &mut v,
        "project",
        &request.project_id,
        "Project ID is required",
        "Project ID must be a valid identifier",
    );
    let assigned_to: Option<UserId> = required_parsed(
        &mut v,
        "assignedTo",
        &request.assigned_to,
        "Assigned user ID is required",
        "Assigned user ID must be a valid identifier",
    );
    let task_type: Option<TaskType> = required_parsed(
        &mut v,
        "type",
        &request.task_type,
        "Task type is required",
        "Task type must be one of bug, feature, improvement",
    );
    let priority: Option<TaskPriority> = required_parsed(
        &mut v,
        "priority",
        &request.priority,
        "Priority is required",
        "Priority must be one of low, medium, high, urgent",
    );
    v.into_result()?;

    match (title, description, project_id, assigned_to, task_type, priority) {
        (
            Some(title),
            Some(description),
            Some(project_id),
            Some(assigned_to),
            Some(task_type),
            Some(priority),
        ) => Ok(TaskSpec {
            title,
            description,
            project_id,
            assigned_to,
            task_type,
            priority,
            due_date: request.due_date,
        }),
        _ => Err(Error::invalid_request("request validation failed")),
    }
}

fn parse_status(raw: &str) -> Result<TaskStatus, Error> {
    let mut v = FieldViolations::default();
    let status = required_parsed(&mut v, "status", raw, "Status is required", "Invalid status");
    v.into_result()?;
    status.ok_or_else(|| Error::invalid_request("Invalid status"))
}

fn parse_comment(raw: &str) -> Result<RequiredText, Error> {
    let mut v = FieldViolations::default();
    let content = required_text(&mut v, "content", raw, "Comment content is required");
    v.into_result()?;
    content.ok_or_else(|| Error::invalid_request("Comment content is required"))
}

impl<S> TaskEngine<S>
where
    S: TrackerStore,
{
    async fn create_once(&self, actor: &Actor, spec: &TaskSpec) -> Result<Task, AttemptError> {
        let mut project = require_project(self.store.as_ref(), &spec.project_id).await?;
        authorize(
            Some(actor),
            &Action::CreateTask {
                project: &project,
                assignee: &spec.assigned_to,
            },
        )?;

        let assignee = self.store.find_user(&spec.assigned_to).await?.ok_or_else(|| {
            Error::consistency(format!(
                "project {} lists unknown team member {}",
                project.id, spec.assigned_to
            ))
        })?;
        let mut ledger = MembershipLedger::new([assignee]);
        verify_loaded_project(self.store.as_ref(), &ledger, &project).await?;

        let now = self.clock.utc();
        let task = Task::create(spec.clone(), actor.id, now);
        project.append_task(task.id, now);
        ledger.add_assigned_task(&task.assigned_to, &task.id)?;

        let mut changes = ChangeSet::default();
        changes.insert_task(task.clone());
        changes.update_project(project);
        ledger.stage(&mut changes);
        self.store.commit(changes).await?;
        Ok(task)
    }

    async fn status_once(
        &self,
        actor: &Actor,
        task_id: &TaskId,
        status: TaskStatus,
    ) -> Result<Task, AttemptError> {
        let mut task = require_task(self.store.as_ref(), task_id).await?;
        authorize(Some(actor), &Action::UpdateTaskStatus { task: &task })?;
        task.transition(status, self.clock.utc());
        self.save(task).await
    }

    async fn comment_once(
        &self,
        actor: &Actor,
        task_id: &TaskId,
        content: &RequiredText,
    ) -> Result<Task, AttemptError> {
        let mut task = require_task(self.store.as_ref(), task_id).await?;
        let project = self
            .store
            .find_project(&task.project_id)
            .await?
            .ok_or_else(|| {
                Error::consistency(format!(
                    "task {} references missing project {}",
                    task.id, task.project_id
                ))
            })?;
        authorize(
            Some(actor),
            &Action::CommentOnTask {
                task: &task,
                project: &project,
            },
        )?;
        task.append_comment(actor.id, content.clone(), self.clock.utc());
        self.save(task).await
    }

    async fn save(&self, mut task: Task) -> Result<Task, AttemptError> {
        let mut changes = ChangeSet::default();
        changes.update_task(task.clone());
        self.store.commit(changes).await?;
        task.revision = task.revision.next();
        Ok(task)
    }
}

#[async_trait]
impl<S> TaskCommand for TaskEngine<S>
where
    S: TrackerStore,
{
    async fn create_task(&self, actor: &Actor, request: CreateTaskRequest) -> Result<Task, Error> {
        let spec = validate_new_task(&request)?;
        authorize(Some(actor), &Action::AssignTasks)?;

        let task = retry_stale(self.retry, "create_task", || self.create_once(actor, &spec)).await?;
        info!(
            actor = %actor.id,
            task = %task.id,
            project = %task.project_id,
            assignee = %task.assigned_to,
            "task created"
        );
        Ok(task)
    }

    async fn update_status(
        &self,
        actor: &Actor,
        task_id: &TaskId,
        status: &str,
    ) -> Result<Task, Error> {
        let status = parse_status(status)?;
        let task = retry_stale(self.retry, "update_status", || {
            self.status_once(actor, task_id, status)
        })
        .await?;
        info!(actor = %actor.id, task = %task.id, status = %task.status, "task status changed");
        Ok(task)
    }

    async fn add_comment(
        &self,
        actor: &Actor,
        task_id: &TaskId,
        content: &str,
    ) -> Result<Task, Error> {
        let content = parse_comment(content)?;
        let task = retry_stale(self.retry, "add_comment", || {
            self.comment_once(actor, task_id, &content)
        })
        .await?;
        info!(actor = %actor.id, task = %task.id, "comment added");
        Ok(task)
    }
}

#[async_trait]
impl<S> TaskQuery for TaskEngine<S>
where
    S: TrackerStore,
{
    async fn list_by_project(
        &self,
        actor: &Actor,
        project_id: &ProjectId,
    ) -> Result<Vec<Task>, Error> {
        let project = require_project(self.store.as_ref(), project_id).await?;
        authorize(Some(actor), &Action::ReadProject { project: &project })?;
        self.store
            .list_tasks_in_project(&project.id)
            .await
            .map_err(map_store_error)
    }

    async fn list_mine(&self, actor: &Actor) -> Result<Vec<Task>, Error> {
        authorize(Some(actor), &Action::ReadOwnTasks)?;
        self.store
            .list_tasks_assigned_to(&actor.id)
            .await
            .map_err(map_store_error)
    }

    async fn list_all(&self, actor: &Actor) -> Result<Vec<Task>, Error> {
        authorize(Some(actor), &Action::ReadAllTasks)?;
        self.store.list_tasks().await.map_err(map_store_error)
    }
}
