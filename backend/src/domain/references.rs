//! Display summaries for the entities a response points at.
//!
//! Projects, tasks and identities refer to one another by id. Read paths
//! gather every id a response mentions into a [`ReferenceSet`], resolve the
//! whole set with one batch read per entity kind and hand the resulting
//! [`ResolvedReferences`] to the response mapper. Ids that no longer resolve
//! are left out of the result; the mapper falls back to the bare id.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::identifiers::insert_ordered;
use super::ports::{ReferenceLookup, TrackerStore};
use super::service_support::map_store_error;
use super::{
    EmailAddress, Error, Project, ProjectId, RequiredText, Task, TaskId, TaskPriority, TaskStatus,
    User, UserId,
};

/// Name and contact of a referenced identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    /// Display name.
    pub name: RequiredText,
    /// Contact address.
    pub email: EmailAddress,
}

/// Name of a referenced project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRef {
    /// Project name.
    pub name: RequiredText,
}

/// Headline of a referenced task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRef {
    /// Task title.
    pub title: RequiredText,
    /// Current workflow status.
    pub status: TaskStatus,
    /// Task priority.
    pub priority: TaskPriority,
}

/// Ids a response mentions, deduplicated in first-seen order.
///
/// # Examples
/// ```
/// use tracker::domain::{ReferenceSet, UserId};
///
/// let ada = UserId::random();
/// let mut wanted = ReferenceSet::default();
/// wanted.add_user_id(ada);
/// wanted.add_user_id(ada);
/// assert_eq!(wanted.users(), &[ada]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSet {
    users: Vec<UserId>,
    projects: Vec<ProjectId>,
    tasks: Vec<TaskId>,
}

impl ReferenceSet {
    /// Owner, team and tasks of every project in `projects`.
    pub fn for_projects<'a>(projects: impl IntoIterator<Item = &'a Project>) -> Self {
        let mut wanted = Self::default();
        for project in projects {
            wanted.add_project(project);
        }
        wanted
    }

    /// Parent project, assignee, assigner and comment authors of every task.
    pub fn for_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut wanted = Self::default();
        for task in tasks {
            wanted.add_task(task);
        }
        wanted
    }

    /// Projects and assigned tasks of every identity in `users`.
    pub fn for_users<'a>(users: impl IntoIterator<Item = &'a User>) -> Self {
        let mut wanted = Self::default();
        for user in users {
            wanted.add_user(user);
        }
        wanted
    }

    /// Mention an identity.
    pub fn add_user_id(&mut self, id: UserId) {
        insert_ordered(&mut self.users, id);
    }

    /// Mention a project.
    pub fn add_project_id(&mut self, id: ProjectId) {
        insert_ordered(&mut self.projects, id);
    }

    /// Mention a task.
    pub fn add_task_id(&mut self, id: TaskId) {
        insert_ordered(&mut self.tasks, id);
    }

    fn add_project(&mut self, project: &Project) {
        self.add_user_id(project.owner_id);
        for member in &project.team_member_ids {
            self.add_user_id(*member);
        }
        for task in &project.task_ids {
            self.add_task_id(*task);
        }
    }

    fn add_task(&mut self, task: &Task) {
        self.add_project_id(task.project_id);
        self.add_user_id(task.assigned_to);
        self.add_user_id(task.assigned_by);
        for comment in &task.comments {
            self.add_user_id(comment.author_id);
        }
    }

    fn add_user(&mut self, user: &User) {
        for project in &user.project_ids {
            self.add_project_id(*project);
        }
        for task in &user.assigned_task_ids {
            self.add_task_id(*task);
        }
    }

    /// Mentioned identities.
    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    /// Mentioned projects.
    pub fn projects(&self) -> &[ProjectId] {
        &self.projects
    }

    /// Mentioned tasks.
    pub fn tasks(&self) -> &[TaskId] {
        &self.tasks
    }

    /// Total number of ids across every kind.
    pub fn len(&self) -> usize {
        self.users.len() + self.projects.len() + self.tasks.len()
    }

    /// Whether nothing is mentioned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Summaries keyed by id, ready for response mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedReferences {
    users: HashMap<UserId, UserRef>,
    projects: HashMap<ProjectId, ProjectRef>,
    tasks: HashMap<TaskId, TaskRef>,
}

impl ResolvedReferences {
    /// Add summaries of `users`.
    #[must_use]
    pub fn with_users<'a>(mut self, users: impl IntoIterator<Item = &'a User>) -> Self {
        self.users.extend(users.into_iter().map(|user| {
            (
                user.id,
                UserRef {
                    name: user.name.clone(),
                    email: user.email.clone(),
                },
            )
        }));
        self
    }

    /// Add summaries of `projects`.
    #[must_use]
    pub fn with_projects<'a>(mut self, projects: impl IntoIterator<Item = &'a Project>) -> Self {
        self.projects.extend(projects.into_iter().map(|project| {
            (
                project.id,
                ProjectRef {
                    name: project.name.clone(),
                },
            )
        }));
        self
    }

    /// Add summaries of `tasks`.
    #[must_use]
    pub fn with_tasks<'a>(mut self, tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        self.tasks.extend(tasks.into_iter().map(|task| {
            (
                task.id,
                TaskRef {
                    title: task.title.clone(),
                    status: task.status,
                    priority: task.priority,
                },
            )
        }));
        self
    }

    /// Summary of identity `id`, if it resolved.
    pub fn user(&self, id: &UserId) -> Option<&UserRef> {
        self.users.get(id)
    }

    /// Summary of project `id`, if it resolved.
    pub fn project(&self, id: &ProjectId) -> Option<&ProjectRef> {
        self.projects.get(id)
    }

    /// Summary of task `id`, if it resolved.
    pub fn task(&self, id: &TaskId) -> Option<&TaskRef> {
        self.tasks.get(id)
    }

    /// Number of resolved summaries across every kind.
    pub fn len(&self) -> usize {
        self.users.len() + self.projects.len() + self.tasks.len()
    }

    /// Whether nothing resolved.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolves reference sets against the tracker store.
#[derive(Clone)]
pub struct ReferenceResolver<S> {
    store: Arc<S>,
}

impl<S> ReferenceResolver<S> {
    /// Create a resolver over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S> ReferenceLookup for ReferenceResolver<S>
where
    S: TrackerStore,
{
    async fn resolve(&self, wanted: &ReferenceSet) -> Result<ResolvedReferences, Error> {
        if wanted.is_empty() {
            return Ok(ResolvedReferences::default());
        }
        let users = if wanted.users().is_empty() {
            Vec::new()
        } else {
            self.store
                .find_users(wanted.users())
                .await
                .map_err(map_store_error)?
        };
        let projects = if wanted.projects().is_empty() {
            Vec::new()
        } else {
            self.store
                .find_projects(wanted.projects())
                .await
                .map_err(map_store_error)?
        };
        let tasks = if wanted.tasks().is_empty() {
            Vec::new()
        } else {
            self.store
                .find_tasks(wanted.tasks())
                .await
                .map_err(map_store_error)?
        };

        let resolved = ResolvedReferences::default()
            .with_users(&users)
            .with_projects(&projects)
            .with_tasks(&tasks);
        if resolved.len() < wanted.len() {
            warn!(
                wanted = wanted.len(),
                resolved = resolved.len(),
                "response refers to entities that no longer exist"
            );
        }
        Ok(resolved)
    }
}
