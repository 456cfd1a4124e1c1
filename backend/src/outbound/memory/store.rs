//! In-process `TrackerStore`.
//!
//! All tables sit behind one `RwLock`. A commit applies its writes to a copy
//! of the tables and swaps the copy in only when every write succeeded, so a
//! failed batch leaves nothing behind.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::ports::{ChangeSet, TrackerStore, TrackerStoreError, Write};
use crate::domain::{
    EmailAddress, Project, ProjectId, Revision, Role, Task, TaskId, User, UserId,
};

/// Insertion-ordered table keyed by entity id.
#[derive(Debug, Clone)]
struct Table<K, V> {
    rows: HashMap<K, V>,
    order: Vec<K>,
}

impl<K, V> Default for Table<K, V> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<K: Copy + Eq + Hash, V: Clone> Table<K, V> {
    fn get(&self, id: &K) -> Option<&V> {
        self.rows.get(id)
    }

    fn contains(&self, id: &K) -> bool {
        self.rows.contains_key(id)
    }

    fn values(&self) -> impl Iterator<Item = &V> {
        self.order.iter().filter_map(|id| self.rows.get(id))
    }

    fn collect_where(&self, keep: impl Fn(&V) -> bool) -> Vec<V> {
        self.values().filter(|v| keep(v)).cloned().collect()
    }

    fn insert(&mut self, id: K, value: V) {
        if self.rows.insert(id, value).is_none() {
            self.order.push(id);
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    users: Table<UserId, User>,
    projects: Table<ProjectId, Project>,
    tasks: Table<TaskId, Task>,
}

fn check_revision(
    entity: &str,
    id: &dyn fmt::Display,
    stored: Option<Revision>,
    expected: Revision,
) -> Result<(), TrackerStoreError> {
    match stored {
        None => Err(TrackerStoreError::missing_entity(entity, id.to_string())),
        Some(stored) if stored != expected => {
            Err(TrackerStoreError::revision_mismatch(entity, id.to_string()))
        }
        Some(_) => Ok(()),
    }
}

impl Tables {
    fn email_taken(&self, email: &EmailAddress, by_other_than: &UserId) -> bool {
        self.users
            .values()
            .any(|u| u.email == *email && u.id != *by_other_than)
    }

    fn apply(&mut self, write: Write) -> Result<(), TrackerStoreError> {
        match write {
            Write::InsertUser(user) => {
                if self.users.contains(&user.id) {
                    return Err(TrackerStoreError::query(format!(
                        "user {} already exists",
                        user.id
                    )));
                }
                if self.email_taken(&user.email, &user.id) {
                    return Err(TrackerStoreError::duplicate_email(user.email.as_str()));
                }
                self.users.insert(user.id, user);
            }
            Write::UpdateUser(mut user) => {
                let stored = self.users.get(&user.id).map(|u| u.revision);
                check_revision("user", &user.id, stored, user.revision)?;
                if self.email_taken(&user.email, &user.id) {
                    return Err(TrackerStoreError::duplicate_email(user.email.as_str()));
                }
                user.revision = user.revision.next();
                self.users.insert(user.id, user);
            }
            Write::InsertProject(project) => {
                if self.projects.contains(&project.id) {
                    return Err(TrackerStoreError::query(format!(
                        "project {} already exists",
                        project.id
                    )));
                }
                self.projects.insert(project.id, project);
            }
            Write::UpdateProject(mut project) => {
                let stored = self.projects.get(&project.id).map(|p| p.revision);
                check_revision("project", &project.id, stored, project.revision)?;
                project.revision = project.revision.next();
                self.projects.insert(project.id, project);
            }
            Write::InsertTask(task) => {
                if self.tasks.contains(&task.id) {
                    return Err(TrackerStoreError::query(format!(
                        "task {} already exists",
                        task.id
                    )));
                }
                self.tasks.insert(task.id, task);
            }
            Write::UpdateTask(mut task) => {
                let stored = self.tasks.get(&task.id).map(|t| t.revision);
                check_revision("task", &task.id, stored, task.revision)?;
                task.revision = task.revision.next();
                self.tasks.insert(task.id, task);
            }
        }
        Ok(())
    }
}

/// `TrackerStore` held entirely in process memory.
///
/// # Examples
/// ```
/// use tracker::domain::ports::TrackerStore;
/// use tracker::outbound::memory::InMemoryTrackerStore;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let store = InMemoryTrackerStore::new();
/// assert!(store.list_projects().await.unwrap().is_empty());
/// # });
/// ```
#[derive(Debug, Default)]
pub struct InMemoryTrackerStore {
    tables: RwLock<Tables>,
}

impl InMemoryTrackerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TrackerStore for InMemoryTrackerStore {
    async fn find_user(&self, id: &UserId) -> Result<Option<User>, TrackerStoreError> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn find_user_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, TrackerStoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == *email).cloned())
    }

    async fn find_users(&self, ids: &[UserId]) -> Result<Vec<User>, TrackerStoreError> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect())
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, TrackerStoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .collect_where(|u| role.is_none_or(|role| u.role == role)))
    }

    async fn find_project(&self, id: &ProjectId) -> Result<Option<Project>, TrackerStoreError> {
        Ok(self.tables.read().await.projects.get(id).cloned())
    }

    async fn find_projects(&self, ids: &[ProjectId]) -> Result<Vec<Project>, TrackerStoreError> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.projects.get(id).cloned())
            .collect())
    }

    async fn list_projects(&self) -> Result<Vec<Project>, TrackerStoreError> {
        Ok(self.tables.read().await.projects.collect_where(|_| true))
    }

    async fn list_projects_owned_by(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Project>, TrackerStoreError> {
        let tables = self.tables.read().await;
        Ok(tables.projects.collect_where(|p| p.is_owned_by(owner)))
    }

    async fn list_projects_with_member(
        &self,
        member: &UserId,
    ) -> Result<Vec<Project>, TrackerStoreError> {
        let tables = self.tables.read().await;
        Ok(tables.projects.collect_where(|p| p.has_member(member)))
    }

    async fn find_task(&self, id: &TaskId) -> Result<Option<Task>, TrackerStoreError> {
        Ok(self.tables.read().await.tasks.get(id).cloned())
    }

    async fn find_tasks(&self, ids: &[TaskId]) -> Result<Vec<Task>, TrackerStoreError> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.tasks.get(id).cloned())
            .collect())
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, TrackerStoreError> {
        Ok(self.tables.read().await.tasks.collect_where(|_| true))
    }

    async fn list_tasks_in_project(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<Task>, TrackerStoreError> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.collect_where(|t| t.project_id == *project))
    }

    async fn list_tasks_assigned_to(
        &self,
        assignee: &UserId,
    ) -> Result<Vec<Task>, TrackerStoreError> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.collect_where(|t| t.assigned_to == *assignee))
    }

    async fn commit(&self, changes: ChangeSet) -> Result<(), TrackerStoreError> {
        let mut tables = self.tables.write().await;
        let mut staged = tables.clone();
        let count = changes.len();
        for write in changes.into_writes() {
            staged.apply(write)?;
        }
        *tables = staged;
        debug!(writes = count, "memory store commit applied");
        Ok(())
    }
}
