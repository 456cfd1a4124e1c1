//! Driven port for persisting identities, projects and tasks.
//!
//! Reads are plain lookups. Every write goes through [`TrackerStore::commit`],
//! which applies a [`ChangeSet`] all-or-nothing: either every insert and
//! revision-checked update lands, or none do. This is what keeps a project's
//! authoritative sets and the identities' back-references from drifting when
//! a multi-entity mutation fails part way.

use async_trait::async_trait;

use crate::domain::{EmailAddress, Project, ProjectId, Revision, Role, Task, TaskId, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by tracker store adapters.
    pub enum TrackerStoreError {
        /// The backing store could not be reached.
        Connection { message: String } => "tracker store connection failed: {message}",
        /// A query or mutation failed during execution.
        Query { message: String } => "tracker store query failed: {message}",
        /// An update expected a revision the store no longer holds.
        RevisionMismatch { entity: String, id: String } =>
            "{entity} {id} was modified concurrently",
        /// An update targeted an entity that does not exist.
        MissingEntity { entity: String, id: String } => "{entity} {id} does not exist",
        /// Another identity already uses the email address.
        DuplicateEmail { email: String } => "email {email} is already registered",
    }
}

/// One staged write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    /// Insert a new identity.
    InsertUser(User),
    /// Replace an identity whose stored revision equals `user.revision`.
    UpdateUser(User),
    /// Insert a new project.
    InsertProject(Project),
    /// Replace a project whose stored revision equals `project.revision`.
    UpdateProject(Project),
    /// Insert a new task.
    InsertTask(Task),
    /// Replace a task whose stored revision equals `task.revision`.
    UpdateTask(Task),
}

impl Write {
    /// Entity kind and identifier, used for de-duplication and errors.
    pub fn key(&self) -> (&'static str, uuid::Uuid) {
        match self {
            Self::InsertUser(u) | Self::UpdateUser(u) => ("user", *u.id.as_uuid()),
            Self::InsertProject(p) | Self::UpdateProject(p) => ("project", *p.id.as_uuid()),
            Self::InsertTask(t) | Self::UpdateTask(t) => ("task", *t.id.as_uuid()),
        }
    }

    /// Revision the entity carries once the write is applied.
    pub fn stored_revision(&self) -> Revision {
        match self {
            Self::InsertUser(u) => u.revision,
            Self::InsertProject(p) => p.revision,
            Self::InsertTask(t) => t.revision,
            Self::UpdateUser(u) => u.revision.next(),
            Self::UpdateProject(p) => p.revision.next(),
            Self::UpdateTask(t) => t.revision.next(),
        }
    }
}

/// Ordered batch of writes committed as one unit.
///
/// Updates carry the revision the entity was read at; the store bumps it on
/// commit. Staging a second write for the same entity replaces the first so
/// a batch never checks one revision twice.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use tracker::domain::ports::ChangeSet;
/// use tracker::domain::{Project, RequiredText, UserId};
///
/// let project = Project::create(
///     RequiredText::new("Alpha").unwrap(),
///     RequiredText::new("d").unwrap(),
///     UserId::random(),
///     [],
///     Utc::now(),
/// );
/// let mut changes = ChangeSet::default();
/// changes.insert_project(project.clone());
/// changes.insert_project(project);
/// assert_eq!(changes.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    writes: Vec<Write>,
}

impl ChangeSet {
    /// Stage a new identity.
    pub fn insert_user(&mut self, user: User) {
        self.stage(Write::InsertUser(user));
    }

    /// Stage an update to an identity read at `user.revision`.
    pub fn update_user(&mut self, user: User) {
        self.stage(Write::UpdateUser(user));
    }

    /// Stage a new project.
    pub fn insert_project(&mut self, project: Project) {
        self.stage(Write::InsertProject(project));
    }

    /// Stage an update to a project read at `project.revision`.
    pub fn update_project(&mut self, project: Project) {
        self.stage(Write::UpdateProject(project));
    }

    /// Stage a new task.
    pub fn insert_task(&mut self, task: Task) {
        self.stage(Write::InsertTask(task));
    }

    /// Stage an update to a task read at `task.revision`.
    pub fn update_task(&mut self, task: Task) {
        self.stage(Write::UpdateTask(task));
    }

    /// Staged writes in order.
    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    /// Consume the batch.
    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }

    /// Number of staged writes.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    fn stage(&mut self, write: Write) {
        let key = write.key();
        if let Some(existing) = self.writes.iter_mut().find(|w| w.key() == key) {
            *existing = write;
        } else {
            self.writes.push(write);
        }
    }
}

/// Persistence port for the tracker aggregate.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackerStore: Send + Sync {
    /// Fetch an identity by id.
    async fn find_user(&self, id: &UserId) -> Result<Option<User>, TrackerStoreError>;

    /// Fetch an identity by normalised email.
    async fn find_user_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, TrackerStoreError>;

    /// Fetch the identities among `ids` that exist, in no particular order.
    async fn find_users(&self, ids: &[UserId]) -> Result<Vec<User>, TrackerStoreError>;

    /// Every identity, optionally restricted to one role.
    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, TrackerStoreError>;

    /// Fetch a project by id.
    async fn find_project(&self, id: &ProjectId) -> Result<Option<Project>, TrackerStoreError>;

    /// Fetch the projects among `ids` that exist, in no particular order.
    async fn find_projects(&self, ids: &[ProjectId]) -> Result<Vec<Project>, TrackerStoreError>;

    /// Every project, ordered by creation time.
    async fn list_projects(&self) -> Result<Vec<Project>, TrackerStoreError>;

    /// Projects owned by `owner`, ordered by creation time.
    async fn list_projects_owned_by(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Project>, TrackerStoreError>;

    /// Projects whose team includes `member`, ordered by creation time.
    async fn list_projects_with_member(
        &self,
        member: &UserId,
    ) -> Result<Vec<Project>, TrackerStoreError>;

    /// Fetch a task by id.
    async fn find_task(&self, id: &TaskId) -> Result<Option<Task>, TrackerStoreError>;

    /// Fetch the tasks among `ids` that exist, in no particular order.
    async fn find_tasks(&self, ids: &[TaskId]) -> Result<Vec<Task>, TrackerStoreError>;

    /// Every task, ordered by creation time.
    async fn list_tasks(&self) -> Result<Vec<Task>, TrackerStoreError>;

    /// Tasks of one project, ordered by creation time.
    async fn list_tasks_in_project(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<Task>, TrackerStoreError>;

    /// Tasks assigned to `assignee`, ordered by creation time.
    async fn list_tasks_assigned_to(
        &self,
        assignee: &UserId,
    ) -> Result<Vec<Task>, TrackerStoreError>;

    /// Apply every write in `changes` atomically.
    ///
    /// Fails with `RevisionMismatch` if any update is stale, `DuplicateEmail`
    /// if an identity write collides on email and `MissingEntity` if an
    /// update targets an entity that does not exist. Nothing is applied on
    /// failure.
    async fn commit(&self, changes: ChangeSet) -> Result<(), TrackerStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PasswordHash, RequiredText};
    use rstest::rstest;

    fn user() -> User {
        User::register(
            RequiredText::new("Ada").expect("name"),
            EmailAddress::new("ada@example.com").expect("email"),
            PasswordHash::new("digest"),
            Role::Member,
        )
    }

    #[rstest]
    fn restaging_an_entity_replaces_the_earlier_write() {
        let mut changes = ChangeSet::default();
        let mut first = user();
        changes.update_user(first.clone());
        first.name = RequiredText::new("Ada L").expect("name");
        changes.update_user(first.clone());

        assert_eq!(changes.len(), 1);
        assert_eq!(changes.writes(), &[Write::UpdateUser(first)]);
    }

    #[rstest]
    fn distinct_entities_keep_staging_order() {
        let mut changes = ChangeSet::default();
        let a = user();
        let b = user();
        changes.update_user(a.clone());
        changes.insert_user(b.clone());

        assert_eq!(changes.into_writes(), vec![Write::UpdateUser(a), Write::InsertUser(b)]);
    }

    #[rstest]
    fn updates_report_the_bumped_revision() {
        let user = user();
        let revision = user.revision;
        assert_eq!(Write::UpdateUser(user.clone()).stored_revision(), revision.next());
        assert_eq!(Write::InsertUser(user).stored_revision(), revision);
    }

    #[rstest]
    fn revision_mismatch_names_the_entity() {
        let err = TrackerStoreError::revision_mismatch("project", "p-1");
        assert_eq!(err.to_string(), "project p-1 was modified concurrently");
    }
}
