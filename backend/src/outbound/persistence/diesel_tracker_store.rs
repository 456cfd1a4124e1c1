//! PostgreSQL-backed `TrackerStore` implementation using Diesel ORM.
//!
//! A [`ChangeSet`] is applied inside one SQL transaction. Updates are guarded
//! by `WHERE revision = expected`; a guard that matches no row rolls the
//! whole transaction back and is reported as a revision mismatch or a
//! missing entity.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{ChangeSet, TrackerStore, TrackerStoreError, Write};
use crate::domain::{
    Comment, CommentId, EmailAddress, PasswordHash, Project, ProjectId, RequiredText, Revision,
    Role, Task, TaskId, User, UserId,
};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{
    CommentRow, NewCommentRow, ProjectRow, ProjectWrite, TaskRow, TaskWrite, UserRow, UserWrite,
};
use super::pool::DbPool;
use super::schema::{projects, task_comments, tasks, users};

const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Diesel-backed implementation of the `TrackerStore` port.
#[derive(Clone)]
pub struct DieselTrackerStore {
    pool: DbPool,
}

impl DieselTrackerStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn corrupt(entity: &str, id: Uuid, what: &str) -> TrackerStoreError {
    TrackerStoreError::query(format!("stored {entity} {id} has {what}"))
}

fn revision_from_db(entity: &str, id: Uuid, value: i64) -> Result<Revision, TrackerStoreError> {
    u64::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .map(Revision::new)
        .ok_or_else(|| corrupt(entity, id, "an invalid revision"))
}

fn revision_for_db(revision: Revision) -> Result<i64, TrackerStoreError> {
    i64::try_from(revision.get()).map_err(|_| TrackerStoreError::query("revision overflow"))
}

fn text_from_db(
    entity: &str,
    id: Uuid,
    field: &str,
    raw: String,
) -> Result<RequiredText, TrackerStoreError> {
    RequiredText::try_from(raw).map_err(|_| corrupt(entity, id, &format!("an empty {field}")))
}

fn parsed_from_db<T: std::str::FromStr>(
    entity: &str,
    id: Uuid,
    field: &str,
    raw: &str,
) -> Result<T, TrackerStoreError> {
    raw.parse()
        .map_err(|_| corrupt(entity, id, &format!("an unrecognised {field} `{raw}`")))
}

fn row_to_user(row: UserRow) -> Result<User, TrackerStoreError> {
    let id = row.id;
    Ok(User {
        id: UserId::from_uuid(id),
        name: text_from_db("user", id, "name", row.name)?,
        email: EmailAddress::new(&row.email).map_err(|_| corrupt("user", id, "an invalid email"))?,
        password_hash: PasswordHash::new(row.password_hash),
        role: parsed_from_db::<Role>("user", id, "role", &row.role)?,
        project_ids: row.project_ids.into_iter().map(ProjectId::from_uuid).collect(),
        assigned_task_ids: row
            .assigned_task_ids
            .into_iter()
            .map(TaskId::from_uuid)
            .collect(),
        revision: revision_from_db("user", id, row.revision)?,
    })
}

fn row_to_project(row: ProjectRow) -> Result<Project, TrackerStoreError> {
    let id = row.id;
    Ok(Project {
        id: ProjectId::from_uuid(id),
        name: text_from_db("project", id, "name", row.name)?,
        description: text_from_db("project", id, "description", row.description)?,
        owner_id: UserId::from_uuid(row.owner_id),
        team_member_ids: row.team_member_ids.into_iter().map(UserId::from_uuid).collect(),
        task_ids: row.task_ids.into_iter().map(TaskId::from_uuid).collect(),
        status: parsed_from_db("project", id, "status", &row.status)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
        revision: revision_from_db("project", id, row.revision)?,
    })
}

fn row_to_comment(row: CommentRow) -> Result<Comment, TrackerStoreError> {
    Ok(Comment {
        id: CommentId::from_uuid(row.id),
        author_id: UserId::from_uuid(row.author_id),
        content: text_from_db("comment", row.id, "content", row.content)?,
        created_at: row.created_at,
    })
}

fn row_to_task(row: TaskRow, comments: Vec<Comment>) -> Result<Task, TrackerStoreError> {
    let id = row.id;
    Ok(Task {
        id: TaskId::from_uuid(id),
        title: text_from_db("task", id, "title", row.title)?,
        description: text_from_db("task", id, "description", row.description)?,
        project_id: ProjectId::from_uuid(row.project_id),
        assigned_to: UserId::from_uuid(row.assigned_to),
        assigned_by: UserId::from_uuid(row.assigned_by),
        task_type: parsed_from_db("task", id, "type", &row.task_type)?,
        priority: parsed_from_db("task", id, "priority", &row.priority)?,
        status: parsed_from_db("task", id, "status", &row.status)?,
        due_date: row.due_date,
        comments,
        created_at: row.created_at,
        updated_at: row.updated_at,
        revision: revision_from_db("task", id, row.revision)?,
    })
}

fn uuids<T>(ids: &[T], as_uuid: impl Fn(&T) -> Uuid) -> Vec<Uuid> {
    ids.iter().map(as_uuid).collect()
}

fn user_write(user: &User, revision: Revision) -> Result<UserWrite<'_>, TrackerStoreError> {
    Ok(UserWrite {
        id: *user.id.as_uuid(),
        name: user.name.as_str(),
        email: user.email.as_str(),
        password_hash: user.password_hash.expose(),
        role: user.role.as_str(),
        project_ids: uuids(&user.project_ids, |id| *id.as_uuid()),
        assigned_task_ids: uuids(&user.assigned_task_ids, |id| *id.as_uuid()),
        revision: revision_for_db(revision)?,
    })
}

fn project_write(
    project: &Project,
    revision: Revision,
) -> Result<ProjectWrite<'_>, TrackerStoreError> {
    Ok(ProjectWrite {
        id: *project.id.as_uuid(),
        name: project.name.as_str(),
        description: project.description.as_str(),
        owner_id: *project.owner_id.as_uuid(),
        team_member_ids: uuids(&project.team_member_ids, |id| *id.as_uuid()),
        task_ids: uuids(&project.task_ids, |id| *id.as_uuid()),
        status: project.status.as_str(),
        created_at: project.created_at,
        updated_at: project.updated_at,
        revision: revision_for_db(revision)?,
    })
}

fn task_write(task: &Task, revision: Revision) -> Result<TaskWrite<'_>, TrackerStoreError> {
    Ok(TaskWrite {
        id: *task.id.as_uuid(),
        title: task.title.as_str(),
        description: task.description.as_str(),
        project_id: *task.project_id.as_uuid(),
        assigned_to: *task.assigned_to.as_uuid(),
        assigned_by: *task.assigned_by.as_uuid(),
        task_type: task.task_type.as_str(),
        priority: task.priority.as_str(),
        status: task.status.as_str(),
        due_date: task.due_date,
        created_at: task.created_at,
        updated_at: task.updated_at,
        revision: revision_for_db(revision)?,
    })
}

fn comment_rows(task: &Task) -> Result<Vec<NewCommentRow<'_>>, TrackerStoreError> {
    task.comments
        .iter()
        .enumerate()
        .map(|(position, comment)| {
            Ok(NewCommentRow {
                id: *comment.id.as_uuid(),
                task_id: *task.id.as_uuid(),
                position: i32::try_from(position)
                    .map_err(|_| TrackerStoreError::query("comment thread too long"))?,
                author_id: *comment.author_id.as_uuid(),
                content: comment.content.as_str(),
                created_at: comment.created_at,
            })
        })
        .collect()
}

/// Failure inside the commit transaction.
///
/// Diesel needs the transaction error to absorb its own error type; domain
/// failures ride along in `Store` so the rollback reason is preserved.
#[derive(Debug)]
enum CommitFailure {
    Store(TrackerStoreError),
    Diesel(DieselError),
}

impl From<DieselError> for CommitFailure {
    fn from(value: DieselError) -> Self {
        Self::Diesel(value)
    }
}

impl From<TrackerStoreError> for CommitFailure {
    fn from(value: TrackerStoreError) -> Self {
        Self::Store(value)
    }
}

impl From<CommitFailure> for TrackerStoreError {
    fn from(value: CommitFailure) -> Self {
        match value {
            CommitFailure::Store(err) => err,
            CommitFailure::Diesel(err) => map_diesel_error(err),
        }
    }
}

fn email_violation(error: DieselError, email: &EmailAddress) -> CommitFailure {
    let duplicate = matches!(
        &error,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
            if info.constraint_name() == Some(EMAIL_CONSTRAINT)
    );
    if duplicate {
        CommitFailure::Store(TrackerStoreError::duplicate_email(email.as_str()))
    } else {
        CommitFailure::Diesel(error)
    }
}

/// Explain why a revision-guarded update matched no row.
async fn stale_or_missing(
    conn: &mut AsyncPgConnection,
    entity: &str,
    id: Uuid,
) -> Result<CommitFailure, DieselError> {
    let exists = match entity {
        "user" => diesel::select(diesel::dsl::exists(users::table.find(id)))
            .get_result::<bool>(conn)
            .await?,
        "project" => diesel::select(diesel::dsl::exists(projects::table.find(id)))
            .get_result::<bool>(conn)
            .await?,
        _ => diesel::select(diesel::dsl::exists(tasks::table.find(id)))
            .get_result::<bool>(conn)
            .await?,
    };
    let id = id.to_string();
    Ok(CommitFailure::Store(if exists {
        TrackerStoreError::revision_mismatch(entity, id)
    } else {
        TrackerStoreError::missing_entity(entity, id)
    }))
}

async fn apply(conn: &mut AsyncPgConnection, write: &Write) -> Result<(), CommitFailure> {
    match write {
        Write::InsertUser(user) => {
            let row = user_write(user, user.revision)?;
            diesel::insert_into(users::table)
                .values(&row)
                .execute(conn)
                .await
                .map_err(|err| email_violation(err, &user.email))?;
        }
        Write::UpdateUser(user) => {
            let id = *user.id.as_uuid();
            let row = user_write(user, user.revision.next())?;
            let updated = diesel::update(
                users::table
                    .find(id)
                    .filter(users::revision.eq(revision_for_db(user.revision)?)),
            )
            .set(&row)
            .execute(conn)
            .await
            .map_err(|err| email_violation(err, &user.email))?;
            if updated == 0 {
                return Err(stale_or_missing(conn, "user", id).await?);
            }
        }
        Write::InsertProject(project) => {
            let row = project_write(project, project.revision)?;
            diesel::insert_into(projects::table)
                .values(&row)
                .execute(conn)
                .await?;
        }
        Write::UpdateProject(project) => {
            let id = *project.id.as_uuid();
            let row = project_write(project, project.revision.next())?;
            let updated = diesel::update(
                projects::table
                    .find(id)
                    .filter(projects::revision.eq(revision_for_db(project.revision)?)),
            )
            .set(&row)
            .execute(conn)
            .await?;
            if updated == 0 {
                return Err(stale_or_missing(conn, "project", id).await?);
            }
        }
        Write::InsertTask(task) => {
            let row = task_write(task, task.revision)?;
            diesel::insert_into(tasks::table)
                .values(&row)
                .execute(conn)
                .await?;
            insert_comments(conn, task).await?;
        }
        Write::UpdateTask(task) => {
            let id = *task.id.as_uuid();
            let row = task_write(task, task.revision.next())?;
            let updated = diesel::update(
                tasks::table
                    .find(id)
                    .filter(tasks::revision.eq(revision_for_db(task.revision)?)),
            )
            .set(&row)
            .execute(conn)
            .await?;
            if updated == 0 {
                return Err(stale_or_missing(conn, "task", id).await?);
            }
            insert_comments(conn, task).await?;
        }
    }
    Ok(())
}

/// Comments are append-only, so rows already stored are left untouched.
async fn insert_comments(conn: &mut AsyncPgConnection, task: &Task) -> Result<(), CommitFailure> {
    let rows = comment_rows(task)?;
    if rows.is_empty() {
        return Ok(());
    }
    diesel::insert_into(task_comments::table)
        .values(&rows)
        .on_conflict(task_comments::id)
        .do_nothing()
        .execute(conn)
        .await?;
    Ok(())
}

impl DieselTrackerStore {
    async fn load_tasks(
        conn: &mut AsyncPgConnection,
        rows: Vec<TaskRow>,
    ) -> Result<Vec<Task>, TrackerStoreError> {
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let comment_rows: Vec<CommentRow> = task_comments::table
            .filter(task_comments::task_id.eq_any(ids))
            .order((task_comments::task_id, task_comments::position))
            .select(CommentRow::as_select())
            .load(conn)
            .await
            .map_err(map_diesel_error)?;

        let mut threads: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        for row in comment_rows {
            let task_id = row.task_id;
            threads.entry(task_id).or_default().push(row_to_comment(row)?);
        }
        rows.into_iter()
            .map(|row| {
                let comments = threads.remove(&row.id).unwrap_or_default();
                row_to_task(row, comments)
            })
            .collect()
    }

    async fn tasks_where<F>(&self, filter: F) -> Result<Vec<Task>, TrackerStoreError>
    where
        F: FnOnce(tasks::BoxedQuery<'static, diesel::pg::Pg>) -> tasks::BoxedQuery<'static, diesel::pg::Pg>
            + Send,
    {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<TaskRow> = filter(tasks::table.into_boxed())
            .order((tasks::created_at, tasks::id))
            .select(TaskRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Self::load_tasks(&mut conn, rows).await
    }

    async fn projects_where<F>(&self, filter: F) -> Result<Vec<Project>, TrackerStoreError>
    where
        F: FnOnce(
                projects::BoxedQuery<'static, diesel::pg::Pg>,
            ) -> projects::BoxedQuery<'static, diesel::pg::Pg>
            + Send,
    {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ProjectRow> = filter(projects::table.into_boxed())
            .order((projects::created_at, projects::id))
            .select(ProjectRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_project).collect()
    }
}

#[async_trait]
impl TrackerStore for DieselTrackerStore {
    async fn find_user(&self, id: &UserId) -> Result<Option<User>, TrackerStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .find(*id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_user).transpose()
    }

    async fn find_user_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, TrackerStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_str()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_user).transpose()
    }

    async fn find_users(&self, ids: &[UserId]) -> Result<Vec<User>, TrackerStoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .filter(users::id.eq_any(uuids(ids, |id| *id.as_uuid())))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_user).collect()
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, TrackerStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = users::table.into_boxed();
        if let Some(role) = role {
            query = query.filter(users::role.eq(role.as_str()));
        }
        let rows: Vec<UserRow> = query
            .order((users::created_at, users::id))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_user).collect()
    }

    async fn find_project(&self, id: &ProjectId) -> Result<Option<Project>, TrackerStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ProjectRow> = projects::table
            .find(*id.as_uuid())
            .select(ProjectRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_project).transpose()
    }

    async fn find_projects(&self, ids: &[ProjectId]) -> Result<Vec<Project>, TrackerStoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = uuids(ids, |id| *id.as_uuid());
        self.projects_where(move |query| query.filter(projects::id.eq_any(ids)))
            .await
    }

    async fn list_projects(&self) -> Result<Vec<Project>, TrackerStoreError> {
        self.projects_where(|query| query).await
    }

    async fn list_projects_owned_by(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Project>, TrackerStoreError> {
        let owner = *owner.as_uuid();
        self.projects_where(move |query| query.filter(projects::owner_id.eq(owner)))
            .await
    }

    async fn list_projects_with_member(
        &self,
        member: &UserId,
    ) -> Result<Vec<Project>, TrackerStoreError> {
        let member = vec![*member.as_uuid()];
        self.projects_where(move |query| query.filter(projects::team_member_ids.contains(member)))
            .await
    }

    async fn find_task(&self, id: &TaskId) -> Result<Option<Task>, TrackerStoreError> {
        let id = *id.as_uuid();
        let mut found = self
            .tasks_where(move |query| query.filter(tasks::id.eq(id)))
            .await?;
        Ok(found.pop())
    }

    async fn find_tasks(&self, ids: &[TaskId]) -> Result<Vec<Task>, TrackerStoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = uuids(ids, |id| *id.as_uuid());
        self.tasks_where(move |query| query.filter(tasks::id.eq_any(ids)))
            .await
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, TrackerStoreError> {
        self.tasks_where(|query| query).await
    }

    async fn list_tasks_in_project(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<Task>, TrackerStoreError> {
        let project = *project.as_uuid();
        self.tasks_where(move |query| query.filter(tasks::project_id.eq(project)))
            .await
    }

    async fn list_tasks_assigned_to(
        &self,
        assignee: &UserId,
    ) -> Result<Vec<Task>, TrackerStoreError> {
        let assignee = *assignee.as_uuid();
        self.tasks_where(move |query| query.filter(tasks::assigned_to.eq(assignee)))
            .await
    }

    async fn commit(&self, changes: ChangeSet) -> Result<(), TrackerStoreError> {
        if changes.is_empty() {
            return Ok(());
        }
        let count = changes.len();
        let writes = changes.into_writes();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<_, CommitFailure, _>(|conn| {
            async move {
                for write in &writes {
                    apply(conn, write).await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await?;
        debug!(writes = count, "tracker store commit applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Mapping coverage; database round trips are exercised against a live
    //! PostgreSQL instance outside the unit suite.
    use super::*;
    use crate::test_support::{admin, fixed_now, member, project, task};
    use rstest::rstest;

    #[rstest]
    fn commit_failures_keep_the_store_reason() {
        let err: TrackerStoreError =
            CommitFailure::Store(TrackerStoreError::revision_mismatch("project", "p")).into();
        assert!(matches!(err, TrackerStoreError::RevisionMismatch { .. }));

        let err: TrackerStoreError = CommitFailure::Diesel(DieselError::NotFound).into();
        assert!(matches!(err, TrackerStoreError::Query { .. }));
    }

    #[rstest]
    fn non_positive_revisions_are_corrupt() {
        assert!(revision_from_db("user", Uuid::nil(), 0).is_err());
        assert!(revision_from_db("user", Uuid::nil(), -3).is_err());
        assert_eq!(
            revision_from_db("user", Uuid::nil(), 4).expect("valid"),
            Revision::new(4)
        );
    }

    #[rstest]
    fn users_survive_the_row_mapping() {
        let mut user = member("Uma");
        user.project_ids.push(ProjectId::random());
        let write = user_write(&user, user.revision).expect("write");
        let row = UserRow {
            id: write.id,
            name: write.name.to_owned(),
            email: write.email.to_owned(),
            password_hash: write.password_hash.to_owned(),
            role: write.role.to_owned(),
            project_ids: write.project_ids.clone(),
            assigned_task_ids: write.assigned_task_ids.clone(),
            revision: write.revision,
        };
        assert_eq!(row_to_user(row).expect("user"), user);
    }

    #[rstest]
    fn tasks_survive_the_row_mapping() {
        let owner = admin("Alice");
        let uma = member("Uma");
        let p1 = project(&owner, &[&uma]);
        let mut t1 = task(&p1, &uma.id);
        t1.append_comment(uma.id, RequiredText::new("wip").expect("text"), fixed_now());

        let write = task_write(&t1, t1.revision).expect("write");
        let row = TaskRow {
            id: write.id,
            title: write.title.to_owned(),
            description: write.description.to_owned(),
            project_id: write.project_id,
            assigned_to: write.assigned_to,
            assigned_by: write.assigned_by,
            task_type: write.task_type.to_owned(),
            priority: write.priority.to_owned(),
            status: write.status.to_owned(),
            due_date: write.due_date,
            created_at: write.created_at,
            updated_at: write.updated_at,
            revision: write.revision,
        };
        let comments = comment_rows(&t1)
            .expect("comments")
            .into_iter()
            .map(|c| Comment {
                id: CommentId::from_uuid(c.id),
                author_id: UserId::from_uuid(c.author_id),
                content: RequiredText::new(c.content).expect("text"),
                created_at: c.created_at,
            })
            .collect();

        assert_eq!(row_to_task(row, comments).expect("task"), t1);
    }

    #[rstest]
    fn unknown_enum_values_are_reported() {
        let err = parsed_from_db::<Role>("user", Uuid::nil(), "role", "owner").expect_err("bad");
        assert!(err.to_string().contains("unrecognised role"));
    }
}
