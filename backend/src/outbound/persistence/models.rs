//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{projects, task_comments, tasks, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub project_ids: Vec<Uuid>,
    pub assigned_task_ids: Vec<Uuid>,
    pub revision: i64,
}

/// Insertable and update shape for users.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserWrite<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub project_ids: Vec<Uuid>,
    pub assigned_task_ids: Vec<Uuid>,
    pub revision: i64,
}

/// Row struct for reading from the projects table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProjectRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub owner_id: Uuid,
    pub team_member_ids: Vec<Uuid>,
    pub task_ids: Vec<Uuid>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revision: i64,
}

/// Insertable and update shape for projects.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = projects)]
pub(crate) struct ProjectWrite<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub description: &'a str,
    pub owner_id: Uuid,
    pub team_member_ids: Vec<Uuid>,
    pub task_ids: Vec<Uuid>,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revision: i64,
}

/// Row struct for reading from the tasks table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TaskRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub project_id: Uuid,
    pub assigned_to: Uuid,
    pub assigned_by: Uuid,
    pub task_type: String,
    pub priority: String,
    pub status: String,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revision: i64,
}

/// Insertable and update shape for tasks.
///
/// `treat_none_as_null` lets an update clear the due date.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct TaskWrite<'a> {
    pub id: Uuid,
    pub title: &'a str,
    pub description: &'a str,
    pub project_id: Uuid,
    pub assigned_to: Uuid,
    pub assigned_by: Uuid,
    pub task_type: &'a str,
    pub priority: &'a str,
    pub status: &'a str,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revision: i64,
}

/// Row struct for reading from the task_comments table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = task_comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CommentRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub position: i32,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for appending comments.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = task_comments)]
pub(crate) struct NewCommentRow<'a> {
    pub id: Uuid,
    pub task_id: Uuid,
    pub position: i32,
    pub author_id: Uuid,
    pub content: &'a str,
    pub created_at: DateTime<Utc>,
}
