//! JSON request and response shapes.
//!
//! Bodies are camelCase. Responses never carry credential material and
//! render every referenced entity as a summary object holding its id plus
//! display fields. Request fields default to empty so the domain can report
//! every missing field in one response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::{CreateProjectRequest, CreateTaskRequest};
use crate::domain::{
    Comment, Project, ProjectId, ProjectStatus, ResolvedReferences, Role, Task, TaskId,
    TaskPriority, TaskStatus, TaskType, User, UserId,
};

/// Referenced identity with its display fields.
///
/// `name` and `email` are absent when the identity no longer resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "Ada Lovelace")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "ada@example.com")]
    pub email: Option<String>,
}

impl UserSummary {
    fn resolve(id: &UserId, refs: &ResolvedReferences) -> Self {
        let found = refs.user(id);
        Self {
            id: *id.as_uuid(),
            name: found.map(|u| u.name.as_str().to_owned()),
            email: found.map(|u| u.email.as_str().to_owned()),
        }
    }
}

/// Referenced project with its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "Apollo")]
    pub name: Option<String>,
}

impl ProjectSummary {
    fn resolve(id: &ProjectId, refs: &ResolvedReferences) -> Self {
        Self {
            id: *id.as_uuid(),
            name: refs.project(id).map(|p| p.name.as_str().to_owned()),
        }
    }
}

/// Referenced task with its headline fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "open")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "high")]
    pub priority: Option<TaskPriority>,
}

impl TaskSummary {
    fn resolve(id: &TaskId, refs: &ResolvedReferences) -> Self {
        let found = refs.task(id);
        Self {
            id: *id.as_uuid(),
            title: found.map(|t| t.title.as_str().to_owned()),
            status: found.map(|t| t.status),
            priority: found.map(|t| t.priority),
        }
    }
}

/// Identity as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(value_type = String, example = "member")]
    pub role: Role,
    /// Projects whose team lists this identity.
    pub projects: Vec<ProjectSummary>,
    /// Tasks assigned to this identity.
    pub assigned_tasks: Vec<TaskSummary>,
}

impl UserResponse {
    /// Map `user`, filling referenced projects and tasks from `refs`.
    pub fn resolved(user: &User, refs: &ResolvedReferences) -> Self {
        Self {
            id: *user.id.as_uuid(),
            name: user.name.as_str().to_owned(),
            email: user.email.as_str().to_owned(),
            role: user.role,
            projects: user
                .project_ids
                .iter()
                .map(|id| ProjectSummary::resolve(id, refs))
                .collect(),
            assigned_tasks: user
                .assigned_task_ids
                .iter()
                .map(|id| TaskSummary::resolve(id, refs))
                .collect(),
        }
    }
}

/// Project as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Owning admin.
    pub admin: UserSummary,
    pub team_members: Vec<UserSummary>,
    pub tasks: Vec<TaskSummary>,
    #[schema(value_type = String, example = "active")]
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectResponse {
    /// Map `project`, filling owner, team and tasks from `refs`.
    pub fn resolved(project: &Project, refs: &ResolvedReferences) -> Self {
        Self {
            id: *project.id.as_uuid(),
            name: project.name.as_str().to_owned(),
            description: project.description.as_str().to_owned(),
            admin: UserSummary::resolve(&project.owner_id, refs),
            team_members: project
                .team_member_ids
                .iter()
                .map(|id| UserSummary::resolve(id, refs))
                .collect(),
            tasks: project
                .task_ids
                .iter()
                .map(|id| TaskSummary::resolve(id, refs))
                .collect(),
            status: project.status,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

/// One comment in a task thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    /// Author identity.
    pub user: UserSummary,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl CommentResponse {
    fn resolved(comment: &Comment, refs: &ResolvedReferences) -> Self {
        Self {
            id: *comment.id.as_uuid(),
            user: UserSummary::resolve(&comment.author_id, refs),
            content: comment.content.as_str().to_owned(),
            created_at: comment.created_at,
        }
    }
}

/// Task as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub project: ProjectSummary,
    pub assigned_to: UserSummary,
    pub assigned_by: UserSummary,
    #[serde(rename = "type")]
    #[schema(value_type = String, example = "bug")]
    pub task_type: TaskType,
    #[schema(value_type = String, example = "high")]
    pub priority: TaskPriority,
    #[schema(value_type = String, example = "open")]
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub comments: Vec<CommentResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskResponse {
    /// Map `task`, filling project, people and comment authors from `refs`.
    pub fn resolved(task: &Task, refs: &ResolvedReferences) -> Self {
        Self {
            id: *task.id.as_uuid(),
            title: task.title.as_str().to_owned(),
            description: task.description.as_str().to_owned(),
            project: ProjectSummary::resolve(&task.project_id, refs),
            assigned_to: UserSummary::resolve(&task.assigned_to, refs),
            assigned_by: UserSummary::resolve(&task.assigned_by, refs),
            task_type: task.task_type,
            priority: task.priority,
            status: task.status,
            due_date: task.due_date,
            comments: task
                .comments
                .iter()
                .map(|c| CommentResponse::resolved(c, refs))
                .collect(),
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// Body of `POST /api/v1/projects`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateProjectBody {
    #[schema(example = "Apollo")]
    pub name: String,
    #[schema(example = "Moon landing tracker")]
    pub description: String,
    /// Initial team as identity ids.
    pub team_members: Vec<String>,
}

impl From<CreateProjectBody> for CreateProjectRequest {
    fn from(body: CreateProjectBody) -> Self {
        Self {
            name: body.name,
            description: body.description,
            team_member_ids: body.team_members,
        }
    }
}

/// Body of `PUT /api/v1/projects/{id}/team`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateTeamBody {
    /// Complete replacement team as identity ids.
    pub team_members: Vec<String>,
}

/// Body of `POST /api/v1/tasks`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateTaskBody {
    pub title: String,
    pub description: String,
    /// Parent project id.
    pub project: String,
    pub assigned_to: String,
    #[serde(rename = "type")]
    #[schema(example = "bug")]
    pub task_type: String,
    #[schema(example = "high")]
    pub priority: String,
    pub due_date: Option<DateTime<Utc>>,
}

impl From<CreateTaskBody> for CreateTaskRequest {
    fn from(body: CreateTaskBody) -> Self {
        Self {
            title: body.title,
            description: body.description,
            project_id: body.project,
            assigned_to: body.assigned_to,
            task_type: body.task_type,
            priority: body.priority,
            due_date: body.due_date,
        }
    }
}

/// Body of `PUT /api/v1/tasks/{id}/status`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateStatusBody {
    #[schema(example = "in_progress")]
    pub status: String,
}

/// Body of `POST /api/v1/tasks/{id}/comments`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AddCommentBody {
    pub content: String,
}

/// Body of `PUT /api/v1/users/me`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProfileBody {
    /// New display name; absent or blank leaves the profile unchanged.
    pub name: Option<String>,
}
