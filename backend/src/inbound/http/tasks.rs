//! Task API handlers.
//!
//! ```text
//! POST /api/v1/tasks {"title":"...","description":"...","project":"<uuid>",
//!                     "assignedTo":"<uuid>","type":"bug","priority":"high"}
//! PUT  /api/v1/tasks/{id}/status {"status":"in_progress"}
//! POST /api/v1/tasks/{id}/comments {"content":"..."}
//! GET  /api/v1/tasks/project/{projectId}
//! GET  /api/v1/tasks/my-tasks
//! GET  /api/v1/tasks
//! ```

use actix_web::{get, post, put, web};

use crate::domain::{Error, ProjectId, ReferenceSet, Task, TaskId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedActor;
use crate::inbound::http::dto::{AddCommentBody, CreateTaskBody, TaskResponse, UpdateStatusBody};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::path_uuid;

fn task_id(raw: &str) -> Result<TaskId, Error> {
    path_uuid("id", raw).map(TaskId::from_uuid)
}

async fn task_body(state: &HttpState, task: &Task) -> ApiResult<web::Json<TaskResponse>> {
    let refs = state
        .references
        .resolve(&ReferenceSet::for_tasks([task]))
        .await?;
    Ok(web::Json(TaskResponse::resolved(task, &refs)))
}

async fn task_list(state: &HttpState, tasks: &[Task]) -> ApiResult<web::Json<Vec<TaskResponse>>> {
    let refs = state.references.resolve(&ReferenceSet::for_tasks(tasks)).await?;
    Ok(web::Json(
        tasks
            .iter()
            .map(|task| TaskResponse::resolved(task, &refs))
            .collect(),
    ))
}

/// Create a task in a project the caller owns.
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    request_body = CreateTaskBody,
    responses(
        (status = 200, description = "Task created", body = TaskResponse),
        (status = 400, description = "Invalid fields or assignee outside the team", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Caller is not the owning admin", body = Error),
        (status = 404, description = "Project not found", body = Error),
        (status = 409, description = "Concurrent writers exhausted retries", body = Error)
    ),
    tags = ["tasks"],
    operation_id = "createTask"
)]
#[post("/tasks")]
pub async fn create_task(
    state: web::Data<HttpState>,
    actor: AuthenticatedActor,
    payload: web::Json<CreateTaskBody>,
) -> ApiResult<web::Json<TaskResponse>> {
    let task = state
        .tasks
        .create_task(&actor, payload.into_inner().into())
        .await?;
    task_body(&state, &task).await
}

/// Move a task through the workflow; assignee only.
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{id}/status",
    params(("id" = String, Path, description = "Task id")),
    request_body = UpdateStatusBody,
    responses(
        (status = 200, description = "Updated task", body = TaskResponse),
        (status = 400, description = "Invalid status", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Caller is not the assignee", body = Error),
        (status = 404, description = "Task not found", body = Error)
    ),
    tags = ["tasks"],
    operation_id = "updateTaskStatus"
)]
#[put("/tasks/{id}/status")]
pub async fn update_status(
    state: web::Data<HttpState>,
    actor: AuthenticatedActor,
    path: web::Path<String>,
    payload: web::Json<UpdateStatusBody>,
) -> ApiResult<web::Json<TaskResponse>> {
    let id = task_id(&path)?;
    let task = state
        .tasks
        .update_status(&actor, &id, &payload.status)
        .await?;
    task_body(&state, &task).await
}

/// Append a comment; assignee or owning admin only.
#[utoipa::path(
    post,
    path = "/api/v1/tasks/{id}/comments",
    params(("id" = String, Path, description = "Task id")),
    request_body = AddCommentBody,
    responses(
        (status = 200, description = "Task with the new comment", body = TaskResponse),
        (status = 400, description = "Empty content", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Caller may not comment", body = Error),
        (status = 404, description = "Task not found", body = Error)
    ),
    tags = ["tasks"],
    operation_id = "addTaskComment"
)]
#[post("/tasks/{id}/comments")]
pub async fn add_comment(
    state: web::Data<HttpState>,
    actor: AuthenticatedActor,
    path: web::Path<String>,
    payload: web::Json<AddCommentBody>,
) -> ApiResult<web::Json<TaskResponse>> {
    let id = task_id(&path)?;
    let task = state
        .tasks
        .add_comment(&actor, &id, &payload.content)
        .await?;
    task_body(&state, &task).await
}

/// Tasks of one project.
#[utoipa::path(
    get,
    path = "/api/v1/tasks/project/{projectId}",
    params(("projectId" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project tasks", body = [TaskResponse]),
        (status = 400, description = "Malformed id", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Caller neither owns nor belongs to the project", body = Error),
        (status = 404, description = "Project not found", body = Error)
    ),
    tags = ["tasks"],
    operation_id = "listProjectTasks"
)]
#[get("/tasks/project/{projectId}")]
pub async fn list_project_tasks(
    state: web::Data<HttpState>,
    actor: AuthenticatedActor,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<TaskResponse>>> {
    let id = path_uuid("projectId", &path).map(ProjectId::from_uuid)?;
    let tasks = state.tasks_query.list_by_project(&actor, &id).await?;
    task_list(&state, &tasks).await
}

/// Tasks assigned to the caller.
#[utoipa::path(
    get,
    path = "/api/v1/tasks/my-tasks",
    responses(
        (status = 200, description = "Assigned tasks", body = [TaskResponse]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["tasks"],
    operation_id = "listMyTasks"
)]
#[get("/tasks/my-tasks")]
pub async fn list_my_tasks(
    state: web::Data<HttpState>,
    actor: AuthenticatedActor,
) -> ApiResult<web::Json<Vec<TaskResponse>>> {
    let tasks = state.tasks_query.list_mine(&actor).await?;
    task_list(&state, &tasks).await
}

/// Every task; admins only.
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    responses(
        (status = 200, description = "All tasks", body = [TaskResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Caller is not an admin", body = Error)
    ),
    tags = ["tasks"],
    operation_id = "listAllTasks"
)]
#[get("/tasks")]
pub async fn list_all_tasks(
    state: web::Data<HttpState>,
    actor: AuthenticatedActor,
) -> ApiResult<web::Json<Vec<TaskResponse>>> {
    let tasks = state.tasks_query.list_all(&actor).await?;
    task_list(&state, &tasks).await
}
