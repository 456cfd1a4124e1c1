//! Project API handlers.
//!
//! ```text
//! POST /api/v1/projects {"name":"Apollo","description":"...","teamMembers":["<uuid>"]}
//! GET  /api/v1/projects
//! GET  /api/v1/projects/{id}
//! PUT  /api/v1/projects/{id}/team {"teamMembers":["<uuid>"]}
//! ```

use actix_web::{get, post, put, web};

use crate::domain::{Error, Project, ProjectId, ReferenceSet};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedActor;
use crate::inbound::http::dto::{CreateProjectBody, ProjectResponse, UpdateTeamBody};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::path_uuid;

fn project_id(raw: &str) -> Result<ProjectId, Error> {
    path_uuid("id", raw).map(ProjectId::from_uuid)
}

async fn project_body(
    state: &HttpState,
    project: &Project,
) -> ApiResult<web::Json<ProjectResponse>> {
    let refs = state
        .references
        .resolve(&ReferenceSet::for_projects([project]))
        .await?;
    Ok(web::Json(ProjectResponse::resolved(project, &refs)))
}

/// Create a project owned by the calling admin.
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    request_body = CreateProjectBody,
    responses(
        (status = 200, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Caller is not an admin", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["projects"],
    operation_id = "createProject"
)]
#[post("/projects")]
pub async fn create_project(
    state: web::Data<HttpState>,
    actor: AuthenticatedActor,
    payload: web::Json<CreateProjectBody>,
) -> ApiResult<web::Json<ProjectResponse>> {
    let project = state
        .projects
        .create_project(&actor, payload.into_inner().into())
        .await?;
    project_body(&state, &project).await
}

/// Projects the caller owns (admins) or belongs to (members).
#[utoipa::path(
    get,
    path = "/api/v1/projects",
    responses(
        (status = 200, description = "Visible projects", body = [ProjectResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["projects"],
    operation_id = "listProjects"
)]
#[get("/projects")]
pub async fn list_projects(
    state: web::Data<HttpState>,
    actor: AuthenticatedActor,
) -> ApiResult<web::Json<Vec<ProjectResponse>>> {
    let projects = state.projects_query.list_projects(&actor).await?;
    let refs = state
        .references
        .resolve(&ReferenceSet::for_projects(&projects))
        .await?;
    Ok(web::Json(
        projects
            .iter()
            .map(|project| ProjectResponse::resolved(project, &refs))
            .collect(),
    ))
}

/// Fetch one project.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project", body = ProjectResponse),
        (status = 400, description = "Malformed id", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Caller neither owns nor belongs to the project", body = Error),
        (status = 404, description = "Project not found", body = Error)
    ),
    tags = ["projects"],
    operation_id = "getProject"
)]
#[get("/projects/{id}")]
pub async fn get_project(
    state: web::Data<HttpState>,
    actor: AuthenticatedActor,
    path: web::Path<String>,
) -> ApiResult<web::Json<ProjectResponse>> {
    let id = project_id(&path)?;
    let project = state.projects_query.get_project(&actor, &id).await?;
    project_body(&state, &project).await
}

/// Replace a project's team.
#[utoipa::path(
    put,
    path = "/api/v1/projects/{id}/team",
    params(("id" = String, Path, description = "Project id")),
    request_body = UpdateTeamBody,
    responses(
        (status = 200, description = "Updated project", body = ProjectResponse),
        (status = 400, description = "Unknown team member ids", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Caller does not own the project", body = Error),
        (status = 404, description = "Project not found", body = Error),
        (status = 409, description = "Concurrent team updates exhausted retries", body = Error),
        (status = 500, description = "Back-references drifted", body = Error)
    ),
    tags = ["projects"],
    operation_id = "updateTeam"
)]
#[put("/projects/{id}/team")]
pub async fn update_team(
    state: web::Data<HttpState>,
    actor: AuthenticatedActor,
    path: web::Path<String>,
    payload: web::Json<UpdateTeamBody>,
) -> ApiResult<web::Json<ProjectResponse>> {
    let id = project_id(&path)?;
    let project = state
        .projects
        .update_team(&actor, &id, payload.into_inner().team_members)
        .await?;
    project_body(&state, &project).await
}
