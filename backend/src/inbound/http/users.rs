//! Identity API handlers.
//!
//! ```text
//! GET /api/v1/users/team-members
//! GET /api/v1/users/me
//! PUT /api/v1/users/me {"name":"Ada King"}
//! GET /api/v1/users/{id}
//! ```

use actix_web::{get, put, web};

use crate::domain::{Error, ReferenceSet, User, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedActor;
use crate::inbound::http::dto::{UpdateProfileBody, UserResponse};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::path_uuid;

async fn user_body(state: &HttpState, user: &User) -> ApiResult<web::Json<UserResponse>> {
    let refs = state
        .references
        .resolve(&ReferenceSet::for_users([user]))
        .await?;
    Ok(web::Json(UserResponse::resolved(user, &refs)))
}

/// Identities with the member role; admins only.
#[utoipa::path(
    get,
    path = "/api/v1/users/team-members",
    responses(
        (status = 200, description = "Members", body = [UserResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Caller is not an admin", body = Error)
    ),
    tags = ["users"],
    operation_id = "listTeamMembers"
)]
#[get("/users/team-members")]
pub async fn list_team_members(
    state: web::Data<HttpState>,
    actor: AuthenticatedActor,
) -> ApiResult<web::Json<Vec<UserResponse>>> {
    let users = state.users.list_team_members(&actor).await?;
    let refs = state.references.resolve(&ReferenceSet::for_users(&users)).await?;
    Ok(web::Json(
        users
            .iter()
            .map(|user| UserResponse::resolved(user, &refs))
            .collect(),
    ))
}

/// The caller's own profile.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    actor: AuthenticatedActor,
) -> ApiResult<web::Json<UserResponse>> {
    let user = state.users.current_user(&actor).await?;
    user_body(&state, &user).await
}

/// Rename the caller.
#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    request_body = UpdateProfileBody,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 409, description = "Concurrent updates exhausted retries", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateProfile"
)]
#[put("/users/me")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    actor: AuthenticatedActor,
    payload: web::Json<UpdateProfileBody>,
) -> ApiResult<web::Json<UserResponse>> {
    let user = state
        .users
        .update_profile(&actor, payload.into_inner().name)
        .await?;
    user_body(&state, &user).await
}

/// Any identity by id; admins only.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "Identity id")),
    responses(
        (status = 200, description = "Identity", body = UserResponse),
        (status = 400, description = "Malformed id", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Caller is not an admin", body = Error),
        (status = 404, description = "Identity not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    actor: AuthenticatedActor,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserResponse>> {
    let id = path_uuid("id", &path).map(UserId::from_uuid)?;
    let user = state.users.get_user(&actor, &id).await?;
    user_body(&state, &user).await
}
