//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint, the JSON shapes they exchange
//! and the bearer token security scheme. Swagger UI serves it in debug
//! builds.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode, FieldViolation};
use crate::inbound::http::dto::{
    AddCommentBody, CommentResponse, CreateProjectBody, CreateTaskBody, ProjectResponse,
    ProjectSummary, TaskResponse, TaskSummary, UpdateProfileBody, UpdateStatusBody,
    UpdateTeamBody, UserResponse, UserSummary,
};

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("Opaque access token issued to an identity."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Tracker API",
        description = "Projects, their teams and the tasks assigned within them."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::projects::create_project,
        crate::inbound::http::projects::list_projects,
        crate::inbound::http::projects::get_project,
        crate::inbound::http::projects::update_team,
        crate::inbound::http::tasks::create_task,
        crate::inbound::http::tasks::update_status,
        crate::inbound::http::tasks::add_comment,
        crate::inbound::http::tasks::list_project_tasks,
        crate::inbound::http::tasks::list_my_tasks,
        crate::inbound::http::tasks::list_all_tasks,
        crate::inbound::http::users::list_team_members,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::update_profile,
        crate::inbound::http::users::get_user,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        FieldViolation,
        UserResponse,
        ProjectResponse,
        TaskResponse,
        CommentResponse,
        UserSummary,
        ProjectSummary,
        TaskSummary,
        CreateProjectBody,
        UpdateTeamBody,
        CreateTaskBody,
        UpdateStatusBody,
        AddCommentBody,
        UpdateProfileBody,
    )),
    tags(
        (name = "projects", description = "Projects and their teams"),
        (name = "tasks", description = "Task workflow and comments"),
        (name = "users", description = "Identity directory"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case("Error", "code")]
    #[case("Error", "traceId")]
    #[case("ProjectResponse", "teamMembers")]
    #[case("TaskResponse", "assignedTo")]
    #[case("UserResponse", "assignedTasks")]
    #[case("UserSummary", "email")]
    #[case("TaskSummary", "title")]
    fn schemas_use_camel_case_fields(#[case] schema: &str, #[case] field: &str) {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let found = schemas.get(schema).expect("schema registered");
        assert_object_schema_has_field(found, field);
    }

    #[rstest]
    fn every_endpoint_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/projects",
            "/api/v1/projects/{id}",
            "/api/v1/projects/{id}/team",
            "/api/v1/tasks",
            "/api/v1/tasks/{id}/status",
            "/api/v1/tasks/{id}/comments",
            "/api/v1/tasks/project/{projectId}",
            "/api/v1/tasks/my-tasks",
            "/api/v1/users/team-members",
            "/api/v1/users/me",
            "/api/v1/users/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[rstest]
    fn bearer_security_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("BearerToken"));
    }
}
