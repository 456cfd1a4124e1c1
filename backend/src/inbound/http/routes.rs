//! Route table for the `/api/v1` scope.

use actix_web::web;

use super::validation::{json_error_handler, path_error_handler};
use super::{projects, tasks, users};

/// Register every API handler with its extractor configuration.
///
/// Literal segments (`my-tasks`, `team-members`, `me`) are registered ahead
/// of the parameterised routes they would otherwise collide with.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use tracker::inbound::http::routes::configure_api;
///
/// let app = App::new().service(web::scope("/api/v1").configure(configure_api));
/// # let _ = app;
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(projects::create_project)
        .service(projects::list_projects)
        .service(projects::get_project)
        .service(projects::update_team)
        .service(tasks::list_my_tasks)
        .service(tasks::list_project_tasks)
        .service(tasks::list_all_tasks)
        .service(tasks::create_task)
        .service(tasks::update_status)
        .service(tasks::add_comment)
        .service(users::list_team_members)
        .service(users::current_user)
        .service(users::update_profile)
        .service(users::get_user);
}
