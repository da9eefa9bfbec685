mod projects;
mod tasks;

pub use projects::*;
pub use tasks::*;

use axum::{
    Router, middleware,
    routing::{get, patch},
};

use crate::db::AppState;
use crate::middleware::{project_auth, user_auth};

pub fn router(state: AppState) -> Router<AppState> {
    let collection_routes = Router::new()
        .route("/api/projects", get(list_projects).post(create_project))
        .layer(middleware::from_fn_with_state(state.clone(), user_auth));

    // Everything below a project id passes the project access gate first
    let project_routes = Router::new()
        .route(
            "/api/projects/{project_id}",
            get(get_project).patch(update_project),
        )
        .route(
            "/api/projects/{project_id}/tasks",
            get(list_tasks).post(create_task),
        )
        .route(
            "/api/projects/{project_id}/tasks/{task_id}",
            patch(update_task).delete(delete_task),
        )
        .layer(middleware::from_fn_with_state(state, project_auth));

    collection_routes.merge(project_routes)
}
