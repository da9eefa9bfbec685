use std::collections::HashMap;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::authenticate;
use crate::access;
use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::extractors::Path;
use crate::models::{Project, User};

/// Caller and project for routes under `/api/projects/{project_id}`, present only
/// once the access gate has passed.
#[derive(Clone)]
pub struct ProjectContext {
    pub user: User,
    pub project: Project,
}

/// Path struct for handlers that need project_id and task_id.
#[derive(Clone, serde::Deserialize)]
pub struct ProjectTaskPath {
    pub project_id: String,
    pub task_id: String,
}

pub async fn project_auth(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let project_id = params
        .get("project_id")
        .ok_or_else(|| AppError::BadRequest("Missing project id".into()))?;

    let user = authenticate(&state, request.headers())?;

    let project = {
        let conn = state.db.get()?;
        access::can_access_project(&conn, &user.id, project_id)?
    };

    request
        .extensions_mut()
        .insert(ProjectContext { user, project });

    Ok(next.run(request).await)
}
