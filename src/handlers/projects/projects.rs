use axum::{
    extract::{Extension, State},
    http::StatusCode,
};
use serde::Serialize;

use crate::access;
use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::middleware::{ProjectContext, UserContext};
use crate::models::{
    CreateProject, Project, ProjectChanges, ProjectDetails, ProjectStatus, UpdateProject,
    non_empty, parse_field,
};

#[derive(Debug, Serialize)]
pub struct ProjectResponse<T> {
    pub project: T,
}

#[derive(Debug, Serialize)]
pub struct ProjectsResponse {
    pub projects: Vec<Project>,
}

/// Projects the caller manages or can see through team membership.
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<ProjectsResponse>> {
    let conn = state.db.get()?;
    let projects = queries::list_accessible_projects(&conn, &ctx.user.id)?;
    Ok(Json(ProjectsResponse { projects }))
}

pub async fn create_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(input): Json<CreateProject>,
) -> Result<(StatusCode, Json<ProjectResponse<Project>>)> {
    access::require_team_manager_role(&ctx.user)?;

    let (Some(name), Some(team_id)) = (non_empty(&input.name), non_empty(&input.team_id)) else {
        return Err(AppError::BadRequest("name and teamId are required".into()));
    };

    let status = match non_empty(&input.status) {
        Some(s) => parse_field(s, "status")?,
        None => ProjectStatus::InProgress,
    };

    let conn = state.db.get()?;

    // A team owned by someone else is reported the same as a missing one.
    let team = queries::get_team_by_id(&conn, team_id)?
        .filter(|t| t.manager_id == ctx.user.id)
        .ok_or_else(|| AppError::NotFound("Team not found or not managed by you".into()))?;

    let project = queries::create_project(&conn, name, non_empty(&input.description), status, &team)?;

    tracing::info!(
        project_id = %project.id,
        team_id = %team.id,
        status = project.status.as_ref(),
        "project created"
    );

    Ok((StatusCode::CREATED, Json(ProjectResponse { project })))
}

/// Project with its team roster and tasks.
pub async fn get_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<ProjectContext>,
) -> Result<Json<ProjectResponse<ProjectDetails>>> {
    let conn = state.db.get()?;

    let team = queries::get_team_with_members(&conn, &ctx.project.team_id)?
        .ok_or_else(|| AppError::NotFound("Team not found".into()))?;
    let tasks = queries::list_tasks_for_project(&conn, &ctx.project.id)?;

    Ok(Json(ProjectResponse {
        project: ProjectDetails {
            project: ctx.project,
            team,
            tasks,
        },
    }))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<ProjectContext>,
    Json(input): Json<UpdateProject>,
) -> Result<Json<ProjectResponse<Project>>> {
    access::require_project_manager(&ctx.project, &ctx.user.id)?;

    let name = match &input.name {
        Some(_) => Some(
            non_empty(&input.name)
                .ok_or_else(|| AppError::BadRequest("name cannot be empty".into()))?
                .to_string(),
        ),
        None => None,
    };
    let status = match &input.status {
        Some(s) => Some(parse_field::<ProjectStatus>(s, "status")?),
        None => None,
    };
    let changes = ProjectChanges {
        name,
        description: input
            .description
            .map(|d| d.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())),
        status,
    };

    let conn = state.db.get()?;
    queries::update_project(&conn, &ctx.project.id, &changes)?;

    let project = queries::get_project_by_id(&conn, &ctx.project.id)?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))?;

    tracing::info!(project_id = %project.id, "project updated");

    Ok(Json(ProjectResponse { project }))
}
