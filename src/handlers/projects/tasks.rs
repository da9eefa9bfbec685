use axum::{
    extract::{Extension, State},
    http::StatusCode,
};
use serde::Serialize;

use crate::access;
use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::middleware::{ProjectContext, ProjectTaskPath};
use crate::models::{
    CreateTask, NewTask, Task, TaskChanges, TaskStatus, UpdateTask, non_empty, parse_field,
};

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub task: Task,
}

#[derive(Debug, Serialize)]
pub struct TasksResponse {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Serialize)]
pub struct DeleteTaskResponse {
    pub success: bool,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(ctx): Extension<ProjectContext>,
) -> Result<Json<TasksResponse>> {
    let conn = state.db.get()?;
    let tasks = queries::list_tasks_for_project(&conn, &ctx.project.id)?;
    Ok(Json(TasksResponse { tasks }))
}

/// Any caller who passed the project gate may add tasks.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<ProjectContext>,
    Json(input): Json<CreateTask>,
) -> Result<(StatusCode, Json<TaskResponse>)> {
    let title = non_empty(&input.title)
        .ok_or_else(|| AppError::BadRequest("title is required".into()))?;

    let status = match non_empty(&input.status) {
        Some(s) => parse_field(s, "status")?,
        None => TaskStatus::Todo,
    };

    let conn = state.db.get()?;

    let assigned_to = non_empty(&input.assigned_to).map(String::from);
    if let Some(assignee) = &assigned_to {
        access::require_assignable(&conn, &ctx.project, assignee)?;
    }

    let task = queries::create_task(
        &conn,
        &ctx.project.id,
        &NewTask {
            title: title.to_string(),
            status,
            created_by: ctx.user.id.clone(),
            assigned_to,
        },
    )?;

    tracing::info!(task_id = %task.id, project_id = %ctx.project.id, "task created");

    Ok((StatusCode::CREATED, Json(TaskResponse { task })))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<ProjectContext>,
    Path(path): Path<ProjectTaskPath>,
    Json(input): Json<UpdateTask>,
) -> Result<Json<TaskResponse>> {
    let conn = state.db.get()?;

    let task = queries::get_task(&conn, &ctx.project.id, &path.task_id)?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    let title = match &input.title {
        Some(_) => Some(
            non_empty(&input.title)
                .ok_or_else(|| AppError::BadRequest("title cannot be empty".into()))?
                .to_string(),
        ),
        None => None,
    };
    let status = match &input.status {
        Some(s) => Some(parse_field::<TaskStatus>(s, "status")?),
        None => None,
    };
    // Blank or null unassigns.
    let assigned_to = match &input.assigned_to {
        Some(value) => {
            let assignee = non_empty(value).map(String::from);
            if let Some(id) = &assignee {
                access::require_assignable(&conn, &ctx.project, id)?;
            }
            Some(assignee)
        }
        None => None,
    };

    let changes = TaskChanges {
        title,
        status,
        assigned_to,
    };
    if changes.is_empty() {
        return Ok(Json(TaskResponse { task }));
    }

    queries::update_task(&conn, &task.id, &changes)?;

    let task = queries::get_task(&conn, &ctx.project.id, &task.id)?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    tracing::info!(task_id = %task.id, project_id = %ctx.project.id, "task updated");

    Ok(Json(TaskResponse { task }))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<ProjectContext>,
    Path(path): Path<ProjectTaskPath>,
) -> Result<Json<DeleteTaskResponse>> {
    let conn = state.db.get()?;

    if !queries::delete_task(&conn, &ctx.project.id, &path.task_id)? {
        return Err(AppError::NotFound("Task not found".into()));
    }

    tracing::info!(task_id = %path.task_id, project_id = %ctx.project.id, "task deleted");

    Ok(Json(DeleteTaskResponse { success: true }))
}
