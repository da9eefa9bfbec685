//! Access-control gate: who may act on which team, project or task.
//!
//! Every check returns the domain error the API reports: 403 for role and
//! ownership mismatches, 404 for missing targets, 400 for an assignee outside
//! the project's team.

use rusqlite::Connection;

use crate::db::queries;
use crate::error::{AppError, Result};
use crate::models::{Project, Team, User};

/// Team and project creation, and join-request review, are manager/admin actions.
pub fn require_team_manager_role(user: &User) -> Result<()> {
    if user.role.can_manage_teams() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Forbidden: Managers only".into()))
    }
}

/// The caller must be the team's owning manager.
pub fn require_team_owner(team: &Team, user_id: &str) -> Result<()> {
    if team.manager_id == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden("Forbidden".into()))
    }
}

/// Team details are visible to the owning manager and to members.
pub fn require_team_visibility(conn: &Connection, team: &Team, user_id: &str) -> Result<()> {
    if team.manager_id == user_id || queries::is_team_member(conn, &team.id, user_id)? {
        Ok(())
    } else {
        Err(AppError::Forbidden("Forbidden".into()))
    }
}

/// Grants access when the caller manages the project or belongs to its team.
pub fn can_access_project(conn: &Connection, user_id: &str, project_id: &str) -> Result<Project> {
    let project = queries::get_project_by_id(conn, project_id)?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))?;

    if project.manager_id == user_id || queries::is_team_member(conn, &project.team_id, user_id)? {
        Ok(project)
    } else {
        Err(AppError::Forbidden("Forbidden".into()))
    }
}

/// Only the project's manager may edit the project itself.
pub fn require_project_manager(project: &Project, user_id: &str) -> Result<()> {
    if project.manager_id == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden("Only the project manager can modify this project".into()))
    }
}

/// A task may only be assigned to a member of the project's team.
pub fn require_assignable(conn: &Connection, project: &Project, assignee_id: &str) -> Result<()> {
    if queries::is_team_member(conn, &project.team_id, assignee_id)? {
        Ok(())
    } else {
        Err(AppError::BadRequest("assignedTo must be a team member".into()))
    }
}
