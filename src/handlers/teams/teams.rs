use axum::{
    extract::{Extension, State},
    http::StatusCode,
};
use serde::Serialize;

use crate::access;
use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path, Query};
use crate::middleware::UserContext;
use crate::models::{
    CreateTeam, CreatedAccount, NewUser, Team, TeamSearchQuery, TeamWithManager,
    TeamWithMembers, TeamWithProjects, UserRole, non_empty, normalize_email,
};
use crate::password;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamResponse {
    pub team: TeamWithMembers,
    /// Accounts created for initial members who had none, with their one-time passwords
    pub created_accounts: Vec<CreatedAccount>,
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub team: TeamWithMembers,
}

#[derive(Debug, Serialize)]
pub struct TeamsResponse<T> {
    pub teams: Vec<T>,
}

/// Create a team owned by the caller, optionally attaching initial members.
pub async fn create_team(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(input): Json<CreateTeam>,
) -> Result<(StatusCode, Json<CreateTeamResponse>)> {
    access::require_team_manager_role(&ctx.user)?;

    let name = non_empty(&input.name)
        .ok_or_else(|| AppError::BadRequest("Team name is required".into()))?;

    let mut conn = state.db.get()?;
    let tx = conn.transaction()?;

    let team = queries::create_team(&tx, name, &ctx.user.id)?;
    let mut created_accounts = Vec::new();

    for entry in &input.members {
        let (Some(member_name), Some(email), Some(mobile)) = (
            non_empty(&entry.name),
            non_empty(&entry.email),
            non_empty(&entry.mobile),
        ) else {
            continue;
        };

        let user = match queries::get_user_by_email(&tx, email)? {
            Some(user) => user,
            None => {
                let temporary_password = password::generate_temporary_password();
                let hash = password::hash_password(&temporary_password)?;
                let new_user = NewUser {
                    name: member_name.to_string(),
                    email: normalize_email(email),
                    password: temporary_password.clone(),
                    mobile: mobile.to_string(),
                    role: UserRole::Member,
                };
                let user = queries::create_user(&tx, &new_user, &hash)?;
                created_accounts.push(CreatedAccount {
                    email: user.email.clone(),
                    temporary_password,
                });
                user
            }
        };

        // The owner is never a member row of their own team.
        if user.id == ctx.user.id {
            continue;
        }

        queries::add_team_member_if_absent(&tx, &team.id, &user.id, non_empty(&entry.role_in_team))?;
    }

    tx.commit()?;

    let team = queries::get_team_with_members(&conn, &team.id)?
        .ok_or_else(|| AppError::Internal("Failed to fetch created team".into()))?;

    tracing::info!(
        team_id = %team.team.id,
        manager_id = %ctx.user.id,
        members = team.members.len(),
        "team created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateTeamResponse {
            team,
            created_accounts,
        }),
    ))
}

/// Public team discovery, optionally filtered by `?q=`.
pub async fn list_teams(
    State(state): State<AppState>,
    Query(query): Query<TeamSearchQuery>,
) -> Result<Json<TeamsResponse<TeamWithManager>>> {
    let conn = state.db.get()?;
    let teams = queries::search_teams(&conn, non_empty(&query.q))?;
    Ok(Json(TeamsResponse { teams }))
}

/// Teams the caller is a member of.
pub async fn list_my_teams(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<TeamsResponse<Team>>> {
    let conn = state.db.get()?;
    let teams = queries::list_teams_for_member(&conn, &ctx.user.id)?;
    Ok(Json(TeamsResponse { teams }))
}

/// Teams the caller owns, with their members.
pub async fn list_managed_teams(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<TeamsResponse<TeamWithMembers>>> {
    access::require_team_manager_role(&ctx.user)?;
    let conn = state.db.get()?;
    let teams = queries::list_managed_teams_with_members(&conn, &ctx.user.id)?;
    Ok(Json(TeamsResponse { teams }))
}

/// The caller's teams that are currently working on something.
pub async fn list_teams_with_active_projects(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<TeamsResponse<TeamWithProjects>>> {
    access::require_team_manager_role(&ctx.user)?;
    let conn = state.db.get()?;
    let teams = queries::list_teams_with_active_projects(&conn, &ctx.user.id)?;
    Ok(Json(TeamsResponse { teams }))
}

pub async fn get_team(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(team_id): Path<String>,
) -> Result<Json<TeamResponse>> {
    let conn = state.db.get()?;

    let team = queries::get_team_by_id(&conn, &team_id)?
        .ok_or_else(|| AppError::NotFound("Team not found".into()))?;
    access::require_team_visibility(&conn, &team, &ctx.user.id)?;

    let team = queries::get_team_with_members(&conn, &team.id)?
        .ok_or_else(|| AppError::NotFound("Team not found".into()))?;

    Ok(Json(TeamResponse { team }))
}
