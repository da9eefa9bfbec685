use axum::{
    extract::{Extension, State},
    http::StatusCode,
};
use serde::Serialize;

use crate::access;
use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::middleware::UserContext;
use crate::models::{
    JoinRequest, JoinRequestWithRequester, JoinRequestWithTeam, ReviewAction, parse_field,
};

#[derive(Debug, Serialize)]
pub struct JoinRequestResponse {
    pub request: JoinRequest,
}

#[derive(Debug, Serialize)]
pub struct JoinRequestsResponse<T> {
    pub requests: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub success: bool,
    pub request: JoinRequest,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

pub async fn create_join_request(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(team_id): Path<String>,
) -> Result<(StatusCode, Json<JoinRequestResponse>)> {
    let conn = state.db.get()?;

    let team = queries::get_team_by_id(&conn, &team_id)?
        .ok_or_else(|| AppError::NotFound("Team not found".into()))?;

    if team.manager_id == ctx.user.id {
        return Err(AppError::Conflict("You already manage this team".into()));
    }
    if queries::is_team_member(&conn, &team.id, &ctx.user.id)? {
        return Err(AppError::Conflict("Already a member".into()));
    }

    // A concurrent duplicate is still caught by the pending-request index.
    let request = queries::create_join_request(&conn, &team.id, &ctx.user.id)?;

    tracing::info!(
        request_id = %request.id,
        team_id = %team.id,
        user_id = %ctx.user.id,
        "join request created"
    );

    Ok((StatusCode::CREATED, Json(JoinRequestResponse { request })))
}

/// Withdraw the caller's own pending request.
pub async fn cancel_join_request(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(team_id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    let conn = state.db.get()?;

    if !queries::cancel_pending_join_request(&conn, &team_id, &ctx.user.id)? {
        return Err(AppError::NotFound("No pending request found".into()));
    }

    tracing::info!(team_id = %team_id, user_id = %ctx.user.id, "join request cancelled");

    Ok(Json(SuccessResponse { success: true }))
}

pub async fn list_my_join_requests(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<JoinRequestsResponse<JoinRequestWithTeam>>> {
    let conn = state.db.get()?;
    let requests = queries::list_join_requests_for_user(&conn, &ctx.user.id)?;
    Ok(Json(JoinRequestsResponse { requests }))
}

/// Pending requests across every team the caller owns.
pub async fn list_pending_join_requests(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<JoinRequestsResponse<JoinRequestWithRequester>>> {
    access::require_team_manager_role(&ctx.user)?;
    let conn = state.db.get()?;
    let requests = queries::list_pending_requests_for_manager(&conn, &ctx.user.id)?;
    Ok(Json(JoinRequestsResponse { requests }))
}

/// Approve or reject a pending request on a team the caller owns.
///
/// Approval flips the request and inserts the membership in one transaction;
/// a request that is no longer pending, including one approved by a concurrent
/// call, is reported as not found.
pub async fn review_join_request(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path((request_id, action)): Path<(String, String)>,
) -> Result<Json<ReviewResponse>> {
    access::require_team_manager_role(&ctx.user)?;
    let action: ReviewAction = parse_field(&action, "action")?;

    let mut conn = state.db.get()?;

    let pending = queries::get_join_request_by_id(&conn, &request_id)?
        .filter(|r| !r.status.is_terminal())
        .ok_or_else(|| AppError::NotFound("Pending request not found".into()))?;

    let team = queries::get_team_by_id(&conn, &pending.team_id)?
        .ok_or_else(|| AppError::NotFound("Team not found".into()))?;
    access::require_team_owner(&team, &ctx.user.id)?;

    let request = match action {
        ReviewAction::Approve => {
            let (request, member) = queries::approve_join_request(&mut conn, &request_id)?;
            tracing::info!(
                request_id = %request.id,
                team_id = %team.id,
                member_id = %member.id,
                "join request approved"
            );
            request
        }
        ReviewAction::Reject => {
            let request = queries::reject_join_request(&conn, &request_id)?;
            tracing::info!(request_id = %request.id, team_id = %team.id, "join request rejected");
            request
        }
    };
    debug_assert_eq!(request.status, action.resulting_status());

    Ok(Json(ReviewResponse {
        success: true,
        request,
    }))
}
