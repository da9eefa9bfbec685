use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::models::User;
use crate::util::extract_bearer_token;

#[derive(Clone)]
pub struct UserContext {
    pub user: User,
}

/// Resolve the bearer token to a live user.
/// The pooled connection is released before returning, so callers may hold
/// the result across `next.run`.
pub(crate) fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User> {
    let token = extract_bearer_token(headers)
        .ok_or_else(|| AppError::Unauthorized("Missing authorization token".into()))?;

    let user_id = state.tokens.verify(token)?;

    let conn = state.db.get()?;
    // A valid token for a user that no longer exists is treated as invalid.
    queries::get_user_by_id(&conn, &user_id)?
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".into()))
}

pub async fn user_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let user = authenticate(&state, request.headers())?;
    request.extensions_mut().insert(UserContext { user });
    Ok(next.run(request).await)
}
