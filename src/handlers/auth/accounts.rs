use axum::{
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
};
use serde::Serialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::middleware::UserContext;
use crate::models::{LoginRequest, RegisterUser, User, UserRole, non_empty};
use crate::password;
use crate::util::client_ip;

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: User,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Token lifetime in seconds
    pub expires_in: u64,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
}

pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterUser>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let new_user = input.validate()?;

    if new_user.role == UserRole::Admin && !state.allow_admin_registration {
        return Err(AppError::Forbidden(
            "Admin accounts cannot be self-registered".into(),
        ));
    }

    let conn = state.db.get()?;

    if queries::get_user_by_email(&conn, &new_user.email)?.is_some() {
        return Err(AppError::Conflict(
            "User with this email already exists".into(),
        ));
    }

    let hash = password::hash_password(&new_user.password)?;
    // A concurrent registration for the same email still hits the UNIQUE constraint.
    let user = queries::create_user(&conn, &new_user, &hash)?;

    tracing::info!(user_id = %user.id, role = user.role.as_ref(), "user registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully",
            user,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let (Some(email), Some(password)) = (
        non_empty(&input.email),
        input.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Email and password are required".into(),
        ));
    };

    let conn = state.db.get()?;

    let user = match queries::get_user_by_email(&conn, email)? {
        Some(user) if password::verify_password(password, &user.password_hash)? => user,
        _ => {
            tracing::warn!(ip = ?client_ip(&headers), "failed login attempt");
            return Err(AppError::Unauthorized("Invalid email or password".into()));
        }
    };

    let token = state.tokens.issue(&user.id)?;

    Ok(Json(LoginResponse {
        token,
        expires_in: state.tokens.ttl_secs(),
        user,
    }))
}

pub async fn me(Extension(ctx): Extension<UserContext>) -> Json<MeResponse> {
    Json(MeResponse { user: ctx.user })
}
