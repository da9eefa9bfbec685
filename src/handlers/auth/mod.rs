mod accounts;

pub use accounts::*;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::db::AppState;
use crate::middleware::user_auth;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .merge(
            Router::new()
                .route("/api/auth/me", get(me))
                .layer(middleware::from_fn_with_state(state, user_auth)),
        )
}
