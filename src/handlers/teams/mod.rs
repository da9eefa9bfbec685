mod join_requests;
mod teams;

pub use join_requests::*;
pub use teams::*;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::db::AppState;
use crate::middleware::user_auth;

pub fn router(state: AppState) -> Router<AppState> {
    // Discovery is public
    let public_routes = Router::new().route("/api/teams", get(list_teams));

    let member_routes = Router::new()
        .route("/api/teams", post(create_team))
        .route("/api/teams/mine", get(list_my_teams))
        .route("/api/teams/managed", get(list_managed_teams))
        .route(
            "/api/teams/managed/active-projects",
            get(list_teams_with_active_projects),
        )
        .route("/api/teams/{team_id}", get(get_team))
        // Join requests
        .route(
            "/api/teams/{team_id}/join",
            post(create_join_request).delete(cancel_join_request),
        )
        .route("/api/teams/requests/mine", get(list_my_join_requests))
        .route(
            "/api/teams/requests/pending",
            get(list_pending_join_requests),
        )
        .route(
            "/api/teams/requests/{request_id}/{action}",
            post(review_join_request),
        )
        .layer(middleware::from_fn_with_state(state, user_auth));

    public_routes.merge(member_routes)
}
