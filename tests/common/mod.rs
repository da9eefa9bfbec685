//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::OnceLock;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use rusqlite::Connection;
use serde_json::Value;
use tempfile::TempDir;

pub use teamdesk::db::{AppState, queries};
pub use teamdesk::models::*;

use teamdesk::db::{create_pool, init_db};
use teamdesk::handlers;
use teamdesk::jwt::TokenIssuer;
use teamdesk::password;

pub const TEST_PASSWORD: &str = "hunter22";
pub const TEST_JWT_SECRET: &[u8] = b"test-secret-test-secret-test-secret!";

/// Hashing is slow in debug builds, so every fixture user shares one hash.
fn test_password_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| password::hash_password(TEST_PASSWORD).expect("hash test password"))
}

/// A file-backed database (pooled connections must see the same data) and the
/// state the router runs on.
pub struct TestApp {
    pub state: AppState,
    _dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_admin_registration(false)
    }

    pub fn with_admin_registration(allow_admin_registration: bool) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("teamdesk-test.db");
        let pool = create_pool(path.to_str().expect("utf-8 path")).expect("create pool");
        {
            let conn = pool.get().expect("get connection");
            init_db(&conn).expect("init schema");
        }

        let state = AppState {
            db: pool,
            tokens: TokenIssuer::new(TEST_JWT_SECRET, 3600),
            allow_admin_registration,
        };

        Self { state, _dir: dir }
    }

    pub fn router(&self) -> Router {
        handlers::router(self.state.clone()).with_state(self.state.clone())
    }

    pub fn conn(&self) -> r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager> {
        self.state.db.get().expect("get connection")
    }

    pub fn token_for(&self, user: &User) -> String {
        self.state.tokens.issue(&user.id).expect("issue token")
    }
}

pub fn create_test_user(conn: &Connection, name: &str, email: &str, role: UserRole) -> User {
    let input = NewUser {
        name: name.to_string(),
        email: normalize_email(email),
        password: TEST_PASSWORD.to_string(),
        mobile: "555-0100".to_string(),
        role,
    };
    queries::create_user(conn, &input, test_password_hash()).expect("create test user")
}

pub fn create_test_team(conn: &Connection, name: &str, manager: &User) -> Team {
    queries::create_team(conn, name, &manager.id).expect("create test team")
}

pub fn create_test_project(conn: &Connection, name: &str, team: &Team) -> Project {
    queries::create_project(conn, name, None, ProjectStatus::InProgress, team)
        .expect("create test project")
}

/// Build a request with an optional bearer token and JSON body.
pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("build request"),
        None => builder.body(Body::empty()).expect("build request"),
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("JSON body")
}
