mod from_row;
pub mod queries;
mod schema;

use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::jwt::TokenIssuer;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Everything a handler needs, built once at startup and cloned into each request.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub tokens: TokenIssuer,
    pub allow_admin_registration: bool,
}

fn configure_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")
}

/// Build a connection pool over the SQLite file at `path`.
pub fn create_pool(path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(path).with_init(configure_connection);
    Pool::builder().max_size(8).build(manager)
}

pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(schema::SCHEMA)
}

/// True when `err` is SQLite rejecting a row for a UNIQUE constraint or index.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
