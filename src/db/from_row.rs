//! Row mapping for the repository layer.
//!
//! Each `*_COLS` constant lists the columns its `FromRow` impl reads, in order.
//! Joined views use table-qualified columns and read the extra columns after
//! the base entity's.

use std::str::FromStr;

use rusqlite::{Connection, Params, Row, types::Type};

use crate::error::Result;
use crate::models::*;

pub const USER_COLS: &str =
    "id, name, email, mobile, role, password_hash, created_at, updated_at";

pub const TEAM_COLS: &str = "id, name, manager_id, created_at, updated_at";

/// Team joined to its manager as `t` / `u`.
pub const TEAM_WITH_MANAGER_COLS: &str =
    "t.id, t.name, t.manager_id, t.created_at, t.updated_at, u.id, u.name, u.email";

pub const TEAM_MEMBER_COLS: &str = "id, team_id, user_id, role_in_team, created_at";

/// Membership joined to the member's user row as `tm` / `u`.
pub const TEAM_MEMBER_WITH_USER_COLS: &str =
    "tm.id, tm.user_id, u.name, u.email, u.mobile, tm.role_in_team, tm.created_at";

pub const JOIN_REQUEST_COLS: &str = "id, team_id, user_id, status, created_at, updated_at";

/// Request joined to its team as `jr` / `t`.
pub const JOIN_REQUEST_WITH_TEAM_COLS: &str =
    "jr.id, jr.team_id, jr.user_id, jr.status, jr.created_at, jr.updated_at, t.id, t.name";

/// Request joined to its team and requester as `jr` / `t` / `u`.
pub const JOIN_REQUEST_WITH_REQUESTER_COLS: &str = "jr.id, jr.team_id, jr.user_id, jr.status, \
     jr.created_at, jr.updated_at, t.id, t.name, u.id, u.name, u.email";

pub const PROJECT_COLS: &str =
    "id, name, description, status, team_id, manager_id, created_at, updated_at";

pub const TASK_COLS: &str =
    "id, project_id, title, status, created_by, assigned_to, created_at, updated_at";

pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Read a text column into one of the model enums.
fn get_enum<E: FromStr>(row: &Row, idx: usize) -> rusqlite::Result<E> {
    let value: String = row.get(idx)?;
    E::from_str(&value).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unexpected enum value '{}'", value).into(),
        )
    })
}

pub fn query_one<T: FromRow>(conn: &Connection, sql: &str, params: impl Params) -> Result<Option<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    match rows.next()? {
        Some(row) => Ok(Some(T::from_row(row)?)),
        None => Ok(None),
    }
}

pub fn query_all<T: FromRow>(conn: &Connection, sql: &str, params: impl Params) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| T::from_row(row))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            mobile: row.get(3)?,
            role: get_enum(row, 4)?,
            password_hash: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl FromRow for Team {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Team {
            id: row.get(0)?,
            name: row.get(1)?,
            manager_id: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }
}

impl FromRow for TeamWithManager {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(TeamWithManager {
            team: Team::from_row(row)?,
            manager: UserSummary {
                id: row.get(5)?,
                name: row.get(6)?,
                email: row.get(7)?,
            },
        })
    }
}

impl FromRow for TeamMember {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(TeamMember {
            id: row.get(0)?,
            team_id: row.get(1)?,
            user_id: row.get(2)?,
            role_in_team: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl FromRow for TeamMemberWithUser {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(TeamMemberWithUser {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            email: row.get(3)?,
            mobile: row.get(4)?,
            role_in_team: row.get(5)?,
            joined_at: row.get(6)?,
        })
    }
}

impl FromRow for JoinRequest {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(JoinRequest {
            id: row.get(0)?,
            team_id: row.get(1)?,
            user_id: row.get(2)?,
            status: get_enum(row, 3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

impl FromRow for JoinRequestWithTeam {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(JoinRequestWithTeam {
            request: JoinRequest::from_row(row)?,
            team: TeamSummary {
                id: row.get(6)?,
                name: row.get(7)?,
            },
        })
    }
}

impl FromRow for JoinRequestWithRequester {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(JoinRequestWithRequester {
            request: JoinRequest::from_row(row)?,
            team: TeamSummary {
                id: row.get(6)?,
                name: row.get(7)?,
            },
            requester: UserSummary {
                id: row.get(8)?,
                name: row.get(9)?,
                email: row.get(10)?,
            },
        })
    }
}

impl FromRow for Project {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Project {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            status: get_enum(row, 3)?,
            team_id: row.get(4)?,
            manager_id: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl FromRow for Task {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Task {
            id: row.get(0)?,
            project_id: row.get(1)?,
            title: row.get(2)?,
            status: get_enum(row, 3)?,
            created_by: row.get(4)?,
            assigned_to: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}
