use std::collections::HashMap;

use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior, params, types::Value};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::*;

use super::from_row::{
    JOIN_REQUEST_COLS, JOIN_REQUEST_WITH_REQUESTER_COLS, JOIN_REQUEST_WITH_TEAM_COLS,
    PROJECT_COLS, TASK_COLS, TEAM_COLS, TEAM_MEMBER_COLS, TEAM_MEMBER_WITH_USER_COLS,
    TEAM_WITH_MANAGER_COLS, USER_COLS, query_all, query_one,
};
use super::is_unique_violation;

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

/// Turn a UNIQUE violation into a `Conflict` carrying `message`; other errors pass through.
fn conflict_on_unique(err: rusqlite::Error, message: &str) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict(message.to_string())
    } else {
        AppError::Database(err)
    }
}

/// Builder for dynamic UPDATE statements with optional fields.
struct UpdateBuilder {
    table: &'static str,
    id: String,
    fields: Vec<(&'static str, Value)>,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: &str) -> Self {
        Self {
            table,
            id: id.to_string(),
            fields: Vec::new(),
        }
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Set a column to an explicit value (including NULL).
    /// Use this for Option<T> where Some(v) = set to v, None = set to NULL.
    fn set_nullable<V: Into<Value>>(mut self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.fields.push((column, v.into())),
            None => self.fields.push((column, Value::Null)),
        }
        self
    }

    /// Apply the update, bumping `updated_at`. Returns whether a row matched.
    fn execute(mut self, conn: &Connection) -> Result<bool> {
        if self.fields.is_empty() {
            return Ok(false);
        }
        self.fields.push(("updated_at", now().into()));
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!("UPDATE {} SET {} WHERE id = ?", self.table, sets.join(", "));
        let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(affected > 0)
    }
}

// ============ Users ============

/// Create a user. `input.email` is expected to be normalized already.
pub fn create_user(conn: &Connection, input: &NewUser, password_hash: &str) -> Result<User> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO users (id, name, email, mobile, role, password_hash, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            &id,
            &input.name,
            &input.email,
            &input.mobile,
            input.role.as_ref(),
            password_hash,
            now,
            now
        ],
    )
    .map_err(|e| conflict_on_unique(e, "User with this email already exists"))?;

    Ok(User {
        id,
        name: input.name.clone(),
        email: input.email.clone(),
        mobile: input.mobile.clone(),
        role: input.role,
        password_hash: password_hash.to_string(),
        created_at: now,
        updated_at: now,
    })
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        params![id],
    )
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLS),
        params![normalize_email(email)],
    )
}

// ============ Teams ============

pub fn create_team(conn: &Connection, name: &str, manager_id: &str) -> Result<Team> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO teams (id, name, manager_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![&id, name, manager_id, now, now],
    )?;

    Ok(Team {
        id,
        name: name.to_string(),
        manager_id: manager_id.to_string(),
        created_at: now,
        updated_at: now,
    })
}

pub fn get_team_by_id(conn: &Connection, id: &str) -> Result<Option<Team>> {
    query_one(
        conn,
        &format!("SELECT {} FROM teams WHERE id = ?1", TEAM_COLS),
        params![id],
    )
}

/// Escape LIKE wildcards so user input matches literally.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Team discovery: every team whose name contains `search` (ASCII case-insensitive),
/// with its manager's id and name.
pub fn search_teams(conn: &Connection, search: Option<&str>) -> Result<Vec<TeamWithManager>> {
    // Discovery is public, so the manager's email is left out.
    let cols = TEAM_WITH_MANAGER_COLS.replace("u.email", "NULL");
    match search {
        Some(q) => query_all(
            conn,
            &format!(
                "SELECT {} FROM teams t JOIN users u ON u.id = t.manager_id
                 WHERE t.name LIKE ?1 ESCAPE '\\'
                 ORDER BY t.name COLLATE NOCASE, t.id",
                cols
            ),
            params![like_pattern(q)],
        ),
        None => query_all(
            conn,
            &format!(
                "SELECT {} FROM teams t JOIN users u ON u.id = t.manager_id
                 ORDER BY t.name COLLATE NOCASE, t.id",
                cols
            ),
            [],
        ),
    }
}

/// Teams the user holds a membership row in.
pub fn list_teams_for_member(conn: &Connection, user_id: &str) -> Result<Vec<Team>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM teams WHERE id IN (SELECT team_id FROM team_members WHERE user_id = ?1)
             ORDER BY name COLLATE NOCASE, id",
            TEAM_COLS
        ),
        params![user_id],
    )
}

pub fn list_teams_managed_by(conn: &Connection, manager_id: &str) -> Result<Vec<Team>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM teams WHERE manager_id = ?1 ORDER BY name COLLATE NOCASE, id",
            TEAM_COLS
        ),
        params![manager_id],
    )
}

/// Team with its manager (including email) and full member list.
pub fn get_team_with_members(conn: &Connection, team_id: &str) -> Result<Option<TeamWithMembers>> {
    let header: Option<TeamWithManager> = query_one(
        conn,
        &format!(
            "SELECT {} FROM teams t JOIN users u ON u.id = t.manager_id WHERE t.id = ?1",
            TEAM_WITH_MANAGER_COLS
        ),
        params![team_id],
    )?;

    let Some(TeamWithManager { team, manager }) = header else {
        return Ok(None);
    };

    let members = list_team_members_with_user(conn, &team.id)?;
    Ok(Some(TeamWithMembers {
        team,
        manager,
        members,
    }))
}

/// Every team the manager owns, each with its members. Members for all teams are
/// fetched in a single query and grouped here.
pub fn list_managed_teams_with_members(
    conn: &Connection,
    manager_id: &str,
) -> Result<Vec<TeamWithMembers>> {
    let manager = get_user_by_id(conn, manager_id)?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    let teams = list_teams_managed_by(conn, manager_id)?;

    let mut stmt = conn.prepare(&format!(
        "SELECT tm.team_id, {} FROM team_members tm
         JOIN users u ON u.id = tm.user_id
         JOIN teams t ON t.id = tm.team_id
         WHERE t.manager_id = ?1
         ORDER BY tm.created_at, tm.rowid",
        TEAM_MEMBER_WITH_USER_COLS
    ))?;
    let rows = stmt.query_map(params![manager_id], |row| {
        let team_id: String = row.get(0)?;
        let member = TeamMemberWithUser {
            id: row.get(1)?,
            user_id: row.get(2)?,
            name: row.get(3)?,
            email: row.get(4)?,
            mobile: row.get(5)?,
            role_in_team: row.get(6)?,
            joined_at: row.get(7)?,
        };
        Ok((team_id, member))
    })?;

    let mut by_team: HashMap<String, Vec<TeamMemberWithUser>> = HashMap::new();
    for row in rows {
        let (team_id, member) = row?;
        by_team.entry(team_id).or_default().push(member);
    }

    let summary = UserSummary::from(&manager);
    Ok(teams
        .into_iter()
        .map(|team| TeamWithMembers {
            members: by_team.remove(&team.id).unwrap_or_default(),
            manager: summary.clone(),
            team,
        })
        .collect())
}

// ============ Team Members ============

/// Add a membership row. A second row for the same (team, user) is a `Conflict`.
pub fn add_team_member(
    conn: &Connection,
    team_id: &str,
    user_id: &str,
    role_in_team: Option<&str>,
) -> Result<TeamMember> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO team_members (id, team_id, user_id, role_in_team, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![&id, team_id, user_id, role_in_team, now],
    )
    .map_err(|e| conflict_on_unique(e, "User is already a member of this team"))?;

    Ok(TeamMember {
        id,
        team_id: team_id.to_string(),
        user_id: user_id.to_string(),
        role_in_team: role_in_team.map(String::from),
        created_at: now,
    })
}

/// Add a membership unless one already exists. Returns whether a row was inserted.
pub fn add_team_member_if_absent(
    conn: &Connection,
    team_id: &str,
    user_id: &str,
    role_in_team: Option<&str>,
) -> Result<bool> {
    let affected = conn.execute(
        "INSERT OR IGNORE INTO team_members (id, team_id, user_id, role_in_team, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![gen_id(), team_id, user_id, role_in_team, now()],
    )?;
    Ok(affected > 0)
}

pub fn get_team_member(
    conn: &Connection,
    team_id: &str,
    user_id: &str,
) -> Result<Option<TeamMember>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM team_members WHERE team_id = ?1 AND user_id = ?2",
            TEAM_MEMBER_COLS
        ),
        params![team_id, user_id],
    )
}

pub fn is_team_member(conn: &Connection, team_id: &str, user_id: &str) -> Result<bool> {
    Ok(get_team_member(conn, team_id, user_id)?.is_some())
}

pub fn list_team_members_with_user(
    conn: &Connection,
    team_id: &str,
) -> Result<Vec<TeamMemberWithUser>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM team_members tm JOIN users u ON u.id = tm.user_id
             WHERE tm.team_id = ?1 ORDER BY tm.created_at, tm.rowid",
            TEAM_MEMBER_WITH_USER_COLS
        ),
        params![team_id],
    )
}

pub fn count_team_members(conn: &Connection, team_id: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM team_members WHERE team_id = ?1",
        params![team_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ============ Join Requests ============

/// Open a pending request. A second pending request for the same (team, user)
/// violates the partial unique index and comes back as `Conflict`.
pub fn create_join_request(conn: &Connection, team_id: &str, user_id: &str) -> Result<JoinRequest> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO join_requests (id, team_id, user_id, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'pending', ?4, ?5)",
        params![&id, team_id, user_id, now, now],
    )
    .map_err(|e| conflict_on_unique(e, "Join request already pending"))?;

    Ok(JoinRequest {
        id,
        team_id: team_id.to_string(),
        user_id: user_id.to_string(),
        status: JoinRequestStatus::Pending,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_join_request_by_id(conn: &Connection, id: &str) -> Result<Option<JoinRequest>> {
    query_one(
        conn,
        &format!("SELECT {} FROM join_requests WHERE id = ?1", JOIN_REQUEST_COLS),
        params![id],
    )
}

pub fn get_pending_join_request(
    conn: &Connection,
    team_id: &str,
    user_id: &str,
) -> Result<Option<JoinRequest>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM join_requests
             WHERE team_id = ?1 AND user_id = ?2 AND status = 'pending'",
            JOIN_REQUEST_COLS
        ),
        params![team_id, user_id],
    )
}

/// Delete the user's pending request for the team. Returns whether one existed.
pub fn cancel_pending_join_request(conn: &Connection, team_id: &str, user_id: &str) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM join_requests WHERE team_id = ?1 AND user_id = ?2 AND status = 'pending'",
        params![team_id, user_id],
    )?;
    Ok(deleted > 0)
}

/// All of a user's requests, newest first.
pub fn list_join_requests_for_user(
    conn: &Connection,
    user_id: &str,
) -> Result<Vec<JoinRequestWithTeam>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM join_requests jr JOIN teams t ON t.id = jr.team_id
             WHERE jr.user_id = ?1 ORDER BY jr.created_at DESC, jr.rowid DESC",
            JOIN_REQUEST_WITH_TEAM_COLS
        ),
        params![user_id],
    )
}

/// Pending requests on every team the manager owns, newest first.
pub fn list_pending_requests_for_manager(
    conn: &Connection,
    manager_id: &str,
) -> Result<Vec<JoinRequestWithRequester>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM join_requests jr
             JOIN teams t ON t.id = jr.team_id
             JOIN users u ON u.id = jr.user_id
             WHERE t.manager_id = ?1 AND jr.status = 'pending'
             ORDER BY jr.created_at DESC, jr.rowid DESC",
            JOIN_REQUEST_WITH_REQUESTER_COLS
        ),
        params![manager_id],
    )
}

/// Move a request out of `pending` only if it is still pending. Returns whether
/// this call performed the transition.
fn try_resolve_join_request(
    conn: &Connection,
    id: &str,
    status: JoinRequestStatus,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE join_requests SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = 'pending'",
        params![status.as_ref(), now(), id],
    )?;
    Ok(affected > 0)
}

/// Approve a pending request and create the requester's membership, atomically.
///
/// The status flip is a compare-and-swap inside an IMMEDIATE transaction, so of
/// two concurrent approvals exactly one proceeds; the other sees `NotFound`.
/// If the requester already holds a membership row, the unique constraint
/// rejects the insert and the whole transaction rolls back with `Conflict`,
/// leaving the request pending.
pub fn approve_join_request(conn: &mut Connection, id: &str) -> Result<(JoinRequest, TeamMember)> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if !try_resolve_join_request(&tx, id, JoinRequestStatus::Approved)? {
        return Err(AppError::NotFound("Pending request not found".into()));
    }

    let request = get_join_request_by_id(&tx, id)?
        .ok_or_else(|| AppError::Internal("Join request vanished during approval".into()))?;

    let member = add_team_member(&tx, &request.team_id, &request.user_id, None)?;

    tx.commit()?;
    Ok((request, member))
}

/// Reject a pending request. No membership side effect.
pub fn reject_join_request(conn: &Connection, id: &str) -> Result<JoinRequest> {
    if !try_resolve_join_request(conn, id, JoinRequestStatus::Rejected)? {
        return Err(AppError::NotFound("Pending request not found".into()));
    }
    get_join_request_by_id(conn, id)?
        .ok_or_else(|| AppError::Internal("Join request vanished during rejection".into()))
}

// ============ Projects ============

pub fn create_project(
    conn: &Connection,
    name: &str,
    description: Option<&str>,
    status: ProjectStatus,
    team: &Team,
) -> Result<Project> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO projects (id, name, description, status, team_id, manager_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            &id,
            name,
            description,
            status.as_ref(),
            &team.id,
            &team.manager_id,
            now,
            now
        ],
    )?;

    Ok(Project {
        id,
        name: name.to_string(),
        description: description.map(String::from),
        status,
        team_id: team.id.clone(),
        manager_id: team.manager_id.clone(),
        created_at: now,
        updated_at: now,
    })
}

pub fn get_project_by_id(conn: &Connection, id: &str) -> Result<Option<Project>> {
    query_one(
        conn,
        &format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLS),
        params![id],
    )
}

/// Projects the user manages or whose team the user belongs to, newest first.
pub fn list_accessible_projects(conn: &Connection, user_id: &str) -> Result<Vec<Project>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM projects
             WHERE manager_id = ?1
                OR team_id IN (SELECT team_id FROM team_members WHERE user_id = ?1)
             ORDER BY created_at DESC, rowid DESC",
            PROJECT_COLS
        ),
        params![user_id],
    )
}

/// The manager's teams that have at least one planned or in-progress project,
/// each with those projects (newest first).
pub fn list_teams_with_active_projects(
    conn: &Connection,
    manager_id: &str,
) -> Result<Vec<TeamWithProjects>> {
    let teams = list_teams_managed_by(conn, manager_id)?;
    let projects: Vec<Project> = query_all(
        conn,
        &format!(
            "SELECT {} FROM projects WHERE manager_id = ?1 ORDER BY created_at DESC, rowid DESC",
            PROJECT_COLS
        ),
        params![manager_id],
    )?;

    let mut by_team: HashMap<String, Vec<Project>> = HashMap::new();
    for project in projects.into_iter().filter(|p| p.status.is_active()) {
        by_team.entry(project.team_id.clone()).or_default().push(project);
    }

    Ok(teams
        .into_iter()
        .filter_map(|team| {
            by_team
                .remove(&team.id)
                .map(|projects| TeamWithProjects { team, projects })
        })
        .collect())
}

pub fn update_project(conn: &Connection, id: &str, changes: &ProjectChanges) -> Result<bool> {
    let builder = UpdateBuilder::new("projects", id)
        .set_opt("name", changes.name.clone())
        .set_opt("status", changes.status.map(|s| s.as_ref().to_string()));
    let builder = match &changes.description {
        Some(description) => builder.set_nullable("description", description.clone()),
        None => builder,
    };
    builder.execute(conn)
}

// ============ Tasks ============

pub fn create_task(conn: &Connection, project_id: &str, input: &NewTask) -> Result<Task> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO tasks (id, project_id, title, status, created_by, assigned_to, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            &id,
            project_id,
            &input.title,
            input.status.as_ref(),
            &input.created_by,
            &input.assigned_to,
            now,
            now
        ],
    )?;

    Ok(Task {
        id,
        project_id: project_id.to_string(),
        title: input.title.clone(),
        status: input.status,
        created_by: input.created_by.clone(),
        assigned_to: input.assigned_to.clone(),
        created_at: now,
        updated_at: now,
    })
}

/// Fetch a task only if it belongs to `project_id`.
pub fn get_task(conn: &Connection, project_id: &str, task_id: &str) -> Result<Option<Task>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM tasks WHERE id = ?1 AND project_id = ?2",
            TASK_COLS
        ),
        params![task_id, project_id],
    )
}

pub fn list_tasks_for_project(conn: &Connection, project_id: &str) -> Result<Vec<Task>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM tasks WHERE project_id = ?1 ORDER BY created_at, rowid",
            TASK_COLS
        ),
        params![project_id],
    )
}

pub fn update_task(conn: &Connection, id: &str, changes: &TaskChanges) -> Result<bool> {
    let builder = UpdateBuilder::new("tasks", id)
        .set_opt("title", changes.title.clone())
        .set_opt("status", changes.status.map(|s| s.as_ref().to_string()));
    let builder = match &changes.assigned_to {
        Some(assignee) => builder.set_nullable("assigned_to", assignee.clone()),
        None => builder,
    };
    builder.execute(conn)
}

/// Delete a task only if it belongs to `project_id`. Returns whether it existed.
pub fn delete_task(conn: &Connection, project_id: &str, task_id: &str) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM tasks WHERE id = ?1 AND project_id = ?2",
        params![task_id, project_id],
    )?;
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("core"), "%core%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }
}
