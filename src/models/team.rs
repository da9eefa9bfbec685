use serde::{Deserialize, Serialize};

use super::{Project, TeamMemberWithUser, UserSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    pub manager_id: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSummary {
    pub id: String,
    pub name: String,
}

/// Discovery listing entry.
#[derive(Debug, Clone, Serialize)]
pub struct TeamWithManager {
    #[serde(flatten)]
    pub team: Team,
    pub manager: UserSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamWithMembers {
    #[serde(flatten)]
    pub team: Team,
    pub manager: UserSummary,
    pub members: Vec<TeamMemberWithUser>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamWithProjects {
    #[serde(flatten)]
    pub team: Team,
    pub projects: Vec<Project>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateTeam {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub members: Vec<InitialMember>,
}

/// A member listed at team-creation time. Entries missing name, email or
/// mobile are skipped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialMember {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub role_in_team: Option<String>,
}

/// Account created on the fly for an initial member with no existing user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAccount {
    pub email: String,
    pub temporary_password: String,
}

#[derive(Debug, Deserialize)]
pub struct TeamSearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}
