use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: String,
    pub team_id: String,
    pub user_id: String,
    pub role_in_team: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberWithUser {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub role_in_team: Option<String>,
    pub joined_at: i64,
}
