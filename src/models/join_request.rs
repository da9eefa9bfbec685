use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use super::{TeamSummary, UserSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JoinRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl JoinRequestStatus {
    /// Approved and rejected requests never transition again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JoinRequestStatus::Pending)
    }
}

/// Manager decision on a pending request, taken from the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ReviewAction {
    Approve,
    Reject,
}

impl ReviewAction {
    pub fn resulting_status(&self) -> JoinRequestStatus {
        match self {
            ReviewAction::Approve => JoinRequestStatus::Approved,
            ReviewAction::Reject => JoinRequestStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub id: String,
    pub team_id: String,
    pub user_id: String,
    pub status: JoinRequestStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A caller's own request, with the team it targets.
#[derive(Debug, Clone, Serialize)]
pub struct JoinRequestWithTeam {
    #[serde(flatten)]
    pub request: JoinRequest,
    pub team: TeamSummary,
}

/// A pending request as the reviewing manager sees it.
#[derive(Debug, Clone, Serialize)]
pub struct JoinRequestWithRequester {
    #[serde(flatten)]
    pub request: JoinRequest,
    pub team: TeamSummary,
    pub requester: UserSummary,
}
