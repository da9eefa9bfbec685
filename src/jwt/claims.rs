use serde::{Deserialize, Serialize};

/// Custom claims carried by a session token. `id` is the authenticated user's id;
/// the standard claims (`iat`, `exp`, `sub`) are added by the signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub id: String,
}
