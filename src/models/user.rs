use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use super::{non_empty, parse_field};
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum UserRole {
    #[serde(alias = "project_manager")]
    #[strum(to_string = "manager", serialize = "project_manager")]
    Manager,
    #[serde(alias = "team_member")]
    #[strum(to_string = "member", serialize = "team_member")]
    Member,
    Admin,
}

impl UserRole {
    /// Managers and admins may create teams and projects and review join
    /// requests for the teams they own.
    pub fn can_manage_teams(&self) -> bool {
        matches!(self, UserRole::Manager | UserRole::Admin)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub role: UserRole,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// The slice of a user embedded in other views (team manager, requester).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: Some(user.email.clone()),
        }
    }
}

/// Normalize an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl RegisterUser {
    pub fn validate(&self) -> Result<NewUser> {
        let (Some(name), Some(email), Some(password), Some(mobile), Some(role)) = (
            non_empty(&self.name),
            non_empty(&self.email),
            // Passwords are taken verbatim, only emptiness is checked.
            self.password.as_deref().filter(|p| !p.is_empty()),
            non_empty(&self.mobile),
            non_empty(&self.role),
        ) else {
            return Err(AppError::BadRequest("All fields are required".into()));
        };

        if !email.contains('@') {
            return Err(AppError::BadRequest("Invalid email".into()));
        }

        Ok(NewUser {
            name: name.to_string(),
            email: normalize_email(email),
            password: password.to_string(),
            mobile: mobile.to_string(),
            role: parse_field(role, "role")?,
        })
    }
}

/// A validated registration, ready to be hashed and inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub mobile: String,
    pub role: UserRole,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn role_accepts_legacy_spellings() {
        assert_eq!(UserRole::from_str("project_manager").unwrap(), UserRole::Manager);
        assert_eq!(UserRole::from_str("team_member").unwrap(), UserRole::Member);
        assert_eq!(UserRole::from_str("Admin").unwrap(), UserRole::Admin);
        assert!(UserRole::from_str("owner").is_err());
    }

    #[test]
    fn role_stores_canonical_name() {
        assert_eq!(UserRole::Manager.as_ref(), "manager");
        assert_eq!(UserRole::Member.as_ref(), "member");
        assert_eq!(UserRole::Admin.as_ref(), "admin");
    }

    #[test]
    fn only_managers_and_admins_manage_teams() {
        assert!(UserRole::Manager.can_manage_teams());
        assert!(UserRole::Admin.can_manage_teams());
        assert!(!UserRole::Member.can_manage_teams());
    }

    #[test]
    fn registration_requires_every_field() {
        let input = RegisterUser {
            name: Some("Ada".into()),
            email: Some("ada@example.com".into()),
            password: Some("secret".into()),
            mobile: Some("   ".into()),
            role: Some("member".into()),
        };
        let err = input.validate().unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "All fields are required"));
    }

    #[test]
    fn registration_normalizes_email_and_parses_role() {
        let input = RegisterUser {
            name: Some("Ada".into()),
            email: Some("  Ada@Example.COM ".into()),
            password: Some("secret".into()),
            mobile: Some("555-0100".into()),
            role: Some("project_manager".into()),
        };
        let user = input.validate().unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.role, UserRole::Manager);
    }

    #[test]
    fn registration_rejects_unknown_role() {
        let input = RegisterUser {
            name: Some("Ada".into()),
            email: Some("ada@example.com".into()),
            password: Some("secret".into()),
            mobile: Some("555-0100".into()),
            role: Some("superuser".into()),
        };
        let err = input.validate().unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Invalid role"));
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: "u1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            mobile: "555-0100".into(),
            role: UserRole::Member,
            password_hash: "$argon2id$secret".into(),
            created_at: 0,
            updated_at: 0,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "member");
        assert_eq!(json["createdAt"], 0);
    }
}
