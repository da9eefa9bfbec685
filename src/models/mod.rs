mod join_request;
mod project;
mod task;
mod team;
mod team_member;
mod user;

pub use join_request::*;
pub use project::*;
pub use task::*;
pub use team::*;
pub use team_member::*;
pub use user::*;

use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::error::{AppError, Result};

/// Trimmed value of an optional request field, or None when absent or blank.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a request field into one of the model enums, rejecting unknown values
/// with `Invalid <field>`.
pub fn parse_field<E: FromStr>(value: &str, field: &str) -> Result<E> {
    E::from_str(value.trim()).map_err(|_| AppError::BadRequest(format!("Invalid {}", field)))
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
/// in PATCH bodies.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
