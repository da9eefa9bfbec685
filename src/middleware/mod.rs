mod project_auth;
mod user_auth;

pub use project_auth::*;
pub use user_auth::*;
