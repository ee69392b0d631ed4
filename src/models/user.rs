use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameUserRequest {
    pub name: String,
}

/// Returned by sign-in: a bearer token carrying the caller's id, plus the
/// display name to show.
#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub token: String,
    pub name: String,
}
