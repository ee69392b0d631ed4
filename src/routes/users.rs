//! Identity boundary handlers: guest sign-in and account upkeep.

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::{
    db,
    error::AppError,
    middleware::auth::{self, AuthUser},
    models::{RenameUserRequest, SignInResponse},
    routes::decks::AppState,
};

/// `POST /users/guest` — sign in as the shared guest user, creating it on
/// first use. Returns a bearer token for subsequent requests.
pub async fn guest_sign_in(State(state): State<AppState>) -> Result<Json<SignInResponse>, AppError> {
    let user = db::find_or_create_guest(&state.pool).await?;
    let token = auth::sign_token(&user.id, &state.jwt_secret)?;
    Ok(Json(SignInResponse {
        token,
        name: user.name,
    }))
}

/// `PATCH /users` — change the caller's display name.
pub async fn rename_user(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<RenameUserRequest>,
) -> Result<Json<Value>, AppError> {
    db::rename_user(&state.pool, &user.user_id, &req.name).await?;
    Ok(Json(json!({ "name": req.name })))
}

/// `DELETE /users` — delete the caller's account.
///
/// Owned decks are removed first as an explicit step; deck removal is a
/// visible secondary effect of account deletion, not a storage cascade.
pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<StatusCode, AppError> {
    db::delete_decks_for_author(&state.pool, &user.user_id).await?;
    db::delete_user(&state.pool, &user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
