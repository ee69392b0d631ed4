//! Deck route handlers.
//!
//! ## Endpoints
//! - `GET    /api/decks`                → browse public decks (query/language/page)
//! - `POST   /api/decks`                → create a deck, returns its code (201)
//! - `GET    /api/decks/mine`           → the caller's own decks
//! - `GET    /api/decks/{code}`         → full deck
//! - `GET    /api/decks/{code}/summary` → listing projection
//! - `PATCH  /api/decks/{code}`         → apply a JSON Patch, returns the new deck
//! - `DELETE /api/decks/{code}`         → delete (owner only)
//!
//! Deck bodies and patches arrive as raw JSON: the extractor's rejection is
//! mapped to `BadDeck`/`BadPatch` for unparseable bodies, and well-formed
//! JSON is checked by the validator and patch parser, so malformed input
//! never surfaces as a framework rejection.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use sqlx::SqlitePool;

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::{CodeAndSummary, Deck, Summary},
    services::{code, patch},
};

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize)]
pub struct BrowseParams {
    pub query: Option<String>,
    pub language: Option<String>,
    pub page: Option<i64>,
}

/// `GET /decks` — public deck discovery.
pub async fn browse_decks(
    State(state): State<AppState>,
    Query(params): Query<BrowseParams>,
) -> Result<Json<Vec<CodeAndSummary>>, AppError> {
    let results = db::browse(
        &state.pool,
        params.query.as_deref(),
        params.language.as_deref(),
        params.page.unwrap_or(0),
    )
    .await?;
    Ok(Json(results))
}

/// `POST /decks` — create a deck from an editable document.
pub async fn create_deck(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<String>), AppError> {
    let Json(initial) = body.map_err(|_| AppError::BadDeck)?;
    let id = db::create_deck(&state.pool, initial, &user.user_id).await?;
    Ok((StatusCode::CREATED, Json(code::encode(id))))
}

#[derive(Debug, Deserialize)]
pub struct ListMineParams {
    pub public_only: Option<bool>,
}

/// `GET /decks/mine` — the caller's own decks, most recent first.
pub async fn list_my_decks(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ListMineParams>,
) -> Result<Json<Vec<CodeAndSummary>>, AppError> {
    let summaries = db::get_summaries_for_author(
        &state.pool,
        &user.user_id,
        params.public_only.unwrap_or(false),
    )
    .await?;
    Ok(Json(summaries))
}

/// `GET /decks/{code}` — full deck by external code.
pub async fn get_deck(
    State(state): State<AppState>,
    Path(deck_code): Path<String>,
) -> Result<Json<Deck>, AppError> {
    let id = code::decode(&deck_code)?;
    Ok(Json(db::get_deck(&state.pool, id).await?))
}

/// `GET /decks/{code}/summary` — listing projection by external code.
pub async fn get_deck_summary(
    State(state): State<AppState>,
    Path(deck_code): Path<String>,
) -> Result<Json<Summary>, AppError> {
    let id = code::decode(&deck_code)?;
    Ok(Json(db::get_summary(&state.pool, id).await?))
}

/// `PATCH /decks/{code}` — apply a JSON Patch to a deck.
///
/// 412 on a failed `test` op, 400 on a bad patch, 404 when the deck does not
/// exist or is not the caller's.
pub async fn patch_deck(
    State(state): State<AppState>,
    user: AuthUser,
    Path(deck_code): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Deck>, AppError> {
    let id = code::decode(&deck_code)?;
    let Json(ops) = body.map_err(|_| AppError::BadPatch)?;
    let ops = patch::parse(ops)?;
    Ok(Json(db::update_deck(&state.pool, id, &user.user_id, &ops).await?))
}

/// `DELETE /decks/{code}` — delete a deck the caller owns.
pub async fn delete_deck(
    State(state): State<AppState>,
    user: AuthUser,
    Path(deck_code): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = code::decode(&deck_code)?;
    db::delete_deck(&state.pool, id, &user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
