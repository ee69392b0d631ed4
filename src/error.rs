//! The application error taxonomy and its mapping onto HTTP responses.
//!
//! Every failure a handler can return is one of these kinds. The body is
//! always `{"error": <kind>}`; unclassified failures (database, serialization)
//! are logged and surfaced only as a generic internal error so no storage
//! detail reaches the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Submitted content fails the deck schema or authoring invariants.
    #[error("The given deck was invalid.")]
    BadDeck,

    /// A patch was malformed, inapplicable, or produced invalid content.
    #[error("The given patch was invalid or produced invalid results.")]
    BadPatch,

    /// A patch `test` operation did not match current state. The caller
    /// should re-fetch and retry; this is the lost-update signal.
    #[error("There was a conflict.")]
    PatchTestFailed,

    /// The identifier does not decode, no record exists, or the caller does
    /// not own the deck on a write. The three are deliberately
    /// indistinguishable to avoid identifier enumeration.
    #[error("Deck not found.")]
    DeckNotFound,

    /// Caller identity could not be established.
    #[error("Authentication failure.")]
    AuthFailure,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = match self {
            AppError::BadDeck => (StatusCode::BAD_REQUEST, "BadDeck"),
            AppError::BadPatch => (StatusCode::BAD_REQUEST, "BadPatch"),
            AppError::PatchTestFailed => (StatusCode::PRECONDITION_FAILED, "PatchTestFailed"),
            AppError::DeckNotFound => (StatusCode::NOT_FOUND, "DeckNotFound"),
            AppError::AuthFailure => (StatusCode::BAD_REQUEST, "AuthFailure"),
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "InternalServerError")
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "InternalServerError")
            }
        };

        (status, Json(json!({ "error": kind }))).into_response()
    }
}
