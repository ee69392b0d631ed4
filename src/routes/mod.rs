//! HTTP request handlers.
//!
//! - `decks`: deck CRUD, patching, listing, and public discovery.
//! - `users`: guest sign-in and account upkeep.
//! - `health`: liveness probe.

use axum::{
    routing::{get, patch, post},
    Router,
};

pub mod decks;
pub mod health;
pub mod users;

pub use decks::*;
pub use health::*;
pub use users::*;

/// The API surface, to be nested under `/api`.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/decks", get(browse_decks).post(create_deck))
        .route("/decks/mine", get(list_my_decks))
        .route(
            "/decks/{code}",
            get(get_deck).patch(patch_deck).delete(delete_deck),
        )
        .route("/decks/{code}/summary", get(get_deck_summary))
        .route("/users/guest", post(guest_sign_in))
        .route("/users", patch(rename_user).delete(delete_user))
        .route("/health", get(health_check))
        .with_state(state)
}
