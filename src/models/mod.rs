//! Data structures shared across the application.
//!
//! - `deck`: the deck document schema, its authoring validator, and the
//!   listing projections.
//! - `user`: thin identity records and request/response shapes for the
//!   identity boundary.

pub mod deck;
pub mod user;

pub use deck::*;
pub use user::*;
