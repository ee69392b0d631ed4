//! Data access layer.
//!
//! - `decks`: the deck repository (create/read/update/delete, ownership-gated
//!   writes, version advancement).
//! - `search`: the discovery index (browse plus full-text index upkeep).
//! - `users`: identity records.
//!
//! Each function borrows the pool and holds a connection only for the single
//! operation; the pool returns it on every exit path, including errors.

use crate::models::{CodeAndSummary, Summary};
use crate::services::code;

pub mod decks;
pub mod search;
pub mod users;

pub use decks::*;
pub use search::*;
pub use users::*;

/// One row of the `summaries` view. Internal: the id never leaves the db
/// layer except encoded as an opaque code.
#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    id: i64,
    name: String,
    author: String,
    language: Option<String>,
    calls: i64,
    responses: i64,
    public: bool,
    version: i64,
}

impl SummaryRow {
    fn into_summary(self) -> Summary {
        Summary {
            name: self.name,
            author: self.author,
            language: self.language,
            calls: self.calls,
            responses: self.responses,
            public: self.public,
            version: self.version,
        }
    }

    fn into_code_and_summary(self) -> CodeAndSummary {
        let code = code::encode(self.id);
        CodeAndSummary {
            code,
            summary: self.into_summary(),
        }
    }
}

const SUMMARY_COLUMNS: &str = "id, name, author, language, calls, responses, public, version";
