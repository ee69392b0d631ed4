//! Discovery over public decks, backed by an FTS5 index.
//!
//! The index (`decks_fts`) is a plain FTS5 table keyed by deck rowid over the
//! deck name, author name, and deck text. It is maintained best-effort on
//! every deck write: an index failure must never fail the write itself, it
//! only degrades search until the deck is next written. Renaming a user does
//! not reindex their decks; search sees the old author name until then.
//!
//! Browse reads the `summaries` view, so results always reflect the document
//! of record.

use sqlx::SqlitePool;

use crate::db::{SummaryRow, SUMMARY_COLUMNS};
use crate::error::AppError;
use crate::models::{CodeAndSummary, EditableDeck};

pub const PAGE_SIZE: i64 = 20;

/// Ranked, paginated browse over decks flagged public.
///
/// With a query, decks matching the full-text index come first in relevance
/// order and the rest of the public corpus follows in recency order, so
/// paging through browse always walks every public deck. Without a query,
/// public decks in descending identifier order (most recently created
/// first). `language` is an exact match on the deck's language tag. Pages
/// are zero-indexed and `PAGE_SIZE` long; callers stop when a page comes
/// back short.
pub async fn browse(
    pool: &SqlitePool,
    query: Option<&str>,
    language: Option<&str>,
    page: i64,
) -> Result<Vec<CodeAndSummary>, AppError> {
    let offset = page.max(0) * PAGE_SIZE;
    let match_expr = query.map(fts_query).filter(|q| !q.is_empty());

    let rows: Vec<SummaryRow> = match match_expr {
        Some(match_expr) => {
            // Left join onto the match set: matched decks sort first by
            // relevance, unmatched public decks follow by recency.
            let mut sql = format!(
                "SELECT s.{} FROM summaries s \
                 LEFT JOIN (SELECT rowid, rank FROM decks_fts WHERE decks_fts MATCH ?) m \
                 ON m.rowid = s.id \
                 WHERE s.public = 1",
                SUMMARY_COLUMNS.replace(", ", ", s."),
            );
            if language.is_some() {
                sql.push_str(" AND s.language = ?");
            }
            sql.push_str(" ORDER BY m.rowid IS NULL, m.rank, s.id DESC LIMIT ? OFFSET ?");

            let mut query = sqlx::query_as(&sql).bind(match_expr);
            if let Some(language) = language {
                query = query.bind(language);
            }
            query.bind(PAGE_SIZE).bind(offset).fetch_all(pool).await?
        }
        None => {
            let mut sql = format!("SELECT {SUMMARY_COLUMNS} FROM summaries WHERE public = 1");
            if language.is_some() {
                sql.push_str(" AND language = ?");
            }
            sql.push_str(" ORDER BY id DESC LIMIT ? OFFSET ?");

            let mut query = sqlx::query_as(&sql);
            if let Some(language) = language {
                query = query.bind(language);
            }
            query.bind(PAGE_SIZE).bind(offset).fetch_all(pool).await?
        }
    };

    Ok(rows.into_iter().map(SummaryRow::into_code_and_summary).collect())
}

/// Replaces the index entry for a deck. Best-effort: failures are ignored so
/// a broken index can never block a deck write.
pub async fn index_deck(pool: &SqlitePool, id: i64, deck: &EditableDeck, author: &str) {
    let _ = sqlx::query("DELETE FROM decks_fts WHERE rowid = ?")
        .bind(id)
        .execute(pool)
        .await;
    let _ = sqlx::query("INSERT INTO decks_fts (rowid, name, author, words) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind(&deck.name)
        .bind(author)
        .bind(deck.search_text())
        .execute(pool)
        .await;
}

/// Drops a deck's index entry after deletion. Best-effort, as above.
pub async fn deindex_deck(pool: &SqlitePool, id: i64) {
    let _ = sqlx::query("DELETE FROM decks_fts WHERE rowid = ?")
        .bind(id)
        .execute(pool)
        .await;
}

/// Turns free text into an FTS5 MATCH expression. Each whitespace-separated
/// token becomes a quoted phrase term, so caller input can never hit FTS5's
/// query syntax.
fn fts_query(raw: &str) -> String {
    raw.split_whitespace()
        .map(|token| format!("\"{}\"", token.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" ")
}
