//! Deck repository queries.
//!
//! Writes that target an existing deck carry `AND author = ?` in the
//! statement itself and treat zero affected rows as `DeckNotFound`; "not
//! found" and "not yours" are deliberately the same outcome so identifiers
//! cannot be enumerated through error responses. Reads are universal.

use serde_json::Value;
use sqlx::SqlitePool;

use crate::db::{search, users, SummaryRow, SUMMARY_COLUMNS};
use crate::error::AppError;
use crate::models::{validate, CodeAndSummary, Deck, EditableDeck, Summary};
use crate::services::patch;

fn to_stored(deck: &EditableDeck) -> Result<String, AppError> {
    serde_json::to_string(deck).map_err(|e| AppError::Internal(format!("Failed to serialize deck: {e}")))
}

/// Validates and persists a new deck, returning its identifier. The record
/// starts at version 1 with the creating caller as author.
pub async fn create_deck(pool: &SqlitePool, initial: Value, author_id: &str) -> Result<i64, AppError> {
    let deck = validate(initial)?;

    let id: i64 = sqlx::query_scalar("INSERT INTO decks (deck, author) VALUES (?, ?) RETURNING id")
        .bind(to_stored(&deck)?)
        .bind(author_id)
        .fetch_one(pool)
        .await?;

    let author = users::get_user_name(pool, author_id).await?.unwrap_or_default();
    search::index_deck(pool, id, &deck, &author).await;

    Ok(id)
}

/// Fetches a deck by identifier. No ownership filter: reads are universal.
pub async fn get_deck(pool: &SqlitePool, id: i64) -> Result<Deck, AppError> {
    let row: Option<(String, String, i64)> = sqlx::query_as(
        r#"
        SELECT decks.deck, users.name, decks.version
        FROM decks JOIN users ON users.id = decks.author
        WHERE decks.id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let (stored, author, version) = row.ok_or(AppError::DeckNotFound)?;
    let editable: EditableDeck = serde_json::from_str(&stored)
        .map_err(|e| AppError::Internal(format!("Stored deck {id} is corrupt: {e}")))?;

    Ok(Deck {
        editable,
        author,
        version,
    })
}

/// All decks owned by an author, public or not, most recent first.
pub async fn get_decks_for_author(pool: &SqlitePool, author_id: &str) -> Result<Vec<Deck>, AppError> {
    let rows: Vec<(i64, String, String, i64)> = sqlx::query_as(
        r#"
        SELECT decks.id, decks.deck, users.name, decks.version
        FROM decks JOIN users ON users.id = decks.author
        WHERE decks.author = ?
        ORDER BY decks.id DESC
        "#,
    )
    .bind(author_id)
    .fetch_all(pool)
    .await?;

    let mut decks = Vec::with_capacity(rows.len());
    for (id, stored, author, version) in rows {
        let editable: EditableDeck = serde_json::from_str(&stored)
            .map_err(|e| AppError::Internal(format!("Stored deck {id} is corrupt: {e}")))?;
        decks.push(Deck {
            editable,
            author,
            version,
        });
    }
    Ok(decks)
}

pub async fn get_summary(pool: &SqlitePool, id: i64) -> Result<Summary, AppError> {
    let sql = format!("SELECT {SUMMARY_COLUMNS} FROM summaries WHERE id = ?");
    let row: Option<SummaryRow> = sqlx::query_as(&sql).bind(id).fetch_optional(pool).await?;
    Ok(row.ok_or(AppError::DeckNotFound)?.into_summary())
}

/// Listing projections for an author's own decks, most recent first.
/// `public_only` restricts to decks flagged for discovery.
pub async fn get_summaries_for_author(
    pool: &SqlitePool,
    author_id: &str,
    public_only: bool,
) -> Result<Vec<CodeAndSummary>, AppError> {
    let mut sql = format!("SELECT {SUMMARY_COLUMNS} FROM summaries WHERE author_id = ?");
    if public_only {
        sql.push_str(" AND public = 1");
    }
    sql.push_str(" ORDER BY id DESC");

    let rows: Vec<SummaryRow> = sqlx::query_as(&sql).bind(author_id).fetch_all(pool).await?;
    Ok(rows.into_iter().map(SummaryRow::into_code_and_summary).collect())
}

/// Applies a patch to the stored deck and persists the result.
///
/// The patch runs against the full serialized deck, `author` and `version`
/// included, so a client can guard with `{"op": "test", "path": "/version"}`
/// and turn the patch language into an optimistic-concurrency check. The
/// editable subset is then re-validated (server fields stripped; any
/// violation is `BadPatch`) and written conditioned on ownership, advancing
/// `version` in the same statement. Nothing is written on any failure.
pub async fn update_deck(
    pool: &SqlitePool,
    id: i64,
    author_id: &str,
    ops: &json_patch::Patch,
) -> Result<Deck, AppError> {
    let current = get_deck(pool, id).await?;

    let mut doc = serde_json::to_value(&current)
        .map_err(|e| AppError::Internal(format!("Failed to serialize deck {id}: {e}")))?;
    patch::apply(&mut doc, ops)?;

    // A syntactically fine patch can still produce content that breaks the
    // authoring rules; that is a bad patch, not a bad deck.
    let updated = validate(doc).map_err(|_| AppError::BadPatch)?;

    let version: Option<i64> = sqlx::query_scalar(
        "UPDATE decks SET deck = ?, version = version + 1 WHERE id = ? AND author = ? RETURNING version",
    )
    .bind(to_stored(&updated)?)
    .bind(id)
    .bind(author_id)
    .fetch_optional(pool)
    .await?;
    let version = version.ok_or(AppError::DeckNotFound)?;

    search::index_deck(pool, id, &updated, &current.author).await;

    Ok(Deck {
        editable: updated,
        author: current.author,
        version,
    })
}

/// Deletes a deck; the ownership check lives in the DELETE itself.
pub async fn delete_deck(pool: &SqlitePool, id: i64, author_id: &str) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM decks WHERE id = ? AND author = ?")
        .bind(id)
        .bind(author_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::DeckNotFound);
    }

    search::deindex_deck(pool, id).await;
    Ok(())
}

/// Removes every deck an author owns. Called explicitly when an account is
/// deleted; deck removal is never an implicit storage cascade.
pub async fn delete_decks_for_author(pool: &SqlitePool, author_id: &str) -> Result<(), AppError> {
    let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM decks WHERE author = ?")
        .bind(author_id)
        .fetch_all(pool)
        .await?;

    sqlx::query("DELETE FROM decks WHERE author = ?")
        .bind(author_id)
        .execute(pool)
        .await?;

    for id in ids {
        search::deindex_deck(pool, id).await;
    }
    Ok(())
}
