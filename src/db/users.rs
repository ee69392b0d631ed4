//! Identity record queries. Real identity verification happens at the token
//! boundary; these rows only carry the display name decks join against.

use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::User;

/// Returns the single guest user, creating it on first use.
pub async fn find_or_create_guest(pool: &SqlitePool) -> Result<User, AppError> {
    let existing: Option<User> = sqlx::query_as("SELECT id, name FROM users WHERE is_guest = 1")
        .fetch_optional(pool)
        .await?;
    if let Some(user) = existing {
        return Ok(user);
    }

    let id = uuid::Uuid::now_v7().to_string();
    let name = "Guest".to_string();
    sqlx::query("INSERT INTO users (id, name, is_guest) VALUES (?, ?, 1)")
        .bind(&id)
        .bind(&name)
        .execute(pool)
        .await?;

    Ok(User { id, name })
}

pub async fn get_user_name(pool: &SqlitePool, id: &str) -> Result<Option<String>, AppError> {
    let name = sqlx::query_scalar("SELECT name FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(name)
}

pub async fn rename_user(pool: &SqlitePool, id: &str, name: &str) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Removes the identity record only. Owned decks are removed by the caller
/// first, as an explicit step.
pub async fn delete_user(pool: &SqlitePool, id: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
