//! Download Token Repository
//!
//! Consumption is decrement-if-positive in a single UPDATE, so two
//! simultaneous requests can never both spend the last download.

use super::RepoResult;
use shared::models::DownloadToken;
use shared::util::{now_millis, snowflake_id};
use sqlx::{Sqlite, SqlitePool};

const COLUMNS: &str = "id, token, order_id, product_id, source_file, downloads_remaining, expires_at, created_at";

pub async fn insert<'e, E>(
    executor: E,
    token: &str,
    order_id: i64,
    product_id: i64,
    source_file: &str,
    downloads_remaining: i64,
    expires_at: i64,
) -> RepoResult<i64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO download_token (id, token, order_id, product_id, source_file, downloads_remaining, expires_at, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(id)
    .bind(token)
    .bind(order_id)
    .bind(product_id)
    .bind(source_file)
    .bind(downloads_remaining)
    .bind(expires_at)
    .bind(now_millis())
    .execute(executor)
    .await?;
    Ok(id)
}

pub async fn find_by_token(pool: &SqlitePool, token: &str) -> RepoResult<Option<DownloadToken>> {
    let row = sqlx::query_as::<_, DownloadToken>(&format!(
        "SELECT {COLUMNS} FROM download_token WHERE token = ?"
    ))
    .bind(token)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Atomic decrement-if-valid: spends one download and returns the updated row,
/// or `None` when the token is unknown, expired or exhausted (the caller
/// re-reads to tell those apart).
pub async fn consume(pool: &SqlitePool, token: &str) -> RepoResult<Option<DownloadToken>> {
    let row = sqlx::query_as::<_, DownloadToken>(&format!(
        "UPDATE download_token \
         SET downloads_remaining = downloads_remaining - 1 \
         WHERE token = ?1 AND downloads_remaining > 0 AND expires_at > ?2 \
         RETURNING {COLUMNS}"
    ))
    .bind(token)
    .bind(now_millis())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
