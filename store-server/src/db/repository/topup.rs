//! Manual Top-Up Request Repository
//!
//! Requests are created by users and transitioned only by admin review. The
//! review is a compare-and-set so a request cannot be settled twice.

use super::{RepoError, RepoResult};
use shared::models::{TopUpCreate, TopUpRequest, TopUpStatus};
use shared::util::{now_millis, snowflake_id};
use sqlx::{Sqlite, SqlitePool};

const COLUMNS: &str = "id, user_id, gross_idr, method, proof_url, status, reviewer_note, reviewed_by, reviewed_at, created_at";

pub async fn create(pool: &SqlitePool, user_id: i64, data: TopUpCreate) -> RepoResult<TopUpRequest> {
    if data.gross_idr <= 0 {
        return Err(RepoError::Validation("Top-up amount must be positive".into()));
    }
    if data.method.trim().is_empty() {
        return Err(RepoError::Validation("Top-up method is required".into()));
    }

    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO topup_request (id, user_id, gross_idr, method, proof_url, status, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, 'PENDING', ?6)",
    )
    .bind(id)
    .bind(user_id)
    .bind(data.gross_idr)
    .bind(data.method.trim())
    .bind(&data.proof_url)
    .bind(now_millis())
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create top-up request".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<TopUpRequest>> {
    let row = sqlx::query_as::<_, TopUpRequest>(&format!(
        "SELECT {COLUMNS} FROM topup_request WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<TopUpRequest>> {
    let rows = sqlx::query_as::<_, TopUpRequest>(&format!(
        "SELECT {COLUMNS} FROM topup_request WHERE user_id = ? ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_all(
    pool: &SqlitePool,
    status: Option<TopUpStatus>,
    limit: i64,
    offset: i64,
) -> RepoResult<Vec<TopUpRequest>> {
    let rows = match status {
        Some(status) => {
            sqlx::query_as::<_, TopUpRequest>(&format!(
                "SELECT {COLUMNS} FROM topup_request WHERE status = ? ORDER BY created_at DESC LIMIT ? OFFSET ?"
            ))
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, TopUpRequest>(&format!(
                "SELECT {COLUMNS} FROM topup_request ORDER BY created_at DESC LIMIT ? OFFSET ?"
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
    };
    Ok(rows)
}

/// Compare-and-set review: PENDING → SETTLED/REJECTED. Returns `false` when
/// the request was already reviewed.
pub async fn review<'e, E>(
    executor: E,
    id: i64,
    to: TopUpStatus,
    reviewed_by: i64,
    note: Option<&str>,
) -> RepoResult<bool>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE topup_request SET status = ?1, reviewer_note = ?2, reviewed_by = ?3, reviewed_at = ?4 \
         WHERE id = ?5 AND status = 'PENDING'",
    )
    .bind(to)
    .bind(note)
    .bind(reviewed_by)
    .bind(now_millis())
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}
