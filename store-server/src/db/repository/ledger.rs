//! Wallet Ledger Repository
//!
//! Append-only. Balance is always `SUM(amount_idr)` per user — never a stored
//! column. The debit path is a guarded single-statement insert so that two
//! concurrent checkouts cannot jointly overdraw.

use super::{RepoError, RepoResult};
use shared::models::{LedgerEntry, LedgerKind};
use shared::util::{now_millis, snowflake_id};
use sqlx::{Sqlite, SqlitePool};

const COLUMNS: &str = "id, user_id, amount_idr, kind, reference, created_at";

/// Derived wallet balance: signed sum of the user's ledger entries
pub async fn balance(pool: &SqlitePool, user_id: i64) -> RepoResult<i64> {
    let sum = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(amount_idr), 0) FROM ledger_entry WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(sum)
}

pub async fn entries(pool: &SqlitePool, user_id: i64, limit: i64) -> RepoResult<Vec<LedgerEntry>> {
    let rows = sqlx::query_as::<_, LedgerEntry>(&format!(
        "SELECT {COLUMNS} FROM ledger_entry WHERE user_id = ? ORDER BY id DESC LIMIT ?"
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Append a ledger entry (TOPUP / REFUND / ADJUST — anything but the guarded
/// debit). `amount_idr` is signed.
pub async fn insert<'e, E>(
    executor: E,
    user_id: i64,
    amount_idr: i64,
    kind: LedgerKind,
    reference: &str,
) -> RepoResult<i64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    if amount_idr == 0 {
        return Err(RepoError::Validation("Ledger amount must be non-zero".into()));
    }
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO ledger_entry (id, user_id, amount_idr, kind, reference, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(id)
    .bind(user_id)
    .bind(amount_idr)
    .bind(kind)
    .bind(reference)
    .bind(now_millis())
    .execute(executor)
    .await?;
    Ok(id)
}

/// Guarded debit: inserts `-total_idr` only if the derived balance covers it.
/// Returns `false` (no row written) on insufficient balance. The balance
/// re-read and the insert are one statement, so concurrent debits against the
/// same user serialize on the writer lock.
pub async fn insert_debit_guarded<'e, E>(
    executor: E,
    user_id: i64,
    total_idr: i64,
    reference: &str,
) -> RepoResult<bool>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "INSERT INTO ledger_entry (id, user_id, amount_idr, kind, reference, created_at) \
         SELECT ?1, ?2, ?3, 'DEBIT', ?4, ?5 \
         WHERE (SELECT COALESCE(SUM(amount_idr), 0) FROM ledger_entry WHERE user_id = ?2) + ?3 >= 0",
    )
    .bind(snowflake_id())
    .bind(user_id)
    .bind(-total_idr)
    .bind(reference)
    .bind(now_millis())
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}
