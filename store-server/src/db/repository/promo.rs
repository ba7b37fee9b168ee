//! Promo Code Repository
//!
//! Redemption counts are always derived from `promo_redemption` rows. The Nth
//! redemption is written through a guarded insert that re-checks both limits
//! in the same statement, so `usage_limit`/`per_user_limit` hold exactly under
//! concurrent submission.

use super::{RepoError, RepoResult};
use shared::models::{PromoCode, PromoCodeCreate, PromoCodeUpdate};
use shared::util::{now_millis, snowflake_id};
use sqlx::{Sqlite, SqlitePool};

const COLUMNS: &str = "id, code, kind, value, start_at, end_at, min_subtotal_idr, max_discount_idr, usage_limit, per_user_limit, scope, is_active, created_at, updated_at";

pub async fn find_by_code(pool: &SqlitePool, code: &str) -> RepoResult<Option<PromoCode>> {
    let row = sqlx::query_as::<_, PromoCode>(&format!(
        "SELECT {COLUMNS} FROM promo_code WHERE code = ?"
    ))
    .bind(code)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<PromoCode>> {
    let row = sqlx::query_as::<_, PromoCode>(&format!(
        "SELECT {COLUMNS} FROM promo_code WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_all(pool: &SqlitePool, limit: i64, offset: i64) -> RepoResult<Vec<PromoCode>> {
    let rows = sqlx::query_as::<_, PromoCode>(&format!(
        "SELECT {COLUMNS} FROM promo_code ORDER BY id DESC LIMIT ? OFFSET ?"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Category/product ids a CATEGORY/PRODUCT-scoped code applies to
pub async fn targets(pool: &SqlitePool, promo_code_id: i64) -> RepoResult<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT target_id FROM promo_target WHERE promo_code_id = ?",
    )
    .bind(promo_code_id)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

/// Global redemption count for a code
pub async fn redemption_count(pool: &SqlitePool, promo_code_id: i64) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM promo_redemption WHERE promo_code_id = ?",
    )
    .bind(promo_code_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Redemption count for a code by a single user
pub async fn user_redemption_count(
    pool: &SqlitePool,
    promo_code_id: i64,
    user_id: i64,
) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM promo_redemption WHERE promo_code_id = ? AND user_id = ?",
    )
    .bind(promo_code_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Guarded redemption insert: writes the row only while both the global and
/// the per-user count are under their limits (0 = unlimited). Returns `false`
/// when a limit would be exceeded.
pub async fn insert_redemption_guarded<'e, E>(
    executor: E,
    promo_code_id: i64,
    user_id: i64,
    order_id: i64,
    discount_idr: i64,
) -> RepoResult<bool>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "INSERT INTO promo_redemption (id, promo_code_id, user_id, order_id, discount_idr, created_at) \
         SELECT ?1, ?2, ?3, ?4, ?5, ?6 \
         WHERE ( \
             (SELECT usage_limit FROM promo_code WHERE id = ?2) <= 0 \
             OR (SELECT COUNT(*) FROM promo_redemption WHERE promo_code_id = ?2) \
                < (SELECT usage_limit FROM promo_code WHERE id = ?2) \
         ) \
         AND ( \
             (SELECT per_user_limit FROM promo_code WHERE id = ?2) <= 0 \
             OR (SELECT COUNT(*) FROM promo_redemption WHERE promo_code_id = ?2 AND user_id = ?3) \
                < (SELECT per_user_limit FROM promo_code WHERE id = ?2) \
         )",
    )
    .bind(snowflake_id())
    .bind(promo_code_id)
    .bind(user_id)
    .bind(order_id)
    .bind(discount_idr)
    .bind(now_millis())
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn create(pool: &SqlitePool, data: PromoCodeCreate) -> RepoResult<PromoCode> {
    let code = data.code.trim().to_uppercase();
    if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(RepoError::Validation(
            "Promo code must be non-empty uppercase alphanumeric".into(),
        ));
    }
    if find_by_code(pool, &code).await?.is_some() {
        return Err(RepoError::Duplicate(format!("Promo code '{code}' already exists")));
    }

    let id = snowflake_id();
    let now = now_millis();
    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO promo_code (id, code, kind, value, start_at, end_at, min_subtotal_idr, max_discount_idr, usage_limit, per_user_limit, scope, is_active, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 1, ?12, ?12)",
    )
    .bind(id)
    .bind(&code)
    .bind(data.kind)
    .bind(data.value)
    .bind(data.start_at)
    .bind(data.end_at)
    .bind(data.min_subtotal_idr.unwrap_or(0))
    .bind(data.max_discount_idr)
    .bind(data.usage_limit.unwrap_or(0))
    .bind(data.per_user_limit.unwrap_or(0))
    .bind(data.scope)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    for target_id in &data.target_ids {
        sqlx::query(
            "INSERT INTO promo_target (id, promo_code_id, target_id) VALUES (?1, ?2, ?3)",
        )
        .bind(snowflake_id())
        .bind(id)
        .bind(target_id)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create promo code".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: PromoCodeUpdate) -> RepoResult<PromoCode> {
    let now = now_millis();
    let mut tx = pool.begin().await?;
    let rows = sqlx::query(
        "UPDATE promo_code SET \
            value = COALESCE(?1, value), \
            start_at = COALESCE(?2, start_at), \
            end_at = COALESCE(?3, end_at), \
            min_subtotal_idr = COALESCE(?4, min_subtotal_idr), \
            max_discount_idr = COALESCE(?5, max_discount_idr), \
            usage_limit = COALESCE(?6, usage_limit), \
            per_user_limit = COALESCE(?7, per_user_limit), \
            is_active = COALESCE(?8, is_active), \
            updated_at = ?9 \
         WHERE id = ?10",
    )
    .bind(data.value)
    .bind(data.start_at)
    .bind(data.end_at)
    .bind(data.min_subtotal_idr)
    .bind(data.max_discount_idr)
    .bind(data.usage_limit)
    .bind(data.per_user_limit)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Promo code {id} not found")));
    }

    if let Some(target_ids) = &data.target_ids {
        sqlx::query("DELETE FROM promo_target WHERE promo_code_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for target_id in target_ids {
            sqlx::query(
                "INSERT INTO promo_target (id, promo_code_id, target_id) VALUES (?1, ?2, ?3)",
            )
            .bind(snowflake_id())
            .bind(id)
            .bind(target_id)
            .execute(&mut *tx)
            .await?;
        }
    }
    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Promo code {id} not found")))
}
