//! Stock Pool Repository
//!
//! Pool items are claimed by setting `order_id` in a single compare-and-claim
//! UPDATE. "Check length then remove" is never used: two concurrent claims on
//! the last item cannot both succeed.

use super::RepoResult;
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

/// Bulk-add undistributed items to a product's pool
pub async fn add_items(
    pool: &SqlitePool,
    product_id: i64,
    contents: &[String],
) -> RepoResult<usize> {
    let now = now_millis();
    let mut tx = pool.begin().await?;
    for content in contents {
        sqlx::query(
            "INSERT INTO stock_item (id, product_id, content, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(snowflake_id())
        .bind(product_id)
        .bind(content)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(contents.len())
}

/// Undistributed item count for a product
pub async fn available_count(pool: &SqlitePool, product_id: i64) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM stock_item WHERE product_id = ? AND order_id IS NULL",
    )
    .bind(product_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Atomically claim one undistributed item for an order and return its
/// content. Returns `None` when the pool is empty.
pub async fn claim_one(
    pool: &SqlitePool,
    product_id: i64,
    order_id: i64,
) -> RepoResult<Option<String>> {
    let now = now_millis();
    let content = sqlx::query_scalar::<_, String>(
        "UPDATE stock_item SET order_id = ?1, distributed_at = ?2 \
         WHERE id = ( \
             SELECT id FROM stock_item \
             WHERE product_id = ?3 AND order_id IS NULL \
             ORDER BY id \
             LIMIT 1 \
         ) \
         RETURNING content",
    )
    .bind(order_id)
    .bind(now)
    .bind(product_id)
    .fetch_optional(pool)
    .await?;
    Ok(content)
}
