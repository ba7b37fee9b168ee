//! Delivery Item Repository
//!
//! One row per delivered unit, written exactly once at fulfillment time.

use super::RepoResult;
use shared::models::{DeliveryItem, ProductKind};
use shared::util::{now_millis, snowflake_id};
use sqlx::{Sqlite, SqlitePool};

const COLUMNS: &str = "id, order_id, product_id, item_type, content, issued_at";

pub async fn insert<'e, E>(
    executor: E,
    order_id: i64,
    product_id: i64,
    item_type: ProductKind,
    content: &str,
) -> RepoResult<i64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO delivery_item (id, order_id, product_id, item_type, content, issued_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(id)
    .bind(order_id)
    .bind(product_id)
    .bind(item_type)
    .bind(content)
    .bind(now_millis())
    .execute(executor)
    .await?;
    Ok(id)
}

pub async fn find_by_order(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<DeliveryItem>> {
    let rows = sqlx::query_as::<_, DeliveryItem>(&format!(
        "SELECT {COLUMNS} FROM delivery_item WHERE order_id = ? ORDER BY id"
    ))
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
