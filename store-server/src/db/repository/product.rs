//! Product Repository
//!
//! The pipeline reads products; the admin surface creates and updates them.

use super::{RepoError, RepoResult};
use shared::models::{Product, ProductCreate, ProductUpdate};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const COLUMNS: &str = "id, name, category_id, price_idr, sale_price_idr, sale_start_at, sale_end_at, kind, stock_type, fulfillment, source_file, is_active, created_at, updated_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let row = sqlx::query_as::<_, Product>(&format!(
        "SELECT {COLUMNS} FROM product WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Load a batch of products by id (for pricing a cart in one query)
pub async fn find_by_ids(pool: &SqlitePool, ids: &[i64]) -> RepoResult<Vec<Product>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
    let sql = format!("SELECT {COLUMNS} FROM product WHERE id IN ({placeholders})");
    let mut query = sqlx::query_as::<_, Product>(&sql);
    for id in ids {
        query = query.bind(id);
    }
    Ok(query.fetch_all(pool).await?)
}

pub async fn find_all(pool: &SqlitePool, limit: i64, offset: i64) -> RepoResult<Vec<Product>> {
    let rows = sqlx::query_as::<_, Product>(&format!(
        "SELECT {COLUMNS} FROM product ORDER BY id DESC LIMIT ? OFFSET ?"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn create(pool: &SqlitePool, data: ProductCreate) -> RepoResult<Product> {
    let id = snowflake_id();
    let now = now_millis();
    sqlx::query(
        "INSERT INTO product (id, name, category_id, price_idr, sale_price_idr, sale_start_at, sale_end_at, kind, stock_type, fulfillment, source_file, is_active, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 1, ?12, ?12)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(data.category_id)
    .bind(data.price_idr)
    .bind(data.sale_price_idr)
    .bind(data.sale_start_at)
    .bind(data.sale_end_at)
    .bind(data.kind)
    .bind(data.stock_type)
    .bind(data.fulfillment)
    .bind(&data.source_file)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create product".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: ProductUpdate) -> RepoResult<Product> {
    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE product SET \
            name = COALESCE(?1, name), \
            category_id = COALESCE(?2, category_id), \
            price_idr = COALESCE(?3, price_idr), \
            sale_price_idr = COALESCE(?4, sale_price_idr), \
            sale_start_at = COALESCE(?5, sale_start_at), \
            sale_end_at = COALESCE(?6, sale_end_at), \
            source_file = COALESCE(?7, source_file), \
            is_active = COALESCE(?8, is_active), \
            updated_at = ?9 \
         WHERE id = ?10",
    )
    .bind(&data.name)
    .bind(data.category_id)
    .bind(data.price_idr)
    .bind(data.sale_price_idr)
    .bind(data.sale_start_at)
    .bind(data.sale_end_at)
    .bind(&data.source_file)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
}
