//! Order Repository
//!
//! Orders are immutable once PAID except status, gateway reference and the
//! fulfillment note. Status changes go through the compare-and-set
//! `transition` so replays and races cannot double-apply.

use super::{RepoError, RepoResult};
use shared::models::{Order, OrderLine, OrderStatus, OrderSummary, PaymentMethod};
use shared::util::{now_millis, snowflake_id};
use sqlx::{Sqlite, SqlitePool};

const COLUMNS: &str = "id, order_no, user_id, subtotal_idr, discount_idr, total_idr, status, payment_method, promo_code, gateway_ref, fulfillment_note, paid_at, created_at, updated_at";
const LINE_COLUMNS: &str = "id, order_id, product_id, product_name, category_id, quantity, unit_price_idr, line_total_idr, kind, fulfillment";
const SUMMARY_COLUMNS: &str = "id, order_no, user_id, total_idr, status, payment_method, created_at";

/// New order row to insert (lines are inserted separately)
pub struct NewOrder<'a> {
    pub id: i64,
    pub order_no: &'a str,
    pub user_id: i64,
    pub subtotal_idr: i64,
    pub discount_idr: i64,
    pub total_idr: i64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub promo_code: Option<&'a str>,
}

pub async fn insert<'e, E>(executor: E, order: &NewOrder<'_>) -> RepoResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let now = now_millis();
    let paid_at = (order.status == OrderStatus::Paid).then_some(now);
    sqlx::query(
        "INSERT INTO orders (id, order_no, user_id, subtotal_idr, discount_idr, total_idr, status, payment_method, promo_code, paid_at, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
    )
    .bind(order.id)
    .bind(order.order_no)
    .bind(order.user_id)
    .bind(order.subtotal_idr)
    .bind(order.discount_idr)
    .bind(order.total_idr)
    .bind(order.status)
    .bind(order.payment_method)
    .bind(order.promo_code)
    .bind(paid_at)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

/// Line snapshot to insert alongside an order
pub struct NewOrderLine<'a> {
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: &'a str,
    pub category_id: i64,
    pub quantity: i64,
    pub unit_price_idr: i64,
    pub kind: shared::models::ProductKind,
    pub fulfillment: shared::models::FulfillmentMode,
}

pub async fn insert_line<'e, E>(executor: E, line: &NewOrderLine<'_>) -> RepoResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO order_line (id, order_id, product_id, product_name, category_id, quantity, unit_price_idr, line_total_idr, kind, fulfillment) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )
    .bind(snowflake_id())
    .bind(line.order_id)
    .bind(line.product_id)
    .bind(line.product_name)
    .bind(line.category_id)
    .bind(line.quantity)
    .bind(line.unit_price_idr)
    .bind(line.unit_price_idr * line.quantity)
    .bind(line.kind)
    .bind(line.fulfillment)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let row = sqlx::query_as::<_, Order>(&format!("SELECT {COLUMNS} FROM orders WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_no(pool: &SqlitePool, order_no: &str) -> RepoResult<Option<Order>> {
    let row = sqlx::query_as::<_, Order>(&format!(
        "SELECT {COLUMNS} FROM orders WHERE order_no = ?"
    ))
    .bind(order_no)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn lines(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderLine>> {
    let rows = sqlx::query_as::<_, OrderLine>(&format!(
        "SELECT {LINE_COLUMNS} FROM order_line WHERE order_id = ? ORDER BY id"
    ))
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_by_user(
    pool: &SqlitePool,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> RepoResult<Vec<OrderSummary>> {
    let rows = sqlx::query_as::<_, OrderSummary>(&format!(
        "SELECT {SUMMARY_COLUMNS} FROM orders WHERE user_id = ? ORDER BY created_at DESC LIMIT ? OFFSET ?"
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_all(
    pool: &SqlitePool,
    status: Option<OrderStatus>,
    limit: i64,
    offset: i64,
) -> RepoResult<Vec<OrderSummary>> {
    let rows = match status {
        Some(status) => {
            sqlx::query_as::<_, OrderSummary>(&format!(
                "SELECT {SUMMARY_COLUMNS} FROM orders WHERE status = ? ORDER BY created_at DESC LIMIT ? OFFSET ?"
            ))
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, OrderSummary>(&format!(
                "SELECT {SUMMARY_COLUMNS} FROM orders ORDER BY created_at DESC LIMIT ? OFFSET ?"
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
    };
    Ok(rows)
}

/// Compare-and-set status transition. Returns `false` when the order was not
/// in `from` (someone else transitioned it first, or a callback replayed).
/// Sets `paid_at` when entering PAID.
pub async fn transition<'e, E>(
    executor: E,
    order_id: i64,
    from: OrderStatus,
    to: OrderStatus,
) -> RepoResult<bool>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let now = now_millis();
    let result = sqlx::query(
        "UPDATE orders SET status = ?1, updated_at = ?2, \
            paid_at = CASE WHEN ?1 = 'PAID' THEN ?2 ELSE paid_at END \
         WHERE id = ?3 AND status = ?4",
    )
    .bind(to)
    .bind(now)
    .bind(order_id)
    .bind(from)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn set_gateway_ref(pool: &SqlitePool, order_id: i64, gateway_ref: &str) -> RepoResult<()> {
    let result = sqlx::query("UPDATE orders SET gateway_ref = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(gateway_ref)
        .bind(now_millis())
        .bind(order_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Order {order_id} not found")));
    }
    Ok(())
}

/// Record a fulfillment error on a paid order for admin remediation
pub async fn set_fulfillment_note(
    pool: &SqlitePool,
    order_id: i64,
    note: &str,
) -> RepoResult<()> {
    sqlx::query("UPDATE orders SET fulfillment_note = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(note)
        .bind(now_millis())
        .bind(order_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Timeout policy: move GATEWAY orders stuck in PENDING since before `cutoff`
/// to FAILED. Returns the number of orders swept.
pub async fn fail_stale_pending(pool: &SqlitePool, cutoff: i64) -> RepoResult<u64> {
    let result = sqlx::query(
        "UPDATE orders SET status = 'FAILED', updated_at = ?1 \
         WHERE status = 'PENDING' AND payment_method = 'GATEWAY' AND created_at < ?2",
    )
    .bind(now_millis())
    .bind(cutoff)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
