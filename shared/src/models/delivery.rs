//! Delivery Models

use serde::{Deserialize, Serialize};

use super::product::ProductKind;

/// One delivered unit: a key, link, account string, or a download-token
/// reference. Created exactly once per order-line unit; never regenerated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DeliveryItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub item_type: ProductKind,
    /// The key/link/account string, or an opaque download token
    pub content: String,
    pub issued_at: i64,
}

/// Rate-limited download grant for SOURCE_CODE products
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DownloadToken {
    pub id: i64,
    /// Opaque token handed to the buyer
    pub token: String,
    pub order_id: i64,
    pub product_id: i64,
    /// File reference (relative to the files dir)
    pub source_file: String,
    pub downloads_remaining: i64,
    pub expires_at: i64,
    pub created_at: i64,
}

/// Undistributed pool item for STOCK_BASED products. Claimed by an order via
/// an atomic compare-and-claim on `order_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StockItem {
    pub id: i64,
    pub product_id: i64,
    pub content: String,
    pub order_id: Option<i64>,
    pub distributed_at: Option<i64>,
    pub created_at: i64,
}
