//! Promo Code Model

use serde::{Deserialize, Serialize};

/// Discount kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PromoKind {
    Percent,
    Fixed,
}

/// What the code's discount applies to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PromoScope {
    /// All lines in the order
    Order,
    /// Lines whose category is in the target set
    Category,
    /// Lines whose product is in the target set
    Product,
}

/// Promo code entity. Mutated only by admins; the redemption count is always
/// derived from `promo_redemption` rows, never stored as a counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PromoCode {
    pub id: i64,
    /// Unique, uppercase alphanumeric
    pub code: String,
    pub kind: PromoKind,
    /// Percentage (PERCENT) or IDR amount (FIXED)
    pub value: i64,
    pub start_at: Option<i64>,
    pub end_at: Option<i64>,
    /// 0 disables the check
    pub min_subtotal_idr: i64,
    /// Cap for PERCENT discounts
    pub max_discount_idr: Option<i64>,
    /// Global redemption limit, 0 = unlimited
    pub usage_limit: i64,
    /// Per-user redemption limit, 0 = unlimited
    pub per_user_limit: i64,
    pub scope: PromoScope,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One successful application of a promo code to a paid order. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PromoRedemption {
    pub id: i64,
    pub promo_code_id: i64,
    pub user_id: i64,
    pub order_id: i64,
    pub discount_idr: i64,
    pub created_at: i64,
}

/// Create promo payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoCodeCreate {
    pub code: String,
    pub kind: PromoKind,
    pub value: i64,
    pub start_at: Option<i64>,
    pub end_at: Option<i64>,
    pub min_subtotal_idr: Option<i64>,
    pub max_discount_idr: Option<i64>,
    pub usage_limit: Option<i64>,
    pub per_user_limit: Option<i64>,
    pub scope: PromoScope,
    /// Category/product ids for CATEGORY/PRODUCT scope
    #[serde(default)]
    pub target_ids: Vec<i64>,
}

/// Update promo payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoCodeUpdate {
    pub value: Option<i64>,
    pub start_at: Option<i64>,
    pub end_at: Option<i64>,
    pub min_subtotal_idr: Option<i64>,
    pub max_discount_idr: Option<i64>,
    pub usage_limit: Option<i64>,
    pub per_user_limit: Option<i64>,
    pub is_active: Option<bool>,
    pub target_ids: Option<Vec<i64>>,
}
