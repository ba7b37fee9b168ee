//! Order Model

use serde::{Deserialize, Serialize};

use super::delivery::DeliveryItem;
use super::product::{FulfillmentMode, ProductKind};

/// Order lifecycle status.
///
/// Legal transitions: `PENDING → {PAID, FAILED, CANCELLED}`,
/// `PAID → {DELIVERED, REFUNDED, FAILED}`. Everything else is rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum OrderStatus {
    Pending,
    Paid,
    Delivered,
    Failed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Whether `self → next` is a legal lifecycle transition
    pub fn can_transition(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Paid)
                | (Pending, Failed)
                | (Pending, Cancelled)
                | (Paid, Delivered)
                | (Paid, Refunded)
                | (Paid, Failed)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Failed => "FAILED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Refunded => "REFUNDED",
        };
        f.write_str(s)
    }
}

/// Settlement path chosen at checkout
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PaymentMethod {
    Balance,
    Gateway,
}

/// Order entity. Immutable once `PAID`, except status and delivery
/// attachments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    /// Human-readable order number shown on invoices
    pub order_no: String,
    pub user_id: i64,
    pub subtotal_idr: i64,
    pub discount_idr: i64,
    pub total_idr: i64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub promo_code: Option<String>,
    /// External payment session reference (GATEWAY orders)
    pub gateway_ref: Option<String>,
    /// Recorded fulfillment error, surfaced to admins for remediation
    pub fulfillment_note: Option<String>,
    pub paid_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line — product fields are snapshots at time of sale
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub category_id: i64,
    pub quantity: i64,
    pub unit_price_idr: i64,
    pub line_total_idr: i64,
    pub kind: ProductKind,
    pub fulfillment: FulfillmentMode,
}

/// Full order detail (for clients and admins)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub delivery_items: Vec<DeliveryItem>,
}

/// Order summary for list views
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderSummary {
    pub id: i64,
    pub order_no: String,
    pub user_id: i64,
    pub total_idr: i64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;

    #[test]
    fn legal_transitions() {
        assert!(Pending.can_transition(Paid));
        assert!(Pending.can_transition(Failed));
        assert!(Pending.can_transition(Cancelled));
        assert!(Paid.can_transition(Delivered));
        assert!(Paid.can_transition(Refunded));
        assert!(Paid.can_transition(Failed));
    }

    #[test]
    fn illegal_transitions() {
        assert!(!Pending.can_transition(Delivered));
        assert!(!Pending.can_transition(Refunded));
        assert!(!Delivered.can_transition(Paid));
        assert!(!Delivered.can_transition(Refunded));
        assert!(!Refunded.can_transition(Paid));
        assert!(!Failed.can_transition(Paid));
        assert!(!Cancelled.can_transition(Paid));
        assert!(!Paid.can_transition(Pending));
    }
}
