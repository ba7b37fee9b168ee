//! Promo Engine
//!
//! Validates a discount code against a candidate set of priced order lines
//! and computes the discount:
//!
//! - **matcher**: validity window and scope matching (eligible subtotal)
//! - **calculator**: discount arithmetic (percent rounding, caps)
//! - **engine**: the ordered validation pipeline over the repositories
//!
//! Applying a promo never writes a redemption row — that happens only when
//! the order that used it is paid, so an abandoned checkout never consumes
//! usage quota.

pub mod calculator;
pub mod engine;
pub mod matcher;

use serde::{Deserialize, Serialize};
use shared::models::{FulfillmentMode, ProductKind, PromoCode};

/// A server-priced order line: unit price is authoritative (sale window
/// evaluated at pricing time), client-sent prices are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: i64,
    pub product_name: String,
    pub category_id: i64,
    pub quantity: i64,
    pub unit_price_idr: i64,
    pub line_total_idr: i64,
    pub kind: ProductKind,
    pub fulfillment: FulfillmentMode,
}

/// Result of a successful promo evaluation
#[derive(Debug, Clone)]
pub struct PromoQuote {
    pub promo: PromoCode,
    pub eligible_subtotal_idr: i64,
    pub discount_idr: i64,
}

/// Subtotal over all lines
pub fn subtotal(lines: &[PricedLine]) -> i64 {
    lines.iter().map(|l| l.line_total_idr).sum()
}
