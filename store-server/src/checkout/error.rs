//! Pipeline error taxonomy
//!
//! Every error carries enough context (order number, code, shortfall) for the
//! caller to act. Pricing/validation errors are raised before any persistent
//! state exists; fulfillment errors happen after capture and trigger refunds
//! where money was taken.

use axum::http::StatusCode;
use shared::models::OrderStatus;

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("insufficient balance: have {balance_idr}, need {total_idr} (short {shortfall_idr})")]
    InsufficientBalance {
        balance_idr: i64,
        total_idr: i64,
        shortfall_idr: i64,
    },

    #[error("promo code {code} is not applicable: {reason}")]
    PromoInvalid { code: String, reason: String },

    #[error("promo code {code} usage limit reached")]
    PromoUsageExceeded { code: String },

    #[error("product {product_name} ({product_id}) is out of stock")]
    OutOfStock { product_id: i64, product_name: String },

    #[error("illegal order transition {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("download link has expired")]
    DownloadExpired,

    #[error("download limit exhausted")]
    DownloadExhausted,

    #[error("payment gateway timed out for order {order_no}")]
    GatewayTimeout { order_no: String },

    #[error("payment gateway rejected order {order_no}: {reason}")]
    GatewayRejected { order_no: String, reason: String },

    #[error("order {order_no} has already been delivered")]
    AlreadyDelivered { order_no: String },
}

impl CheckoutError {
    /// Stable API error code
    pub fn code(&self) -> &'static str {
        match self {
            CheckoutError::InsufficientBalance { .. } => "E4001",
            CheckoutError::PromoInvalid { .. } => "E4002",
            CheckoutError::PromoUsageExceeded { .. } => "E4003",
            CheckoutError::OutOfStock { .. } => "E4004",
            CheckoutError::InvalidTransition { .. } => "E4005",
            CheckoutError::DownloadExpired => "E4006",
            CheckoutError::DownloadExhausted => "E4007",
            CheckoutError::GatewayTimeout { .. } => "E4008",
            CheckoutError::GatewayRejected { .. } => "E4009",
            CheckoutError::AlreadyDelivered { .. } => "E4010",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            CheckoutError::InsufficientBalance { .. }
            | CheckoutError::PromoInvalid { .. }
            | CheckoutError::PromoUsageExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            CheckoutError::OutOfStock { .. } => StatusCode::CONFLICT,
            CheckoutError::InvalidTransition { .. }
            | CheckoutError::AlreadyDelivered { .. } => StatusCode::CONFLICT,
            CheckoutError::DownloadExpired | CheckoutError::DownloadExhausted => {
                StatusCode::GONE
            }
            CheckoutError::GatewayTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            CheckoutError::GatewayRejected { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}
