//! Checkout API Module

mod handler;

use axum::{routing::post, Router};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/checkout/preview", post(handler::preview))
        .route("/api/checkout/promo", post(handler::quote_promo))
        .route("/api/checkout", post(handler::submit))
}
