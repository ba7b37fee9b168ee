//! API routing
//!
//! One module per domain, each exposing `router() -> Router<ServerState>`:
//!
//! - [`health`] - liveness probe
//! - [`checkout`] - preview, promo quote, submission
//! - [`orders`] - buyer order history and detail
//! - [`wallet`] - balance view and manual top-up requests
//! - [`downloads`] - rate-limited file downloads
//! - [`gateway`] - payment gateway callback
//! - [`admin`] - order remediation, fulfillment emails, top-up review,
//!   promo/product/stock management

pub mod admin;
pub mod checkout;
pub mod downloads;
pub mod gateway;
pub mod health;
pub mod orders;
pub mod wallet;

use axum::Router;

use crate::core::ServerState;

/// Assemble every domain router
pub fn router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(checkout::router())
        .merge(orders::router())
        .merge(wallet::router())
        .merge(downloads::router())
        .merge(gateway::router())
        .merge(admin::router())
}
