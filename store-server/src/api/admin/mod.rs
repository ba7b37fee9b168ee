//! Admin API Module
//!
//! Order remediation (refunds, fulfillment emails), top-up review, promo and
//! product/stock management. Every route requires the admin role.

mod orders;
mod products;
mod promos;
mod topups;
mod wallet;

use axum::Router;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest(
        "/api/admin",
        Router::new()
            .merge(orders::routes())
            .merge(topups::routes())
            .merge(promos::routes())
            .merge(products::routes())
            .merge(wallet::routes()),
    )
}
