//! Wallet API Module

mod handler;

use axum::{
    routing::{get, post},
    Router,
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/wallet", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::wallet))
        .route("/topups", post(handler::create_topup).get(handler::list_topups))
}
