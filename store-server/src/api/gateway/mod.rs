//! Gateway Callback API Module

mod handler;

use axum::{routing::post, Router};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/gateway/callback", post(handler::callback))
}
