//! Admin order handlers: queue views, refunds, fulfillment emails

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use shared::models::{Order, OrderDetail, OrderStatus, OrderSummary};

use crate::auth::AdminUser;
use crate::core::ServerState;
use crate::db::repository::order;
use crate::fulfillment::manual::{self, EmailSpec, RenderedEmail};
use crate::orders;
use crate::utils::AppResult;

pub fn routes() -> Router<ServerState> {
    Router::new()
        .route("/orders", get(list))
        .route("/orders/{id}", get(get_by_id))
        .route("/orders/{id}/refund", post(refund))
        .route("/orders/{id}/email/preview", post(email_preview))
        .route("/orders/{id}/email/send", post(email_send))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<OrderStatus>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// All orders, optionally filtered by status. `status=PAID` doubles as the
/// manual-fulfillment queue.
async fn list(
    State(state): State<ServerState>,
    _admin: AdminUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<OrderSummary>>> {
    let rows = order::find_all(&state.pool, query.status, query.limit, query.offset).await?;
    Ok(Json(rows))
}

async fn get_by_id(
    State(state): State<ServerState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    let detail = orders::get_detail(&state, id).await?;
    Ok(Json(detail))
}

#[derive(Debug, Deserialize, Default)]
pub struct RefundRequest {
    /// Omit for a full refund
    pub amount_idr: Option<i64>,
}

async fn refund(
    State(state): State<ServerState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<RefundRequest>,
) -> AppResult<Json<Order>> {
    tracing::info!(order_id = id, admin = admin.user_id, "Refund requested");
    let order = orders::refund(&state, id, payload.amount_idr).await?;
    Ok(Json(order))
}

/// Render the fulfillment email without side effects
async fn email_preview(
    State(state): State<ServerState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(spec): Json<EmailSpec>,
) -> AppResult<Json<RenderedEmail>> {
    let rendered = manual::preview(&state, id, &spec).await?;
    Ok(Json(rendered))
}

/// Dispatch the fulfillment email and deliver the order
async fn email_send(
    State(state): State<ServerState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    Json(spec): Json<EmailSpec>,
) -> AppResult<Json<RenderedEmail>> {
    tracing::info!(order_id = id, admin = admin.user_id, "Manual fulfillment send");
    let rendered = manual::send(&state, id, &spec).await?;
    Ok(Json(rendered))
}
