//! Buyer Order API Handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use shared::models::{OrderDetail, OrderSummary};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::order;
use crate::orders;
use crate::utils::{AppError, AppResult};

/// Query params for listing orders
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// List the caller's orders (paginated)
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<OrderSummary>>> {
    let rows = order::find_by_user(&state.pool, user.user_id, query.limit, query.offset).await?;
    Ok(Json(rows))
}

/// Order detail with lines and delivery items. Buyers can only read their
/// own orders.
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    let detail = orders::get_detail(&state, id).await?;
    if detail.order.user_id != user.user_id {
        return Err(AppError::NotFound(format!("Order {id} not found")));
    }
    Ok(Json(detail))
}
