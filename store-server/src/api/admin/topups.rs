//! Admin top-up review handlers

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use shared::models::{TopUpRequest, TopUpStatus};

use crate::auth::AdminUser;
use crate::core::ServerState;
use crate::db::repository::topup;
use crate::utils::AppResult;
use crate::wallet;

pub fn routes() -> Router<ServerState> {
    Router::new()
        .route("/topups", get(list))
        .route("/topups/{id}/approve", post(approve))
        .route("/topups/{id}/reject", post(reject))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<TopUpStatus>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

async fn list(
    State(state): State<ServerState>,
    _admin: AdminUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<TopUpRequest>>> {
    let rows = topup::find_all(&state.pool, query.status, query.limit, query.offset).await?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize, Default)]
pub struct ApproveRequest {
    pub note: Option<String>,
}

async fn approve(
    State(state): State<ServerState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<ApproveRequest>,
) -> AppResult<Json<TopUpRequest>> {
    let request =
        wallet::approve_topup(&state, id, admin.user_id, payload.note.as_deref()).await?;
    Ok(Json(request))
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

async fn reject(
    State(state): State<ServerState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<RejectRequest>,
) -> AppResult<Json<TopUpRequest>> {
    let request = wallet::reject_topup(&state, id, admin.user_id, &payload.reason).await?;
    Ok(Json(request))
}
