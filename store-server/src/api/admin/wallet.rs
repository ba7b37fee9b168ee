//! Admin wallet adjustment handler

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::auth::AdminUser;
use crate::core::ServerState;
use crate::utils::AppResult;
use crate::wallet;

pub fn routes() -> Router<ServerState> {
    Router::new().route("/wallet/{user_id}/adjust", post(adjust))
}

#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    /// Signed IDR amount
    pub amount_idr: i64,
    pub note: String,
}

#[derive(Debug, Serialize)]
pub struct AdjustResponse {
    pub user_id: i64,
    pub balance_idr: i64,
}

async fn adjust(
    State(state): State<ServerState>,
    admin: AdminUser,
    Path(user_id): Path<i64>,
    Json(payload): Json<AdjustRequest>,
) -> AppResult<Json<AdjustResponse>> {
    tracing::info!(user_id, admin = admin.user_id, amount = payload.amount_idr, "Wallet adjustment");
    let balance_idr = wallet::adjust(&state, user_id, payload.amount_idr, &payload.note).await?;
    Ok(Json(AdjustResponse {
        user_id,
        balance_idr,
    }))
}
