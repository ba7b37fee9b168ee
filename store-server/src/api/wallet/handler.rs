//! Wallet API Handlers

use axum::{extract::State, Json};
use shared::models::{TopUpCreate, TopUpRequest, WalletView};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{ledger, topup};
use crate::utils::AppResult;

const HISTORY_LIMIT: i64 = 100;

/// Wallet view: derived balance plus recent ledger activity
pub async fn wallet(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<WalletView>> {
    let balance_idr = ledger::balance(&state.pool, user.user_id).await?;
    let entries = ledger::entries(&state.pool, user.user_id, HISTORY_LIMIT).await?;
    Ok(Json(WalletView {
        user_id: user.user_id,
        balance_idr,
        entries,
    }))
}

/// File a manual top-up request for admin review
pub async fn create_topup(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<TopUpCreate>,
) -> AppResult<Json<TopUpRequest>> {
    let request = topup::create(&state.pool, user.user_id, payload).await?;
    Ok(Json(request))
}

/// The caller's top-up requests
pub async fn list_topups(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<TopUpRequest>>> {
    let rows = topup::find_by_user(&state.pool, user.user_id).await?;
    Ok(Json(rows))
}
