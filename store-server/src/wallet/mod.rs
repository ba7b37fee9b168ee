//! Wallet Ledger service
//!
//! Admin review of manual top-up requests and discretionary adjustments.
//! Approval writes the TOPUP ledger entry in the same transaction as the
//! PENDING → SETTLED compare-and-set, so a request can never be settled (and
//! credited) twice.

use shared::models::{LedgerKind, TopUpRequest, TopUpStatus};

use crate::core::ServerState;
use crate::db::repository::{ledger, topup};
use crate::utils::{AppError, AppResult};

/// Approve a pending top-up: settle the request and credit the wallet
pub async fn approve_topup(
    state: &ServerState,
    request_id: i64,
    admin_id: i64,
    note: Option<&str>,
) -> AppResult<TopUpRequest> {
    let request = topup::find_by_id(&state.pool, request_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Top-up request {request_id} not found")))?;

    let mut tx = state.pool.begin().await?;
    let settled = topup::review(&mut *tx, request_id, TopUpStatus::Settled, admin_id, note).await?;
    if !settled {
        return Err(AppError::Conflict(format!(
            "Top-up request {request_id} was already reviewed"
        )));
    }
    ledger::insert(
        &mut *tx,
        request.user_id,
        request.gross_idr,
        LedgerKind::Topup,
        &request_id.to_string(),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(request_id, user_id = request.user_id, amount = request.gross_idr, "Top-up approved");
    reload(state, request_id).await
}

/// Reject a pending top-up with a reviewer note; no ledger entry is written
pub async fn reject_topup(
    state: &ServerState,
    request_id: i64,
    admin_id: i64,
    reason: &str,
) -> AppResult<TopUpRequest> {
    if reason.trim().is_empty() {
        return Err(AppError::Validation("A rejection reason is required".into()));
    }
    let rejected = topup::review(
        &state.pool,
        request_id,
        TopUpStatus::Rejected,
        admin_id,
        Some(reason),
    )
    .await?;
    if !rejected {
        // Distinguish unknown from already-reviewed for a useful error
        return match topup::find_by_id(&state.pool, request_id).await? {
            None => Err(AppError::NotFound(format!(
                "Top-up request {request_id} not found"
            ))),
            Some(_) => Err(AppError::Conflict(format!(
                "Top-up request {request_id} was already reviewed"
            ))),
        };
    }
    tracing::info!(request_id, "Top-up rejected");
    reload(state, request_id).await
}

/// Discretionary ADJUST entry (signed); the only ledger kind admins write
/// directly
pub async fn adjust(
    state: &ServerState,
    user_id: i64,
    amount_idr: i64,
    note: &str,
) -> AppResult<i64> {
    if note.trim().is_empty() {
        return Err(AppError::Validation("An adjustment note is required".into()));
    }
    ledger::insert(&state.pool, user_id, amount_idr, LedgerKind::Adjust, note).await?;
    let balance = ledger::balance(&state.pool, user_id).await?;
    tracing::info!(user_id, amount_idr, "Wallet adjusted");
    Ok(balance)
}

async fn reload(state: &ServerState, request_id: i64) -> AppResult<TopUpRequest> {
    topup::find_by_id(&state.pool, request_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Top-up request {request_id} not found")))
}
