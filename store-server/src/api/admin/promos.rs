//! Admin promo code handlers

use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use shared::models::{PromoCode, PromoCodeCreate, PromoCodeUpdate};

use crate::auth::AdminUser;
use crate::core::ServerState;
use crate::db::repository::promo;
use crate::utils::{AppError, AppResult};

pub fn routes() -> Router<ServerState> {
    Router::new()
        .route("/promos", get(list).post(create))
        .route("/promos/{id}", put(update).get(get_by_id))
}

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

async fn list(
    State(state): State<ServerState>,
    _admin: AdminUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<PromoCode>>> {
    let rows = promo::find_all(&state.pool, query.limit, query.offset).await?;
    Ok(Json(rows))
}

/// Promo with derived usage stats
#[derive(Debug, Serialize)]
pub struct PromoDetail {
    #[serde(flatten)]
    pub promo: PromoCode,
    pub target_ids: Vec<i64>,
    pub redemption_count: i64,
}

async fn get_by_id(
    State(state): State<ServerState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> AppResult<Json<PromoDetail>> {
    let promo_row = promo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Promo code {id} not found")))?;
    let target_ids = promo::targets(&state.pool, id).await?;
    let redemption_count = promo::redemption_count(&state.pool, id).await?;
    Ok(Json(PromoDetail {
        promo: promo_row,
        target_ids,
        redemption_count,
    }))
}

async fn create(
    State(state): State<ServerState>,
    admin: AdminUser,
    Json(payload): Json<PromoCodeCreate>,
) -> AppResult<Json<PromoCode>> {
    validate_create(&payload)?;
    tracing::info!(code = %payload.code, admin = admin.user_id, "Promo code created");
    let promo_row = promo::create(&state.pool, payload).await?;
    Ok(Json(promo_row))
}

async fn update(
    State(state): State<ServerState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<PromoCodeUpdate>,
) -> AppResult<Json<PromoCode>> {
    if let Some(value) = payload.value {
        if value <= 0 {
            return Err(AppError::Validation("Promo value must be positive".into()));
        }
    }
    let promo_row = promo::update(&state.pool, id, payload).await?;
    Ok(Json(promo_row))
}

fn validate_create(payload: &PromoCodeCreate) -> AppResult<()> {
    if payload.value <= 0 {
        return Err(AppError::Validation("Promo value must be positive".into()));
    }
    if payload.kind == shared::models::PromoKind::Percent && payload.value > 100 {
        return Err(AppError::Validation(
            "Percent promos cannot exceed 100".into(),
        ));
    }
    if payload.scope != shared::models::PromoScope::Order && payload.target_ids.is_empty() {
        return Err(AppError::Validation(
            "Scoped promos need at least one target id".into(),
        ));
    }
    if let (Some(start), Some(end)) = (payload.start_at, payload.end_at) {
        if end < start {
            return Err(AppError::Validation(
                "Promo end_at must not precede start_at".into(),
            ));
        }
    }
    Ok(())
}
