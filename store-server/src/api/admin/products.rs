//! Admin product & stock pool handlers

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use shared::models::{Product, ProductCreate, ProductUpdate, StockType};

use crate::auth::AdminUser;
use crate::core::ServerState;
use crate::db::repository::{product, stock};
use crate::utils::{AppError, AppResult};

pub fn routes() -> Router<ServerState> {
    Router::new()
        .route("/products", get(list).post(create))
        .route("/products/{id}", get(get_by_id).put(update))
        .route("/products/{id}/stock", get(stock_status).post(add_stock))
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
) -> AppResult<Json<Vec<Product>>> {
    let rows = product::find_all(&state.pool, query.limit, query.offset).await?;
    Ok(Json(rows))
}

async fn get_by_id(
    State(state): State<ServerState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Product>> {
    let row = product::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {id} not found")))?;
    Ok(Json(row))
}

async fn create(
    State(state): State<ServerState>,
    _admin: AdminUser,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<Product>> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Product name is required".into()));
    }
    if payload.price_idr <= 0 {
        return Err(AppError::Validation("Product price must be positive".into()));
    }
    if payload.kind == shared::models::ProductKind::SourceCode && payload.source_file.is_none() {
        return Err(AppError::Validation(
            "SOURCE_CODE products need a source file reference".into(),
        ));
    }
    let row = product::create(&state.pool, payload).await?;
    Ok(Json(row))
}

async fn update(
    State(state): State<ServerState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<Product>> {
    let row = product::update(&state.pool, id, payload).await?;
    Ok(Json(row))
}

#[derive(Debug, Serialize)]
pub struct StockStatus {
    pub product_id: i64,
    pub available: i64,
}

/// Undistributed pool size
async fn stock_status(
    State(state): State<ServerState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> AppResult<Json<StockStatus>> {
    let available = stock::available_count(&state.pool, id).await?;
    Ok(Json(StockStatus {
        product_id: id,
        available,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AddStockRequest {
    pub items: Vec<String>,
}

/// Bulk-add undistributed items (keys/links/accounts) to the pool
async fn add_stock(
    State(state): State<ServerState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<AddStockRequest>,
) -> AppResult<Json<StockStatus>> {
    let items: Vec<String> = payload
        .items
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        return Err(AppError::Validation("No stock items provided".into()));
    }

    let target = product::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {id} not found")))?;
    if target.stock_type != StockType::StockBased {
        return Err(AppError::Validation(format!(
            "Product {} does not draw from a stock pool",
            target.name
        )));
    }

    let added = stock::add_items(&state.pool, id, &items).await?;
    tracing::info!(product_id = id, added, admin = admin.user_id, "Stock items added");

    let available = stock::available_count(&state.pool, id).await?;
    Ok(Json(StockStatus {
        product_id: id,
        available,
    }))
}
