//! Checkout API Handlers

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::checkout::{self, CheckoutLineInput, CheckoutPreview, PromoQuoteView, SubmitOutcome, SubmitRequest};
use crate::core::ServerState;
use crate::utils::AppResult;

/// Preview body: either a cart (`lines`) or a single product
#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub lines: Vec<CheckoutLineInput>,
    pub product_id: Option<i64>,
    pub quantity: Option<i64>,
}

impl PreviewRequest {
    fn into_lines(self) -> Vec<CheckoutLineInput> {
        if self.lines.is_empty() {
            if let Some(product_id) = self.product_id {
                return vec![CheckoutLineInput {
                    product_id,
                    quantity: self.quantity.unwrap_or(1),
                }];
            }
        }
        self.lines
    }
}

/// Checkout preview: server-priced lines, wallet balance, eligibility
pub async fn preview(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<PreviewRequest>,
) -> AppResult<Json<CheckoutPreview>> {
    let preview = checkout::preview(&state, user.user_id, &payload.into_lines()).await?;
    Ok(Json(preview))
}

#[derive(Debug, Deserialize)]
pub struct PromoQuoteRequest {
    pub code: String,
    pub lines: Vec<CheckoutLineInput>,
}

/// Validate a promo code against the cart (read-only)
pub async fn quote_promo(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<PromoQuoteRequest>,
) -> AppResult<Json<PromoQuoteView>> {
    let quote =
        checkout::quote_promo(&state, user.user_id, &payload.code, &payload.lines).await?;
    Ok(Json(quote))
}

/// Submit a checkout with the chosen payment method
pub async fn submit(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<SubmitRequest>,
) -> AppResult<Json<SubmitOutcome>> {
    let outcome = checkout::submit(&state, user.user_id, &payload).await?;
    Ok(Json(outcome))
}
