//! Gateway Callback Handler
//!
//! Invoked by the external gateway collaborator. The raw body is verified
//! against the shared-secret HMAC before parsing; replays are acknowledged
//! idempotently by the order service.

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde::Serialize;
use shared::models::OrderStatus;

use crate::core::ServerState;
use crate::gateway::{self, GatewayCallback};
use crate::orders;
use crate::utils::{AppError, AppResult};

const SIGNATURE_HEADER: &str = "x-callback-signature";

#[derive(Debug, Serialize)]
pub struct CallbackAck {
    pub order_no: String,
    pub status: OrderStatus,
}

pub async fn callback(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<CallbackAck>> {
    let secret = &state.config.gateway_callback_secret;
    if secret.is_empty() {
        // Development only — production must configure the shared secret
        tracing::warn!("GATEWAY_CALLBACK_SECRET not set, accepting unsigned callback");
    } else {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Forbidden("Missing callback signature".into()))?;
        gateway::verify_callback_signature(&body, signature, secret)
            .map_err(|e| AppError::Forbidden(e.to_string()))?;
    }

    let callback: GatewayCallback = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Malformed callback payload: {e}")))?;

    let order = orders::confirm_gateway(&state, &callback).await?;
    Ok(Json(CallbackAck {
        order_no: order.order_no,
        status: order.status,
    }))
}
