//! Payment gateway integration via REST API (no SDK dependency)
//!
//! The gateway hosts its own checkout page; this module only opens payment
//! sessions and authenticates the asynchronous callbacks. The gateway's
//! internal cryptography is its own concern — callbacks are guarded by a
//! shared-secret HMAC over `<timestamp>.<body>` with a replay window.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway request timed out")]
    Timeout,

    #[error("gateway transport error: {0}")]
    Transport(String),

    #[error("gateway rejected the session: {0}")]
    Rejected(String),
}

/// An open payment session at the external gateway
#[derive(Debug, Clone)]
pub struct GatewaySession {
    /// Gateway-side reference for the session
    pub reference: String,
    /// Hosted checkout URL the buyer is redirected to
    pub redirect_url: String,
}

/// External settlement collaborator. Implementations must not be called while
/// holding any pipeline lock or open transaction.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(
        &self,
        order_no: &str,
        gross_amount_idr: i64,
        user_id: i64,
    ) -> Result<GatewaySession, GatewayError>;
}

/// REST client for the production gateway
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    server_key: String,
}

const SESSION_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15);

impl HttpGateway {
    pub fn new(base_url: String, server_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            server_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    token: Option<String>,
    redirect_url: Option<String>,
    error_messages: Option<Vec<String>>,
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    async fn create_session(
        &self,
        order_no: &str,
        gross_amount_idr: i64,
        user_id: i64,
    ) -> Result<GatewaySession, GatewayError> {
        let body = serde_json::json!({
            "transaction_details": {
                "order_id": order_no,
                "gross_amount": gross_amount_idr,
                "currency": "IDR",
            },
            "customer_details": {
                "customer_id": user_id.to_string(),
            },
        });

        let resp = self
            .client
            .post(format!("{}/v1/payment-sessions", self.base_url))
            .basic_auth(&self.server_key, None::<&str>)
            .timeout(SESSION_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout
                } else {
                    GatewayError::Transport(e.to_string())
                }
            })?;

        let session: SessionResponse = resp
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        match (session.token, session.redirect_url) {
            (Some(token), Some(url)) => Ok(GatewaySession {
                reference: token,
                redirect_url: url,
            }),
            _ => Err(GatewayError::Rejected(
                session
                    .error_messages
                    .map(|m| m.join("; "))
                    .unwrap_or_else(|| "missing session token".to_string()),
            )),
        }
    }
}

/// Callback event reported by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayEvent {
    /// Funds captured — the order becomes PAID
    Settlement,
    /// Session expired without payment
    Expire,
    /// Buyer cancelled on the hosted page
    Cancel,
}

/// Callback payload (`POST /api/gateway/callback`)
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayCallback {
    pub order_no: String,
    pub event: GatewayEvent,
    pub reference: Option<String>,
}

/// Verify a gateway callback signature (HMAC-SHA256)
///
/// Header format: `t=<unix seconds>,v1=<hex hmac of "<t>.<body>">`.
/// Events older than 5 minutes are rejected to prevent replay.
pub fn verify_callback_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signature = "";
    for part in sig_header.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signature = v;
        }
    }

    if timestamp.is_empty() || signature.is_empty() {
        return Err("Invalid signature header");
    }

    let signed_payload = format!("{timestamp}.{}", std::str::from_utf8(payload).unwrap_or(""));
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(signed_payload.as_bytes());

    // Decode hex signature and use constant-time comparison via hmac::verify_slice
    let sig_bytes = hex::decode(signature).map_err(|_| "Invalid signature hex")?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| "Callback signature mismatch")?;

    // Reject events older than 5 minutes to prevent replay attacks
    let ts: i64 = timestamp.parse().map_err(|_| "Invalid timestamp")?;
    let now = chrono::Utc::now().timestamp();
    if (now - ts).abs() > 300 {
        return Err("Callback timestamp too old");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmac::{Hmac, Mac};

    fn sign(body: &[u8], secret: &str, ts: i64) -> String {
        let signed = format!("{ts}.{}", std::str::from_utf8(body).unwrap());
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(signed.as_bytes());
        let sig = hex::encode(mac.finalize().into_bytes());
        format!("t={ts},v1={sig}")
    }

    #[test]
    fn valid_signature_passes() {
        let body = br#"{"order_no":"INV-1","event":"settlement"}"#;
        let now = chrono::Utc::now().timestamp();
        let header = sign(body, "secret", now);
        assert!(verify_callback_signature(body, &header, "secret").is_ok());
    }

    #[test]
    fn wrong_secret_fails() {
        let body = b"{}";
        let now = chrono::Utc::now().timestamp();
        let header = sign(body, "secret", now);
        assert!(verify_callback_signature(body, &header, "other").is_err());
    }

    #[test]
    fn tampered_body_fails() {
        let now = chrono::Utc::now().timestamp();
        let header = sign(b"{}", "secret", now);
        assert!(verify_callback_signature(b"{ }", &header, "secret").is_err());
    }

    #[test]
    fn stale_timestamp_fails() {
        let body = b"{}";
        let old = chrono::Utc::now().timestamp() - 600;
        let header = sign(body, "secret", old);
        assert!(verify_callback_signature(body, &header, "secret").is_err());
    }

    #[test]
    fn malformed_header_fails() {
        assert!(verify_callback_signature(b"{}", "garbage", "secret").is_err());
    }
}
