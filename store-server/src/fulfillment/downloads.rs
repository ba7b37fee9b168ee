//! Download Token Service
//!
//! SOURCE_CODE goods are never copied per order: fulfillment mints an opaque
//! token bound to order + product, with a TTL and a fixed number of uses.
//! Consumption is a single decrement-if-positive; exhausted or expired
//! requests are rejected, not retried.

use shared::models::DownloadToken;
use shared::util::now_millis;
use sqlx::{Sqlite, SqlitePool};

use crate::checkout::CheckoutError;
use crate::core::Config;
use crate::db::repository::download;
use crate::utils::{AppError, AppResult};

/// Mint a token for one purchased unit and return its opaque id
pub async fn mint<'e, E>(
    executor: E,
    config: &Config,
    order_id: i64,
    product_id: i64,
    source_file: &str,
) -> AppResult<String>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let token = uuid::Uuid::new_v4().simple().to_string();
    let expires_at = now_millis() + config.download_ttl_ms();
    download::insert(
        executor,
        &token,
        order_id,
        product_id,
        source_file,
        config.download_max_uses,
        expires_at,
    )
    .await?;
    Ok(token)
}

/// Spend one download. The decrement and the validity check are one atomic
/// statement; on rejection a follow-up read classifies the reason.
pub async fn consume(pool: &SqlitePool, token: &str) -> AppResult<DownloadToken> {
    if let Some(spent) = download::consume(pool, token).await? {
        return Ok(spent);
    }

    match download::find_by_token(pool, token).await? {
        None => Err(AppError::NotFound("Unknown download token".into())),
        Some(t) if t.expires_at <= now_millis() => {
            Err(CheckoutError::DownloadExpired.into())
        }
        Some(_) => Err(CheckoutError::DownloadExhausted.into()),
    }
}
