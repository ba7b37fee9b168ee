//! Background tasks

use crate::core::ServerState;
use crate::db::repository::order;
use shared::util::now_millis;

const SWEEP_INTERVAL_SECS: u64 = 60;

/// Gateway-timeout policy: a PENDING gateway order with no callback within
/// the configured window is moved to FAILED (nothing was captured, so no
/// refund). There is no user-facing cancellation of an in-flight settlement.
pub fn spawn_pending_order_sweeper(state: ServerState) {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(SWEEP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            let cutoff = now_millis() - state.config.pending_timeout_ms();
            match order::fail_stale_pending(&state.pool, cutoff).await {
                Ok(0) => {}
                Ok(n) => tracing::info!(count = n, "Swept stale PENDING gateway orders to FAILED"),
                Err(e) => tracing::error!("Pending order sweep failed: {e}"),
            }
        }
    });
}
