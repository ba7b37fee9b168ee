//! Order lifecycle operations

use shared::models::{FulfillmentMode, LedgerKind, Order, OrderDetail, OrderStatus};

use crate::checkout::CheckoutError;
use crate::core::ServerState;
use crate::db::repository::{delivery, ledger, order, promo};
use crate::fulfillment::allocator;
use crate::gateway::{GatewayCallback, GatewayEvent};
use crate::utils::{AppError, AppResult};

/// Load an order with its lines and delivery items
pub async fn get_detail(state: &ServerState, order_id: i64) -> AppResult<OrderDetail> {
    let order = order::find_by_id(&state.pool, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {order_id} not found")))?;
    let lines = order::lines(&state.pool, order_id).await?;
    let delivery_items = delivery::find_by_order(&state.pool, order_id).await?;
    Ok(OrderDetail {
        order,
        lines,
        delivery_items,
    })
}

/// Compare-and-set transition with lifecycle validation
async fn try_transition(state: &ServerState, order: &Order, to: OrderStatus) -> AppResult<()> {
    if !order.status.can_transition(to) {
        return Err(CheckoutError::InvalidTransition {
            from: order.status,
            to,
        }
        .into());
    }
    let moved = order::transition(&state.pool, order.id, order.status, to).await?;
    if !moved {
        // Someone else transitioned first; reload to report the real source
        let current = order::find_by_id(&state.pool, order.id)
            .await?
            .map(|o| o.status)
            .unwrap_or(order.status);
        return Err(CheckoutError::InvalidTransition { from: current, to }.into());
    }
    Ok(())
}

/// On-paid hook: one synchronous attempt at automatic fulfillment.
///
/// - Every line INSTANT → allocate and move to DELIVERED.
/// - Any line MANUAL → stay PAID, visible in the manual-fulfillment queue.
/// - OutOfStock → order FAILED, captured payment reversed with a REFUND
///   entry, typed error propagated to the caller.
/// - Any other fulfillment failure → stay PAID with the error recorded for
///   admin remediation; never retried against the same pool.
pub async fn fulfill_after_payment(state: &ServerState, order_id: i64) -> AppResult<Order> {
    let order = order::find_by_id(&state.pool, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {order_id} not found")))?;
    if order.status != OrderStatus::Paid {
        return Err(CheckoutError::InvalidTransition {
            from: order.status,
            to: OrderStatus::Delivered,
        }
        .into());
    }

    let lines = order::lines(&state.pool, order_id).await?;
    if lines.iter().any(|l| l.fulfillment == FulfillmentMode::Manual) {
        tracing::info!(order_no = %order.order_no, "Order queued for manual fulfillment");
        return Ok(order);
    }

    match allocator::fulfill_order(state, &order, &lines).await {
        Ok(()) => {
            try_transition(state, &order, OrderStatus::Delivered).await?;
            tracing::info!(order_no = %order.order_no, "Order fulfilled instantly");
            reload(state, order_id).await
        }
        Err(AppError::Pipeline(e @ CheckoutError::OutOfStock { .. })) => {
            // Payment is captured; reverse it and leave the order inspectable
            try_transition(state, &order, OrderStatus::Failed).await?;
            if order.total_idr > 0 {
                ledger::insert(
                    &state.pool,
                    order.user_id,
                    order.total_idr,
                    LedgerKind::Refund,
                    &order.order_no,
                )
                .await?;
            }
            order::set_fulfillment_note(&state.pool, order.id, &e.to_string()).await?;
            tracing::warn!(order_no = %order.order_no, error = %e, "Fulfillment failed, payment refunded");
            Err(e.into())
        }
        Err(e) => {
            order::set_fulfillment_note(&state.pool, order.id, &e.to_string()).await?;
            tracing::error!(order_no = %order.order_no, error = %e, "Fulfillment error recorded for admin remediation");
            reload(state, order_id).await
        }
    }
}

/// Handle an authenticated gateway callback. Idempotent: replaying a
/// settlement for an order that already left PENDING acknowledges without
/// re-applying fulfillment or redemption.
pub async fn confirm_gateway(state: &ServerState, callback: &GatewayCallback) -> AppResult<Order> {
    let order = order::find_by_no(&state.pool, &callback.order_no)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", callback.order_no)))?;

    let target = match callback.event {
        GatewayEvent::Settlement => OrderStatus::Paid,
        GatewayEvent::Expire => OrderStatus::Failed,
        GatewayEvent::Cancel => OrderStatus::Cancelled,
    };

    let moved = order::transition(&state.pool, order.id, OrderStatus::Pending, target).await?;
    if !moved {
        let current = reload(state, order.id).await?;
        if current.status == target
            || (callback.event == GatewayEvent::Settlement
                && matches!(current.status, OrderStatus::Delivered | OrderStatus::Paid))
        {
            // Replay of a callback we already applied
            tracing::info!(order_no = %order.order_no, event = ?callback.event, "Duplicate gateway callback ignored");
            return Ok(current);
        }
        return Err(CheckoutError::InvalidTransition {
            from: current.status,
            to: target,
        }
        .into());
    }

    if let Some(reference) = callback.reference.as_deref() {
        order::set_gateway_ref(&state.pool, order.id, reference).await?;
    }

    if callback.event != GatewayEvent::Settlement {
        tracing::info!(order_no = %order.order_no, event = ?callback.event, "Gateway order closed without payment");
        return reload(state, order.id).await;
    }

    // Redemption is recorded at the moment the order becomes PAID
    if let Some(code) = order.promo_code.as_deref() {
        record_redemption(state, &order, code).await?;
    }

    // Fulfillment failures are recorded on the order; the callback is still
    // acknowledged so the gateway stops retrying.
    match fulfill_after_payment(state, order.id).await {
        Ok(order) => Ok(order),
        Err(AppError::Pipeline(e)) => {
            tracing::warn!(order_no = %order.order_no, error = %e, "Post-settlement fulfillment failed");
            reload(state, order.id).await
        }
        Err(e) => Err(e),
    }
}

async fn record_redemption(state: &ServerState, order: &Order, code: &str) -> AppResult<()> {
    let Some(promo_row) = promo::find_by_code(&state.pool, code).await? else {
        tracing::warn!(order_no = %order.order_no, code, "Promo code vanished before settlement");
        return Ok(());
    };
    let recorded = promo::insert_redemption_guarded(
        &state.pool,
        promo_row.id,
        order.user_id,
        order.id,
        order.discount_idr,
    )
    .await?;
    if !recorded {
        // Limits filled between checkout and settlement; the discount already
        // priced into the order is honored.
        tracing::warn!(order_no = %order.order_no, code, "Promo limit reached before settlement; redemption not counted");
    }
    Ok(())
}

/// Explicit refund: PAID → REFUNDED with a REFUND ledger entry to the buyer's
/// wallet, regardless of the original payment method. Partial amounts are
/// allowed; the full total is the default.
pub async fn refund(state: &ServerState, order_id: i64, amount_idr: Option<i64>) -> AppResult<Order> {
    let order = order::find_by_id(&state.pool, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {order_id} not found")))?;

    let amount = amount_idr.unwrap_or(order.total_idr);
    if amount <= 0 || amount > order.total_idr {
        return Err(AppError::Validation(format!(
            "Refund amount must be within (0, {}]",
            order.total_idr
        )));
    }

    let mut tx = state.pool.begin().await?;
    let moved = order::transition(&mut *tx, order.id, OrderStatus::Paid, OrderStatus::Refunded)
        .await?;
    if !moved {
        return Err(CheckoutError::InvalidTransition {
            from: order.status,
            to: OrderStatus::Refunded,
        }
        .into());
    }
    ledger::insert(
        &mut *tx,
        order.user_id,
        amount,
        LedgerKind::Refund,
        &order.order_no,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(order_no = %order.order_no, amount, "Order refunded");
    reload(state, order_id).await
}

async fn reload(state: &ServerState, order_id: i64) -> AppResult<Order> {
    order::find_by_id(&state.pool, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {order_id} not found")))
}
