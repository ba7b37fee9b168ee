//! Checkout service: preview, promo quoting, submission

use serde::{Deserialize, Serialize};
use shared::models::{OrderStatus, PaymentMethod};
use shared::util::{now_millis, order_number, snowflake_id};
use sqlx::SqlitePool;

use crate::core::ServerState;
use crate::db::repository::{ledger, order, product, promo};
use crate::gateway::GatewayError;
use crate::orders;
use crate::pricing::{self, engine, PricedLine};
use crate::utils::{AppError, AppResult};

use super::CheckoutError;

/// One requested line: quantities only — unit prices are never trusted from
/// the client.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutLineInput {
    pub product_id: i64,
    pub quantity: i64,
}

/// Checkout preview: priced lines plus wallet eligibility
#[derive(Debug, Serialize)]
pub struct CheckoutPreview {
    pub lines: Vec<PricedLine>,
    pub subtotal_idr: i64,
    pub wallet_balance_idr: i64,
    pub can_pay_with_balance: bool,
}

/// Read-only promo quote (persists nothing)
#[derive(Debug, Serialize)]
pub struct PromoQuoteView {
    pub code: String,
    pub discount_idr: i64,
    pub eligible_subtotal_idr: i64,
}

/// Submission payload
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub lines: Vec<CheckoutLineInput>,
    pub payment_method: PaymentMethod,
    pub promo_code: Option<String>,
}

/// Submission result; `redirect_url` is set for GATEWAY settlements
#[derive(Debug, Serialize)]
pub struct SubmitOutcome {
    pub order_id: i64,
    pub order_no: String,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

/// Price requested lines from the catalog. Inactive products and non-positive
/// quantities are rejected; the sale window is evaluated here, server-side.
pub async fn price_lines(
    pool: &SqlitePool,
    inputs: &[CheckoutLineInput],
    now: i64,
) -> AppResult<Vec<PricedLine>> {
    if inputs.is_empty() {
        return Err(AppError::Validation("Checkout requires at least one line".into()));
    }
    for input in inputs {
        if input.quantity <= 0 {
            return Err(AppError::Validation(format!(
                "Quantity for product {} must be positive",
                input.product_id
            )));
        }
    }

    let ids: Vec<i64> = inputs.iter().map(|l| l.product_id).collect();
    {
        let mut deduped = ids.clone();
        deduped.sort_unstable();
        deduped.dedup();
        if deduped.len() != ids.len() {
            return Err(AppError::Validation("Duplicate product in checkout lines".into()));
        }
    }

    let products = product::find_by_ids(pool, &ids).await?;
    let mut lines = Vec::with_capacity(inputs.len());
    for input in inputs {
        let product = products
            .iter()
            .find(|p| p.id == input.product_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Product {} not found", input.product_id))
            })?;
        if !product.is_active {
            return Err(AppError::Validation(format!(
                "Product {} is not available",
                product.name
            )));
        }
        let unit_price = product.effective_price(now);
        lines.push(PricedLine {
            product_id: product.id,
            product_name: product.name.clone(),
            category_id: product.category_id,
            quantity: input.quantity,
            unit_price_idr: unit_price,
            line_total_idr: unit_price * input.quantity,
            kind: product.kind,
            fulfillment: product.fulfillment,
        });
    }
    Ok(lines)
}

/// Checkout preview: price the cart and report wallet eligibility
pub async fn preview(
    state: &ServerState,
    user_id: i64,
    inputs: &[CheckoutLineInput],
) -> AppResult<CheckoutPreview> {
    let lines = price_lines(&state.pool, inputs, now_millis()).await?;
    let subtotal_idr = pricing::subtotal(&lines);
    let wallet_balance_idr = ledger::balance(&state.pool, user_id).await?;
    Ok(CheckoutPreview {
        can_pay_with_balance: wallet_balance_idr >= subtotal_idr,
        lines,
        subtotal_idr,
        wallet_balance_idr,
    })
}

/// Validate a promo code against the cart. Read-only: an abandoned checkout
/// never consumes usage quota.
pub async fn quote_promo(
    state: &ServerState,
    user_id: i64,
    code: &str,
    inputs: &[CheckoutLineInput],
) -> AppResult<PromoQuoteView> {
    let now = now_millis();
    let lines = price_lines(&state.pool, inputs, now).await?;
    let quote = engine::evaluate(&state.pool, code, &lines, user_id, now).await?;
    Ok(PromoQuoteView {
        code: quote.promo.code,
        discount_idr: quote.discount_idr,
        eligible_subtotal_idr: quote.eligible_subtotal_idr,
    })
}

/// Submit a checkout: re-price, re-validate the promo, then settle.
///
/// BALANCE: order creation, the guarded wallet debit and the promo redemption
/// are one transaction — on insufficient balance nothing is persisted.
///
/// GATEWAY: the order is created PENDING, then the session is opened outside
/// the transaction; settlement arrives via the gateway callback.
pub async fn submit(
    state: &ServerState,
    user_id: i64,
    req: &SubmitRequest,
) -> AppResult<SubmitOutcome> {
    let now = now_millis();
    let lines = price_lines(&state.pool, &req.lines, now).await?;
    let subtotal_idr = pricing::subtotal(&lines);

    // Promo re-validated at submit time even if previewed moments earlier
    let quote = match req.promo_code.as_deref() {
        Some(code) if !code.trim().is_empty() => {
            Some(engine::evaluate(&state.pool, code, &lines, user_id, now).await?)
        }
        _ => None,
    };
    let discount_idr = quote.as_ref().map(|q| q.discount_idr).unwrap_or(0);
    let total_idr = subtotal_idr - discount_idr;

    let order_id = snowflake_id();
    let order_no = order_number(order_id);

    match req.payment_method {
        PaymentMethod::Balance => {
            submit_balance(
                state, user_id, &lines, subtotal_idr, discount_idr, total_idr, order_id,
                &order_no, quote.as_ref(),
            )
            .await
        }
        PaymentMethod::Gateway => {
            submit_gateway(
                state, user_id, &lines, subtotal_idr, discount_idr, total_idr, order_id,
                &order_no, quote.as_ref(),
            )
            .await
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn submit_balance(
    state: &ServerState,
    user_id: i64,
    lines: &[PricedLine],
    subtotal_idr: i64,
    discount_idr: i64,
    total_idr: i64,
    order_id: i64,
    order_no: &str,
    quote: Option<&pricing::PromoQuote>,
) -> AppResult<SubmitOutcome> {
    let mut tx = state.pool.begin().await?;

    insert_order_with_lines(
        &mut tx,
        order_id,
        order_no,
        user_id,
        subtotal_idr,
        discount_idr,
        total_idr,
        OrderStatus::Paid,
        PaymentMethod::Balance,
        quote.map(|q| q.promo.code.as_str()),
        lines,
    )
    .await?;

    // Atomic balance check + debit; rolls the order back on shortfall.
    // A fully discounted order has nothing to take from the wallet.
    let debited = if total_idr > 0 {
        ledger::insert_debit_guarded(&mut *tx, user_id, total_idr, order_no).await?
    } else {
        true
    };
    if !debited {
        drop(tx);
        let balance_idr = ledger::balance(&state.pool, user_id).await?;
        return Err(CheckoutError::InsufficientBalance {
            balance_idr,
            total_idr,
            shortfall_idr: total_idr - balance_idr,
        }
        .into());
    }

    // Redemption counts toward the limits at the moment the order is PAID
    if let Some(quote) = quote {
        let recorded = promo::insert_redemption_guarded(
            &mut *tx,
            quote.promo.id,
            user_id,
            order_id,
            discount_idr,
        )
        .await?;
        if !recorded {
            drop(tx);
            return Err(CheckoutError::PromoUsageExceeded {
                code: quote.promo.code.clone(),
            }
            .into());
        }
    }

    tx.commit().await?;
    tracing::info!(order_no, user_id, total_idr, "Balance checkout settled");

    // Synchronous fulfillment attempt; OutOfStock surfaces to the caller with
    // the payment already reversed.
    let order = orders::fulfill_after_payment(state, order_id).await?;
    Ok(SubmitOutcome {
        order_id,
        order_no: order_no.to_string(),
        status: order.status,
        redirect_url: None,
    })
}

#[allow(clippy::too_many_arguments)]
async fn submit_gateway(
    state: &ServerState,
    user_id: i64,
    lines: &[PricedLine],
    subtotal_idr: i64,
    discount_idr: i64,
    total_idr: i64,
    order_id: i64,
    order_no: &str,
    quote: Option<&pricing::PromoQuote>,
) -> AppResult<SubmitOutcome> {
    let mut tx = state.pool.begin().await?;
    insert_order_with_lines(
        &mut tx,
        order_id,
        order_no,
        user_id,
        subtotal_idr,
        discount_idr,
        total_idr,
        OrderStatus::Pending,
        PaymentMethod::Gateway,
        quote.map(|q| q.promo.code.as_str()),
        lines,
    )
    .await?;
    tx.commit().await?;

    // External call strictly outside the transaction
    let session = match state
        .gateway
        .create_session(order_no, total_idr, user_id)
        .await
    {
        Ok(session) => session,
        Err(e) => {
            // Nothing was captured: close the order without refund
            order::transition(&state.pool, order_id, OrderStatus::Pending, OrderStatus::Failed)
                .await?;
            return Err(match e {
                GatewayError::Timeout => CheckoutError::GatewayTimeout {
                    order_no: order_no.to_string(),
                }
                .into(),
                GatewayError::Rejected(reason) => CheckoutError::GatewayRejected {
                    order_no: order_no.to_string(),
                    reason,
                }
                .into(),
                GatewayError::Transport(msg) => AppError::Internal(msg),
            });
        }
    };

    order::set_gateway_ref(&state.pool, order_id, &session.reference).await?;
    tracing::info!(order_no, user_id, total_idr, "Gateway session opened");

    Ok(SubmitOutcome {
        order_id,
        order_no: order_no.to_string(),
        status: OrderStatus::Pending,
        redirect_url: Some(session.redirect_url),
    })
}

#[allow(clippy::too_many_arguments)]
async fn insert_order_with_lines(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    order_id: i64,
    order_no: &str,
    user_id: i64,
    subtotal_idr: i64,
    discount_idr: i64,
    total_idr: i64,
    status: OrderStatus,
    payment_method: PaymentMethod,
    promo_code: Option<&str>,
    lines: &[PricedLine],
) -> AppResult<()> {
    order::insert(
        &mut **tx,
        &order::NewOrder {
            id: order_id,
            order_no,
            user_id,
            subtotal_idr,
            discount_idr,
            total_idr,
            status,
            payment_method,
            promo_code,
        },
    )
    .await?;

    for line in lines {
        order::insert_line(
            &mut **tx,
            &order::NewOrderLine {
                order_id,
                product_id: line.product_id,
                product_name: &line.product_name,
                category_id: line.category_id,
                quantity: line.quantity,
                unit_price_idr: line.unit_price_idr,
                kind: line.kind,
                fulfillment: line.fulfillment,
            },
        )
        .await?;
    }
    Ok(())
}
