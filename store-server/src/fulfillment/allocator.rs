//! Stock Allocator
//!
//! Issues one DeliveryItem per unit sold, dispatching on the product kind
//! once (the closed {KEYS, ACCESS_LINK, DIGITAL_ACCOUNT, SOURCE_CODE} set).
//! Pool withdrawal is the repository's compare-and-claim — never a count
//! check followed by a read. Already-issued items are never reissued: a
//! failing line aborts with everything issued so far left recorded for
//! admin inspection.

use shared::models::{Order, OrderLine, ProductKind, StockType};

use crate::checkout::CheckoutError;
use crate::core::ServerState;
use crate::db::repository::{delivery, product, stock};
use crate::fulfillment::downloads;
use crate::utils::{AppError, AppResult};

/// Fulfill every line of a paid order. Returns the typed pipeline error on
/// stock exhaustion; the caller owns the resulting status change and refund.
pub async fn fulfill_order(state: &ServerState, order: &Order, lines: &[OrderLine]) -> AppResult<()> {
    for line in lines {
        fulfill_line(state, order, line).await?;
    }
    Ok(())
}

async fn fulfill_line(state: &ServerState, order: &Order, line: &OrderLine) -> AppResult<()> {
    let product = product::find_by_id(&state.pool, line.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {} not found", line.product_id)))?;

    match line.kind {
        ProductKind::SourceCode => {
            // No file copies: each unit gets a rate-limited download token
            let source_file = product.source_file.as_deref().ok_or_else(|| {
                AppError::Internal(format!(
                    "Product {} has no source file configured",
                    product.id
                ))
            })?;
            for _ in 0..line.quantity {
                let token = downloads::mint(
                    &state.pool,
                    &state.config,
                    order.id,
                    line.product_id,
                    source_file,
                )
                .await?;
                delivery::insert(
                    &state.pool,
                    order.id,
                    line.product_id,
                    ProductKind::SourceCode,
                    &token,
                )
                .await?;
            }
        }
        ProductKind::Keys | ProductKind::AccessLink | ProductKind::DigitalAccount => {
            match product.stock_type {
                StockType::StockBased => {
                    for _ in 0..line.quantity {
                        let content = stock::claim_one(&state.pool, line.product_id, order.id)
                            .await?
                            .ok_or(CheckoutError::OutOfStock {
                                product_id: line.product_id,
                                product_name: line.product_name.clone(),
                            })?;
                        delivery::insert(
                            &state.pool,
                            order.id,
                            line.product_id,
                            line.kind,
                            &content,
                        )
                        .await?;
                    }
                }
                StockType::Unlimited => {
                    for _ in 0..line.quantity {
                        let content = state
                            .provisioner
                            .provision(&product)
                            .await
                            .map_err(AppError::Internal)?;
                        delivery::insert(
                            &state.pool,
                            order.id,
                            line.product_id,
                            line.kind,
                            &content,
                        )
                        .await?;
                    }
                }
            }
        }
    }
    Ok(())
}
