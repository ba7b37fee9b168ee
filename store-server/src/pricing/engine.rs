//! Promo evaluation pipeline
//!
//! Steps run in order; each is a hard failure:
//! 1. code exists, is active, now inside validity window
//! 2. scope match with a non-empty eligible subtotal
//! 3. eligible subtotal >= min_subtotal_idr (0 disables the check)
//! 4. global redemption count < usage_limit (0 = unlimited)
//! 5. per-user redemption count < per_user_limit (0 = unlimited)
//! 6. discount computation
//!
//! The limits checked here are advisory reads for early feedback; the
//! authoritative enforcement is the guarded redemption insert at payment time
//! (`repository::promo::insert_redemption_guarded`).

use sqlx::SqlitePool;

use crate::checkout::CheckoutError;
use crate::db::repository::promo;
use crate::utils::AppResult;

use super::calculator::compute_discount;
use super::matcher::{eligible_subtotal, is_window_active};
use super::{PricedLine, PromoQuote};

fn invalid(code: &str, reason: impl Into<String>) -> CheckoutError {
    CheckoutError::PromoInvalid {
        code: code.to_string(),
        reason: reason.into(),
    }
}

/// Validate `code` against the priced lines and compute the discount
pub async fn evaluate(
    pool: &SqlitePool,
    code: &str,
    lines: &[PricedLine],
    user_id: i64,
    now: i64,
) -> AppResult<PromoQuote> {
    let normalized = code.trim().to_uppercase();

    // 1. Existence, active flag, validity window
    let promo = promo::find_by_code(pool, &normalized)
        .await?
        .ok_or_else(|| invalid(&normalized, "unknown code"))?;
    if !promo.is_active {
        return Err(invalid(&normalized, "code is inactive").into());
    }
    if !is_window_active(&promo, now) {
        return Err(invalid(&normalized, "code is outside its validity window").into());
    }

    // 2. Scope match over the candidate lines
    let targets = if promo.scope == shared::models::PromoScope::Order {
        Vec::new()
    } else {
        promo::targets(pool, promo.id).await?
    };
    let eligible = eligible_subtotal(promo.scope, &targets, lines);
    if eligible == 0 {
        return Err(invalid(&normalized, "no line in the order matches the code's scope").into());
    }

    // 3. Minimum subtotal (0 disables)
    if promo.min_subtotal_idr > 0 && eligible < promo.min_subtotal_idr {
        return Err(invalid(
            &normalized,
            format!(
                "eligible subtotal {} is below the minimum {}",
                eligible, promo.min_subtotal_idr
            ),
        )
        .into());
    }

    // 4./5. Usage limits, derived from redemption rows
    if promo.usage_limit > 0 {
        let used = promo::redemption_count(pool, promo.id).await?;
        if used >= promo.usage_limit {
            return Err(CheckoutError::PromoUsageExceeded { code: normalized }.into());
        }
    }
    if promo.per_user_limit > 0 {
        let used = promo::user_redemption_count(pool, promo.id, user_id).await?;
        if used >= promo.per_user_limit {
            return Err(CheckoutError::PromoUsageExceeded { code: normalized }.into());
        }
    }

    // 6. Discount
    let discount_idr = compute_discount(&promo, eligible);

    Ok(PromoQuote {
        promo,
        eligible_subtotal_idr: eligible,
        discount_idr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::AppError;
    use shared::models::{
        FulfillmentMode, ProductKind, PromoCodeCreate, PromoKind, PromoScope,
    };
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    fn line(product_id: i64, category_id: i64, quantity: i64, unit: i64) -> PricedLine {
        PricedLine {
            product_id,
            product_name: "p".into(),
            category_id,
            quantity,
            unit_price_idr: unit,
            line_total_idr: unit * quantity,
            kind: ProductKind::Keys,
            fulfillment: FulfillmentMode::Instant,
        }
    }

    fn save20() -> PromoCodeCreate {
        PromoCodeCreate {
            code: "SAVE20".into(),
            kind: PromoKind::Percent,
            value: 20,
            start_at: None,
            end_at: None,
            min_subtotal_idr: Some(100_000),
            max_discount_idr: Some(50_000),
            usage_limit: None,
            per_user_limit: None,
            scope: PromoScope::Order,
            target_ids: vec![],
        }
    }

    fn assert_promo_invalid(err: AppError) {
        assert!(
            matches!(
                err,
                AppError::Pipeline(CheckoutError::PromoInvalid { .. })
            ),
            "expected PromoInvalid, got {err:?}"
        );
    }

    #[tokio::test]
    async fn save20_scenario() {
        // 20% of 300000 = 60000, capped at 50000
        let pool = test_pool().await;
        promo::create(&pool, save20()).await.unwrap();

        let lines = [line(1, 1, 3, 100_000)];
        let quote = evaluate(&pool, "save20", &lines, 7, 1000).await.unwrap();
        assert_eq!(quote.eligible_subtotal_idr, 300_000);
        assert_eq!(quote.discount_idr, 50_000);
    }

    #[tokio::test]
    async fn unknown_code_is_invalid() {
        let pool = test_pool().await;
        let err = evaluate(&pool, "NOPE", &[line(1, 1, 1, 200_000)], 7, 1000)
            .await
            .unwrap_err();
        assert_promo_invalid(err);
    }

    #[tokio::test]
    async fn inactive_code_is_invalid() {
        let pool = test_pool().await;
        let created = promo::create(&pool, save20()).await.unwrap();
        promo::update(
            &pool,
            created.id,
            shared::models::PromoCodeUpdate {
                is_active: Some(false),
                value: None,
                start_at: None,
                end_at: None,
                min_subtotal_idr: None,
                max_discount_idr: None,
                usage_limit: None,
                per_user_limit: None,
                target_ids: None,
            },
        )
        .await
        .unwrap();

        let err = evaluate(&pool, "SAVE20", &[line(1, 1, 1, 200_000)], 7, 1000)
            .await
            .unwrap_err();
        assert_promo_invalid(err);
    }

    #[tokio::test]
    async fn expired_window_is_invalid() {
        let pool = test_pool().await;
        let mut create = save20();
        create.end_at = Some(500);
        promo::create(&pool, create).await.unwrap();

        let err = evaluate(&pool, "SAVE20", &[line(1, 1, 1, 200_000)], 7, 1000)
            .await
            .unwrap_err();
        assert_promo_invalid(err);
    }

    #[tokio::test]
    async fn scope_mismatch_is_invalid() {
        let pool = test_pool().await;
        let mut create = save20();
        create.scope = PromoScope::Category;
        create.target_ids = vec![99];
        create.min_subtotal_idr = None;
        promo::create(&pool, create).await.unwrap();

        // Cart category 1 never matches target category 99
        let err = evaluate(&pool, "SAVE20", &[line(1, 1, 2, 100_000)], 7, 1000)
            .await
            .unwrap_err();
        assert_promo_invalid(err);
    }

    #[tokio::test]
    async fn category_scope_discounts_matching_lines_only() {
        let pool = test_pool().await;
        let mut create = save20();
        create.scope = PromoScope::Category;
        create.target_ids = vec![10];
        create.min_subtotal_idr = None;
        create.max_discount_idr = None;
        promo::create(&pool, create).await.unwrap();

        let lines = [line(1, 10, 1, 100_000), line(2, 20, 1, 400_000)];
        let quote = evaluate(&pool, "SAVE20", &lines, 7, 1000).await.unwrap();
        // Only the category-10 line is eligible
        assert_eq!(quote.eligible_subtotal_idr, 100_000);
        assert_eq!(quote.discount_idr, 20_000);
    }

    #[tokio::test]
    async fn below_minimum_subtotal_is_invalid() {
        let pool = test_pool().await;
        promo::create(&pool, save20()).await.unwrap();

        let err = evaluate(&pool, "SAVE20", &[line(1, 1, 1, 80_000)], 7, 1000)
            .await
            .unwrap_err();
        assert_promo_invalid(err);
    }

    #[tokio::test]
    async fn usage_limit_reached_is_exceeded() {
        let pool = test_pool().await;
        let mut create = save20();
        create.usage_limit = Some(1);
        let created = promo::create(&pool, create).await.unwrap();
        let recorded = promo::insert_redemption_guarded(&pool, created.id, 42, 1, 10_000)
            .await
            .unwrap();
        assert!(recorded);

        let err = evaluate(&pool, "SAVE20", &[line(1, 1, 2, 100_000)], 7, 1000)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Pipeline(CheckoutError::PromoUsageExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn per_user_limit_is_per_user() {
        let pool = test_pool().await;
        let mut create = save20();
        create.per_user_limit = Some(1);
        let created = promo::create(&pool, create).await.unwrap();
        promo::insert_redemption_guarded(&pool, created.id, 7, 1, 10_000)
            .await
            .unwrap();

        // User 7 exhausted their quota
        let err = evaluate(&pool, "SAVE20", &[line(1, 1, 2, 100_000)], 7, 1000)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Pipeline(CheckoutError::PromoUsageExceeded { .. })
        ));

        // User 8 has not
        let quote = evaluate(&pool, "SAVE20", &[line(1, 1, 2, 100_000)], 8, 1000)
            .await
            .unwrap();
        assert_eq!(quote.discount_idr, 40_000);
    }

    #[tokio::test]
    async fn guarded_redemption_enforces_limits_exactly() {
        let pool = test_pool().await;
        let mut create = save20();
        create.usage_limit = Some(2);
        let created = promo::create(&pool, create).await.unwrap();

        assert!(promo::insert_redemption_guarded(&pool, created.id, 1, 1, 10_000).await.unwrap());
        assert!(promo::insert_redemption_guarded(&pool, created.id, 2, 2, 10_000).await.unwrap());
        // Third redemption bounces off the guard
        assert!(!promo::insert_redemption_guarded(&pool, created.id, 3, 3, 10_000).await.unwrap());
        assert_eq!(promo::redemption_count(&pool, created.id).await.unwrap(), 2);
    }
}
