//! Promo matching: validity window and scope

use shared::models::{PromoCode, PromoScope};

use super::PricedLine;

/// Check the validity window [start_at, end_at]; missing bounds mean
/// unbounded on that side.
pub fn is_window_active(promo: &PromoCode, now: i64) -> bool {
    let after_start = promo.start_at.map(|s| now >= s).unwrap_or(true);
    let before_end = promo.end_at.map(|e| now <= e).unwrap_or(true);
    after_start && before_end
}

/// Subtotal of the lines the code applies to.
///
/// ORDER covers every line. CATEGORY/PRODUCT cover only lines whose
/// category/product id is in the configured target set — the discount is
/// computed over the matching lines' subtotal, not the whole order.
pub fn eligible_subtotal(scope: PromoScope, targets: &[i64], lines: &[PricedLine]) -> i64 {
    lines
        .iter()
        .filter(|line| match scope {
            PromoScope::Order => true,
            PromoScope::Category => targets.contains(&line.category_id),
            PromoScope::Product => targets.contains(&line.product_id),
        })
        .map(|line| line.line_total_idr)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{FulfillmentMode, ProductKind, PromoKind};

    fn promo(start: Option<i64>, end: Option<i64>) -> PromoCode {
        PromoCode {
            id: 1,
            code: "TEST".into(),
            kind: PromoKind::Fixed,
            value: 1000,
            start_at: start,
            end_at: end,
            min_subtotal_idr: 0,
            max_discount_idr: None,
            usage_limit: 0,
            per_user_limit: 0,
            scope: PromoScope::Order,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn line(product_id: i64, category_id: i64, total: i64) -> PricedLine {
        PricedLine {
            product_id,
            product_name: "p".into(),
            category_id,
            quantity: 1,
            unit_price_idr: total,
            line_total_idr: total,
            kind: ProductKind::Keys,
            fulfillment: FulfillmentMode::Instant,
        }
    }

    #[test]
    fn window_missing_bounds_is_unbounded() {
        assert!(is_window_active(&promo(None, None), 42));
        assert!(is_window_active(&promo(Some(10), None), 10));
        assert!(!is_window_active(&promo(Some(10), None), 9));
        assert!(is_window_active(&promo(None, Some(10)), 10));
        assert!(!is_window_active(&promo(None, Some(10)), 11));
    }

    #[test]
    fn order_scope_covers_everything() {
        let lines = [line(1, 10, 5000), line(2, 20, 7000)];
        assert_eq!(eligible_subtotal(PromoScope::Order, &[], &lines), 12_000);
    }

    #[test]
    fn category_scope_covers_matching_lines_only() {
        let lines = [line(1, 10, 5000), line(2, 20, 7000)];
        assert_eq!(eligible_subtotal(PromoScope::Category, &[10], &lines), 5000);
        assert_eq!(eligible_subtotal(PromoScope::Category, &[30], &lines), 0);
    }

    #[test]
    fn product_scope_covers_matching_lines_only() {
        let lines = [line(1, 10, 5000), line(2, 20, 7000)];
        assert_eq!(eligible_subtotal(PromoScope::Product, &[2], &lines), 7000);
        assert_eq!(
            eligible_subtotal(PromoScope::Product, &[1, 2], &lines),
            12_000
        );
    }
}
