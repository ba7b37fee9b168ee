//! Discount arithmetic
//!
//! Percent discounts round half-up to whole rupiah via `Decimal`; the result
//! is capped by `max_discount_idr` (percent only) and can never exceed the
//! eligible subtotal.

use rust_decimal::prelude::*;
use shared::models::{PromoCode, PromoKind};

/// Compute the discount for an eligible subtotal.
///
/// FIXED: the configured value. PERCENT:
/// `round(eligible * value / 100)`, capped at `max_discount_idr` when set.
pub fn compute_discount(promo: &PromoCode, eligible_subtotal_idr: i64) -> i64 {
    let raw = match promo.kind {
        PromoKind::Fixed => promo.value,
        PromoKind::Percent => {
            let eligible = Decimal::from(eligible_subtotal_idr);
            let pct = Decimal::from(promo.value) / Decimal::ONE_HUNDRED;
            let discount = (eligible * pct)
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
            let discount = discount.to_i64().unwrap_or(0);
            match promo.max_discount_idr {
                Some(cap) => discount.min(cap),
                None => discount,
            }
        }
    };
    // Discount can never exceed the eligible subtotal
    raw.clamp(0, eligible_subtotal_idr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::PromoScope;

    fn promo(kind: PromoKind, value: i64, max: Option<i64>) -> PromoCode {
        PromoCode {
            id: 1,
            code: "SAVE20".into(),
            kind,
            value,
            start_at: None,
            end_at: None,
            min_subtotal_idr: 0,
            max_discount_idr: max,
            usage_limit: 0,
            per_user_limit: 0,
            scope: PromoScope::Order,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn percent_with_cap() {
        // SAVE20: 20% of 300000 = 60000, capped at 50000
        let p = promo(PromoKind::Percent, 20, Some(50_000));
        assert_eq!(compute_discount(&p, 300_000), 50_000);
    }

    #[test]
    fn percent_without_cap() {
        let p = promo(PromoKind::Percent, 20, None);
        assert_eq!(compute_discount(&p, 300_000), 60_000);
    }

    #[test]
    fn percent_rounds_half_up() {
        // 15% of 333 = 49.95 -> 50
        let p = promo(PromoKind::Percent, 15, None);
        assert_eq!(compute_discount(&p, 333), 50);
        // 10% of 5 = 0.5 -> 1
        let p = promo(PromoKind::Percent, 10, None);
        assert_eq!(compute_discount(&p, 5), 1);
    }

    #[test]
    fn fixed_discount() {
        let p = promo(PromoKind::Fixed, 25_000, None);
        assert_eq!(compute_discount(&p, 100_000), 25_000);
    }

    #[test]
    fn discount_never_exceeds_eligible_subtotal() {
        let p = promo(PromoKind::Fixed, 150_000, None);
        assert_eq!(compute_discount(&p, 100_000), 100_000);
        // 100% promo stays at the subtotal
        let p = promo(PromoKind::Percent, 100, None);
        assert_eq!(compute_discount(&p, 80_000), 80_000);
    }

    #[test]
    fn zero_eligible_subtotal_means_zero_discount() {
        let p = promo(PromoKind::Fixed, 10_000, None);
        assert_eq!(compute_discount(&p, 0), 0);
    }
}
