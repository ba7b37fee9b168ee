//! Concurrency properties: the pipeline must hold its invariants under
//! simultaneous requests — no overdraw, no double-issued stock item, no
//! over-redeemed promo, no sixth download.

mod common;

use common::{balance_of, seed_balance, seed_product, test_env};
use shared::models::{
    FulfillmentMode, OrderStatus, PaymentMethod, ProductKind, PromoCodeCreate, PromoKind,
    PromoScope, StockType,
};
use store_server::checkout::{self, CheckoutError, CheckoutLineInput, SubmitRequest};
use store_server::db::repository::{delivery, download, ledger, order, promo};
use store_server::fulfillment::downloads;
use store_server::AppError;

fn submit_req(product_id: i64, quantity: i64, promo_code: Option<&str>) -> SubmitRequest {
    SubmitRequest {
        lines: vec![CheckoutLineInput {
            product_id,
            quantity,
        }],
        payment_method: PaymentMethod::Balance,
        promo_code: promo_code.map(String::from),
    }
}

#[tokio::test]
async fn concurrent_checkouts_cannot_overdraw_wallet() {
    let env = test_env().await;
    let p = seed_product(
        &env.state,
        "Steam Key",
        80_000,
        ProductKind::Keys,
        StockType::StockBased,
        FulfillmentMode::Instant,
        &["K-1", "K-2", "K-3", "K-4"],
    )
    .await;
    let buyer = 9001;
    // Enough for one order, not for two
    seed_balance(&env.state, buyer, 100_000).await;

    let mut handles = Vec::new();
    for _ in 0..2 {
        let state = env.state.clone();
        let req = submit_req(p.id, 1, None);
        handles.push(tokio::spawn(async move {
            checkout::submit(&state, buyer, &req).await
        }));
    }

    let mut successes = 0;
    let mut shortfalls = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(AppError::Pipeline(CheckoutError::InsufficientBalance { .. })) => shortfalls += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(shortfalls, 1);

    // balance == sum of ledger entries, never negative
    assert_eq!(balance_of(&env.state, buyer).await, 20_000);
}

#[tokio::test]
async fn last_stock_item_goes_to_exactly_one_order() {
    let env = test_env().await;
    let p = seed_product(
        &env.state,
        "Steam Key",
        50_000,
        ProductKind::Keys,
        StockType::StockBased,
        FulfillmentMode::Instant,
        &["LAST-KEY"],
    )
    .await;
    let alice = 9101;
    let bob = 9102;
    seed_balance(&env.state, alice, 100_000).await;
    seed_balance(&env.state, bob, 100_000).await;

    let state_a = env.state.clone();
    let state_b = env.state.clone();
    let req_a = submit_req(p.id, 1, None);
    let req_b = submit_req(p.id, 1, None);
    let (res_a, res_b) = tokio::join!(
        tokio::spawn(async move { checkout::submit(&state_a, alice, &req_a).await }),
        tokio::spawn(async move { checkout::submit(&state_b, bob, &req_b).await }),
    );
    let results = [res_a.unwrap(), res_b.unwrap()];

    let winners: Vec<_> = results.iter().filter(|r| r.is_ok()).collect();
    assert_eq!(winners.len(), 1, "exactly one checkout may win the last item");
    for result in &results {
        if let Err(e) = result {
            assert!(
                matches!(e, AppError::Pipeline(CheckoutError::OutOfStock { .. })),
                "loser must see OutOfStock, got {e:?}"
            );
        }
    }

    // The item was issued exactly once across all delivery items
    let mut issued = Vec::new();
    for user in [alice, bob] {
        for summary in order::find_by_user(&env.state.pool, user, 10, 0).await.unwrap() {
            for item in delivery::find_by_order(&env.state.pool, summary.id).await.unwrap() {
                issued.push(item.content);
            }
        }
    }
    assert_eq!(issued, vec!["LAST-KEY".to_string()]);

    // The loser's captured payment was reversed
    let total_balance = balance_of(&env.state, alice).await + balance_of(&env.state, bob).await;
    assert_eq!(total_balance, 200_000 - 50_000);
}

#[tokio::test]
async fn promo_usage_limit_holds_under_concurrency() {
    let env = test_env().await;
    let p = seed_product(
        &env.state,
        "Bundle",
        100_000,
        ProductKind::Keys,
        StockType::Unlimited,
        FulfillmentMode::Instant,
        &[],
    )
    .await;
    let created = promo::create(
        &env.state.pool,
        PromoCodeCreate {
            code: "ONCE".into(),
            kind: PromoKind::Fixed,
            value: 30_000,
            start_at: None,
            end_at: None,
            min_subtotal_idr: None,
            max_discount_idr: None,
            usage_limit: Some(1),
            per_user_limit: None,
            scope: PromoScope::Order,
            target_ids: vec![],
        },
    )
    .await
    .unwrap();

    let users = [9201, 9202, 9203, 9204];
    for user in users {
        seed_balance(&env.state, user, 200_000).await;
    }

    let mut handles = Vec::new();
    for user in users {
        let state = env.state.clone();
        let req = submit_req(p.id, 1, Some("ONCE"));
        handles.push(tokio::spawn(async move {
            checkout::submit(&state, user, &req).await
        }));
    }

    let mut discounted = 0;
    let mut exceeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => discounted += 1,
            Err(AppError::Pipeline(CheckoutError::PromoUsageExceeded { .. })) => exceeded += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    // Exactly one submission may consume the single redemption
    assert_eq!(discounted, 1);
    assert_eq!(exceeded, 3);
    assert_eq!(
        promo::redemption_count(&env.state.pool, created.id).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn download_token_spends_at_most_its_quota_concurrently() {
    let env = test_env().await;
    common::seed_order(&env.state, 1, 9250).await;
    download::insert(
        &env.state.pool,
        "hot-token",
        1,
        1,
        "file.zip",
        5,
        shared::util::now_millis() + 3_600_000,
    )
    .await
    .unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let pool = env.state.pool.clone();
        handles.push(tokio::spawn(async move {
            downloads::consume(&pool, "hot-token").await
        }));
    }

    let mut granted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => granted += 1,
            Err(AppError::Pipeline(CheckoutError::DownloadExhausted)) => rejected += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(granted, 5);
    assert_eq!(rejected, 5);

    let token = download::find_by_token(&env.state.pool, "hot-token")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(token.downloads_remaining, 0);
}

#[tokio::test]
async fn ledger_balance_is_always_the_sum_of_entries() {
    let env = test_env().await;
    let buyer = 9301;
    let p = seed_product(
        &env.state,
        "Steam Key",
        40_000,
        ProductKind::Keys,
        StockType::StockBased,
        FulfillmentMode::Instant,
        &["K-1", "K-2", "K-3"],
    )
    .await;
    seed_balance(&env.state, buyer, 150_000).await;

    let outcome = checkout::submit(&env.state, buyer, &submit_req(p.id, 2, None))
        .await
        .unwrap();
    assert_eq!(outcome.status, OrderStatus::Delivered);

    let entries = ledger::entries(&env.state.pool, buyer, 100).await.unwrap();
    let sum: i64 = entries.iter().map(|e| e.amount_idr).sum();
    assert_eq!(sum, balance_of(&env.state, buyer).await);
    assert_eq!(sum, 150_000 - 80_000);
}
