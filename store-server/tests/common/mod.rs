//! Shared test harness: ServerState with a temp-dir database and
//! gateway/mailer doubles.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use shared::models::{
    FulfillmentMode, LedgerKind, OrderStatus, PaymentMethod, Product, ProductCreate, ProductKind,
    StockType,
};
use store_server::db::repository::{ledger, order, product, stock};
use store_server::db::DbService;
use store_server::gateway::{GatewayError, GatewaySession, PaymentGateway};
use store_server::services::{MemoryMailer, UuidProvisioner};
use store_server::{Config, ServerState};

/// Gateway double: opens sessions without any network call
pub struct StubGateway {
    pub fail_with_timeout: bool,
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_session(
        &self,
        order_no: &str,
        _gross_amount_idr: i64,
        _user_id: i64,
    ) -> Result<GatewaySession, GatewayError> {
        if self.fail_with_timeout {
            return Err(GatewayError::Timeout);
        }
        Ok(GatewaySession {
            reference: format!("gw-{order_no}"),
            redirect_url: format!("https://pay.test/session/{order_no}"),
        })
    }
}

pub struct TestEnv {
    pub state: ServerState,
    pub mailer: Arc<MemoryMailer>,
    // Held so the database outlives the test
    _work_dir: tempfile::TempDir,
}

pub async fn test_env() -> TestEnv {
    test_env_with_gateway(StubGateway {
        fail_with_timeout: false,
    })
    .await
}

pub async fn test_env_with_gateway(gateway: StubGateway) -> TestEnv {
    let work_dir = tempfile::tempdir().expect("temp work dir");
    let config = Config::with_overrides(work_dir.path().to_string_lossy(), 0);
    config
        .ensure_work_dir_structure()
        .expect("work dir structure");

    let db_path = config.database_dir().join("store.db");
    let db = DbService::new(&db_path.to_string_lossy())
        .await
        .expect("test database");

    let mailer = Arc::new(MemoryMailer::default());
    let state = ServerState::with_parts(
        config,
        db.pool,
        Arc::new(gateway),
        mailer.clone(),
        Arc::new(UuidProvisioner),
    );

    TestEnv {
        state,
        mailer,
        _work_dir: work_dir,
    }
}

/// Seed a product; stock-based products also get `stock_items` pool entries
pub async fn seed_product(
    state: &ServerState,
    name: &str,
    price_idr: i64,
    kind: ProductKind,
    stock_type: StockType,
    fulfillment: FulfillmentMode,
    stock_items: &[&str],
) -> Product {
    let created = product::create(
        &state.pool,
        ProductCreate {
            name: name.into(),
            category_id: 1,
            price_idr,
            sale_price_idr: None,
            sale_start_at: None,
            sale_end_at: None,
            kind,
            stock_type,
            fulfillment,
            source_file: None,
        },
    )
    .await
    .expect("seed product");

    if !stock_items.is_empty() {
        let items: Vec<String> = stock_items.iter().map(|s| s.to_string()).collect();
        stock::add_items(&state.pool, created.id, &items)
            .await
            .expect("seed stock");
    }
    created
}

/// Credit a wallet through a TOPUP entry (the ledger is the only source of
/// balance)
pub async fn seed_balance(state: &ServerState, user_id: i64, amount_idr: i64) {
    ledger::insert(
        &state.pool,
        user_id,
        amount_idr,
        LedgerKind::Topup,
        "test-seed",
    )
    .await
    .expect("seed balance");
}

pub async fn balance_of(state: &ServerState, user_id: i64) -> i64 {
    ledger::balance(&state.pool, user_id).await.expect("balance")
}

/// Insert a bare PAID order row (for tests that attach tokens directly)
pub async fn seed_order(state: &ServerState, id: i64, user_id: i64) {
    order::insert(
        &state.pool,
        &order::NewOrder {
            id,
            order_no: &format!("INV-TEST-{id}"),
            user_id,
            subtotal_idr: 0,
            discount_idr: 0,
            total_idr: 0,
            status: OrderStatus::Paid,
            payment_method: PaymentMethod::Balance,
            promo_code: None,
        },
    )
    .await
    .expect("seed order");
}
