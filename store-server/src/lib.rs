//! Lapak Store Server — checkout → payment → fulfillment backend for a
//! digital-goods storefront
//!
//! # Module structure
//!
//! ```text
//! store-server/src/
//! ├── core/          # config, state, HTTP server, background tasks
//! ├── auth/          # identity extractors (upstream auth collaborator)
//! ├── api/           # HTTP routes and handlers
//! ├── checkout/      # pricing previews + payment arbiter
//! ├── pricing/       # promo engine
//! ├── orders/        # order state machine
//! ├── fulfillment/   # stock allocator, download tokens, manual delivery
//! ├── wallet/        # ledger service (top-up review, adjustments)
//! ├── gateway/       # external payment gateway client + callback auth
//! ├── services/      # mailer and provisioning seams
//! ├── db/            # SQLite pool + repositories
//! └── utils/         # errors, logging
//! ```

pub mod api;
pub mod auth;
pub mod checkout;
pub mod core;
pub mod db;
pub mod fulfillment;
pub mod gateway;
pub mod orders;
pub mod pricing;
pub mod services;
pub mod utils;
pub mod wallet;

// Re-export common types
pub use checkout::CheckoutError;
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
    __                     __
   / /   ____ _____  ____ _/ /__
  / /   / __ `/ __ \/ __ `/ //_/
 / /___/ /_/ / /_/ / /_/ / ,<
/_____/\__,_/ .___/\__,_/_/|_|
           /_/   store server
    "#
    );
}
