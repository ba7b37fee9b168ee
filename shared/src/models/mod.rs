//! Data models
//!
//! Shared between store-server and the storefront/admin clients (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY), all money is IDR `i64`
//! (integer rupiah, no subunits), all timestamps are epoch millis `i64`.

pub mod delivery;
pub mod order;
pub mod product;
pub mod promo;
pub mod wallet;

// Re-exports
pub use delivery::*;
pub use order::*;
pub use product::*;
pub use promo::*;
pub use wallet::*;
