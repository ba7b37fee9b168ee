//! Shared types for the Lapak storefront backend
//!
//! Domain models and utilities used by the store server and (via the API)
//! the storefront/admin clients.

pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
