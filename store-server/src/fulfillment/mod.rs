//! Fulfillment: resolving digital delivery once an order is paid
//!
//! - **allocator**: per-line dispatch on product kind (pool claim, unlimited
//!   provisioning, download-token minting)
//! - **downloads**: rate-limited download tokens for SOURCE_CODE goods
//! - **manual**: admin-composed delivery emails for MANUAL products

pub mod allocator;
pub mod downloads;
pub mod manual;
