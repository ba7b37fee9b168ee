//! Order State Machine
//!
//! Owns the order lifecycle: `PENDING → {PAID, FAILED, CANCELLED}`,
//! `PAID → {DELIVERED, REFUNDED, FAILED}`. Entering PAID triggers one
//! synchronous attempt at instant fulfillment; orders with a MANUAL line stay
//! PAID in the admin queue. Status changes are compare-and-set at the
//! repository, so gateway callback replays and concurrent admin actions
//! cannot double-apply.

pub mod service;

pub use service::{confirm_gateway, fulfill_after_payment, get_detail, refund};
