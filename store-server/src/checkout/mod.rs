//! Checkout: pricing previews and the Payment Arbiter
//!
//! Turns a cart into a priced, promo-adjusted order and settles it either
//! from the internal wallet or through the external gateway. Pricing and
//! validation happen before any persistent state is created; external calls
//! (gateway session, mail) never run inside a write transaction.

pub mod error;
pub mod service;

pub use error::CheckoutError;
pub use service::{
    preview, price_lines, quote_promo, submit, CheckoutLineInput, CheckoutPreview, PromoQuoteView,
    SubmitOutcome, SubmitRequest,
};
