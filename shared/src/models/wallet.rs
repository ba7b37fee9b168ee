//! Wallet Ledger Models
//!
//! Balance is never stored: it is the signed sum of a user's ledger entries.

use serde::{Deserialize, Serialize};

/// Signed monetary event kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum LedgerKind {
    Topup,
    Debit,
    Refund,
    Adjust,
}

/// Append-only ledger entry — never updated or deleted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: i64,
    /// Signed IDR amount (negative for debits)
    pub amount_idr: i64,
    pub kind: LedgerKind,
    /// Order id or top-up request id this entry settles
    pub reference: String,
    pub created_at: i64,
}

/// Manual top-up request status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum TopUpStatus {
    Pending,
    Settled,
    Rejected,
}

/// User-created top-up request, transitioned only by an admin action
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TopUpRequest {
    pub id: i64,
    pub user_id: i64,
    pub gross_idr: i64,
    /// Transfer method as declared by the user (bank name, e-wallet, ...)
    pub method: String,
    pub proof_url: Option<String>,
    pub status: TopUpStatus,
    pub reviewer_note: Option<String>,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<i64>,
    pub created_at: i64,
}

/// Create top-up request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopUpCreate {
    pub gross_idr: i64,
    pub method: String,
    pub proof_url: Option<String>,
}

/// Wallet view: derived balance + recent activity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletView {
    pub user_id: i64,
    pub balance_idr: i64,
    pub entries: Vec<LedgerEntry>,
}
