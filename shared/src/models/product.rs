//! Product Model
//!
//! The pipeline only reads the fields below; catalog presentation (images,
//! descriptions, theming) lives in the storefront client.

use serde::{Deserialize, Serialize};

/// What kind of digital good a product delivers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ProductKind {
    Keys,
    AccessLink,
    DigitalAccount,
    SourceCode,
}

/// Whether delivery draws from a finite pool or is synthesized on demand
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum StockType {
    Unlimited,
    StockBased,
}

/// Whether delivery resolves automatically at payment time or requires a
/// human-composed email
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum FulfillmentMode {
    Instant,
    Manual,
}

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    /// Regular price (IDR)
    pub price_idr: i64,
    /// Sale price, honored only inside the sale window
    pub sale_price_idr: Option<i64>,
    pub sale_start_at: Option<i64>,
    pub sale_end_at: Option<i64>,
    pub kind: ProductKind,
    pub stock_type: StockType,
    pub fulfillment: FulfillmentMode,
    /// File reference for SOURCE_CODE products (relative to the files dir)
    pub source_file: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Product {
    /// Server-authoritative effective unit price: the sale price counts only
    /// while `now` is inside `[sale_start_at, sale_end_at]` (missing bounds
    /// mean unbounded on that side). Client-side countdowns are cosmetic.
    pub fn effective_price(&self, now: i64) -> i64 {
        match self.sale_price_idr {
            Some(sale) if self.sale_active(now) => sale,
            _ => self.price_idr,
        }
    }

    fn sale_active(&self, now: i64) -> bool {
        if self.sale_price_idr.is_none() {
            return false;
        }
        let after_start = self.sale_start_at.map(|s| now >= s).unwrap_or(true);
        let before_end = self.sale_end_at.map(|e| now <= e).unwrap_or(true);
        after_start && before_end
    }
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub category_id: i64,
    pub price_idr: i64,
    pub sale_price_idr: Option<i64>,
    pub sale_start_at: Option<i64>,
    pub sale_end_at: Option<i64>,
    pub kind: ProductKind,
    pub stock_type: StockType,
    pub fulfillment: FulfillmentMode,
    pub source_file: Option<String>,
}

/// Update product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub category_id: Option<i64>,
    pub price_idr: Option<i64>,
    pub sale_price_idr: Option<i64>,
    pub sale_start_at: Option<i64>,
    pub sale_end_at: Option<i64>,
    pub source_file: Option<String>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(sale: Option<i64>, start: Option<i64>, end: Option<i64>) -> Product {
        Product {
            id: 1,
            name: "Test".into(),
            category_id: 1,
            price_idr: 100_000,
            sale_price_idr: sale,
            sale_start_at: start,
            sale_end_at: end,
            kind: ProductKind::Keys,
            stock_type: StockType::StockBased,
            fulfillment: FulfillmentMode::Instant,
            source_file: None,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn regular_price_without_sale() {
        assert_eq!(product(None, None, None).effective_price(1000), 100_000);
    }

    #[test]
    fn sale_price_inside_window() {
        let p = product(Some(75_000), Some(500), Some(1500));
        assert_eq!(p.effective_price(1000), 75_000);
    }

    #[test]
    fn regular_price_outside_window() {
        let p = product(Some(75_000), Some(500), Some(1500));
        assert_eq!(p.effective_price(2000), 100_000);
        assert_eq!(p.effective_price(100), 100_000);
    }

    #[test]
    fn missing_bounds_mean_unbounded() {
        let p = product(Some(75_000), None, None);
        assert_eq!(p.effective_price(1), 75_000);
        let p = product(Some(75_000), Some(500), None);
        assert_eq!(p.effective_price(400), 100_000);
        assert_eq!(p.effective_price(600), 75_000);
    }
}
