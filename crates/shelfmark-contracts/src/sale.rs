//! Sales and their line items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A committed checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    /// Σ unit_price × quantity over the sale's items.
    pub total_amount: f64,
    pub created_at: DateTime<Utc>,
}

/// One line of a sale.
///
/// `unit_price` and `cost_price` are copied from the product when the sale is
/// processed and never change afterwards, whatever happens to the product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItem {
    pub sale_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub cost_price: f64,
}

/// A requested line in a sale, before validation.
///
/// `quantity` is signed so that a zero or negative request can be rejected
/// with a validation error instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

impl SaleItemRequest {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// A sale together with its line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleReceipt {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}
