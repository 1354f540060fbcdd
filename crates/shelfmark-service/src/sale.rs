//! The sale processor.
//!
//! A sale runs entirely inside one atomic scope:
//!
//!   check stock → decrement → snapshot prices → total → insert sale → audit
//!
//! Any failure, including the audit append, rolls back every stock change,
//! the sale, its items and the audit entry together.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};

use shelfmark_audit::ChainCursor;
use shelfmark_contracts::{
    audit::{actions, AuditPayload},
    error::{LedgerError, LedgerResult},
    generate_id,
    sale::{Sale, SaleItem, SaleItemRequest, SaleReceipt},
};
use shelfmark_core::{
    run_atomic,
    traits::{Backend, StoreRead, StoreTx},
};

pub struct SaleProcessor {
    backend: Arc<dyn Backend>,
    actor: String,
}

impl SaleProcessor {
    pub fn new(backend: Arc<dyn Backend>, actor: impl Into<String>) -> Self {
        Self {
            backend,
            actor: actor.into(),
        }
    }

    /// Sell `items` in request order.
    ///
    /// Each item's unit and cost price are copied from the product as it is
    /// at the time of the sale. The same product may appear more than once;
    /// later items see the stock left by earlier ones.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty list (no scope opened) or a non-positive quantity
    /// - `NotFound` for an unknown product
    /// - `InsufficientStock` when a product has fewer units than requested,
    ///   including counts too large to stock at all
    pub fn process_sale(&self, items: &[SaleItemRequest]) -> LedgerResult<SaleReceipt> {
        if items.is_empty() {
            return Err(LedgerError::validation("no items in sale"));
        }

        let receipt = run_atomic(self.backend.as_ref(), |tx| {
            let mut cursor = ChainCursor::seed(&*tx)?;
            let sale_id = generate_id();
            let now = Utc::now();

            let mut total_amount = 0.0;
            let mut sold = Vec::with_capacity(items.len());

            for request in items {
                let wanted = requested_units(request)?;
                let mut product = tx.get_product(&request.product_id)?;

                let requested = match u32::try_from(wanted) {
                    Ok(units) if units <= product.quantity => units,
                    _ => {
                        return Err(LedgerError::InsufficientStock {
                            product_id: product.id,
                            available: product.quantity,
                            requested: u32::try_from(wanted).unwrap_or(u32::MAX),
                        })
                    }
                };

                product.quantity -= requested;
                product.updated_at = now;
                tx.update_product(&product)?;

                let item = SaleItem {
                    sale_id: sale_id.clone(),
                    product_id: product.id.clone(),
                    quantity: requested,
                    unit_price: product.base_price,
                    cost_price: product.cost_price,
                };
                tx.insert_sale_item(&item)?;

                total_amount += item.unit_price * f64::from(requested);
                debug!(
                    sale_id = %sale_id,
                    product_id = %product.id,
                    quantity = requested,
                    remaining = product.quantity,
                    "sale item recorded"
                );
                sold.push(item);
            }

            let sale = Sale {
                id: sale_id,
                total_amount,
                created_at: now,
            };
            tx.insert_sale(&sale)?;

            cursor.append(
                tx,
                actions::SALE_PROCESSED,
                &self.actor,
                sale_payload(&sale, sold.len()),
            )?;

            Ok(SaleReceipt { sale, items: sold })
        })?;

        info!(
            sale_id = %receipt.sale.id,
            total_amount = receipt.sale.total_amount,
            items = receipt.items.len(),
            "sale processed"
        );
        Ok(receipt)
    }

    /// A committed sale and its items.
    pub fn get_sale(&self, id: &str) -> LedgerResult<SaleReceipt> {
        let store = self.backend.read()?;
        let sale = store.get_sale(id)?;
        let items = store.list_sale_items(id)?;
        Ok(SaleReceipt { sale, items })
    }
}

/// The positive unit count of a request. Counts beyond `u32` are left for
/// the stock check to refuse.
fn requested_units(request: &SaleItemRequest) -> LedgerResult<u64> {
    u64::try_from(request.quantity)
        .ok()
        .filter(|units| *units > 0)
        .ok_or_else(|| {
            LedgerError::validation(format!(
                "invalid quantity {} for product '{}'",
                request.quantity, request.product_id
            ))
        })
}

fn sale_payload(sale: &Sale, item_count: usize) -> AuditPayload {
    let mut payload = AuditPayload::new();
    payload.insert("sale_id".to_string(), json!(sale.id));
    payload.insert("total_amount".to_string(), json!(sale.total_amount));
    payload.insert("item_count".to_string(), json!(item_count));
    payload
}
