//! Product create/read/update/delete and safelisted search.
//!
//! Each mutation commits in its own atomic scope and is then recorded with an
//! ambient, best-effort audit append: a failed append is logged and the
//! mutation stands.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};

use shelfmark_audit::AuditService;
use shelfmark_contracts::{
    audit::{actions, AuditPayload, AuditPolicy},
    category::Category,
    error::{LedgerError, LedgerResult},
    generate_id,
    product::{Product, ProductDraft},
    search::{FilterOptions, Page},
};
use shelfmark_core::{
    run_atomic,
    traits::{Backend, StoreRead, StoreTx},
};
use shelfmark_schema::{validate_properties, Safelist};

pub struct ProductService {
    backend: Arc<dyn Backend>,
    audit: AuditService,
}

impl ProductService {
    pub fn new(backend: Arc<dyn Backend>, audit: AuditService) -> Self {
        Self { backend, audit }
    }

    /// Validate and store a new product.
    ///
    /// # Errors
    ///
    /// - `NotFound` when `category_id` names an unknown category
    /// - `Validation` for bad prices or properties that break the category schema
    /// - `Conflict` for a duplicate sku
    pub fn create_product(&self, draft: ProductDraft) -> LedgerResult<Product> {
        check_prices(draft.base_price, draft.cost_price)?;

        let product = run_atomic(self.backend.as_ref(), |tx| {
            let category = resolve_category(&*tx, draft.category_id.as_deref())?;
            validate_properties(category.as_ref(), &draft.properties)?;

            let product = draft.into_product(generate_id(), Utc::now());
            tx.insert_product(product.clone())?;
            Ok(product)
        })?;

        info!(product_id = %product.id, sku = %product.sku, "product created");
        self.audit.log_action(
            actions::CREATE_PRODUCT,
            product_payload(&product),
            AuditPolicy::BestEffort,
        )?;

        Ok(product)
    }

    pub fn get_product(&self, id: &str) -> LedgerResult<Product> {
        self.backend.read()?.get_product(id)
    }

    pub fn get_product_by_sku(&self, sku: &str) -> LedgerResult<Product> {
        self.backend.read()?.get_product_by_sku(sku)
    }

    pub fn list_products(&self, page: Page) -> LedgerResult<Vec<Product>> {
        self.backend.read()?.list_products(page)
    }

    /// Replace every editable field of product `id` with `draft`.
    ///
    /// `created_at` is kept; `updated_at` is refreshed.
    pub fn update_product(&self, id: &str, draft: ProductDraft) -> LedgerResult<Product> {
        check_prices(draft.base_price, draft.cost_price)?;

        let product = run_atomic(self.backend.as_ref(), |tx| {
            let existing = tx.get_product(id)?;
            let category = resolve_category(&*tx, draft.category_id.as_deref())?;
            validate_properties(category.as_ref(), &draft.properties)?;

            let mut product = draft.into_product(existing.id, Utc::now());
            product.created_at = existing.created_at;
            tx.update_product(&product)?;
            Ok(product)
        })?;

        info!(product_id = %product.id, "product updated");
        self.audit.log_action(
            actions::UPDATE_PRODUCT,
            product_payload(&product),
            AuditPolicy::BestEffort,
        )?;

        Ok(product)
    }

    /// Remove product `id`, returning what was removed.
    pub fn delete_product(&self, id: &str) -> LedgerResult<Product> {
        let removed = run_atomic(self.backend.as_ref(), |tx| {
            let product = tx.get_product(id)?;
            tx.delete_product(id)?;
            Ok(product)
        })?;

        info!(product_id = %removed.id, "product deleted");
        self.audit.log_action(
            actions::DELETE_PRODUCT,
            product_payload(&removed),
            AuditPolicy::BestEffort,
        )?;

        Ok(removed)
    }

    /// Search with property filters limited to the category's safelist.
    ///
    /// Filter keys the category does not declare, and every property filter
    /// when no category is given, are dropped rather than rejected.
    pub fn search_products(&self, mut filter: FilterOptions) -> LedgerResult<Vec<Product>> {
        let store = self.backend.read()?;
        let category = resolve_category(store.as_ref(), filter.category_id.as_deref())?;

        let dropped = Safelist::for_category(category.as_ref()).retain(&mut filter.properties);
        let hits = store.search_products(&filter)?;

        debug!(
            hits = hits.len(),
            property_filters = filter.properties.len(),
            dropped = dropped.len(),
            "product search"
        );
        Ok(hits)
    }
}

/// Load the category a product points at, if it points at one.
pub(crate) fn resolve_category<R: StoreRead + ?Sized>(
    store: &R,
    category_id: Option<&str>,
) -> LedgerResult<Option<Category>> {
    category_id.map(|id| store.get_category(id)).transpose()
}

pub(crate) fn check_prices(base_price: f64, cost_price: f64) -> LedgerResult<()> {
    for (field, value) in [("base_price", base_price), ("cost_price", cost_price)] {
        if !value.is_finite() || value < 0.0 {
            return Err(LedgerError::validation(format!(
                "{field} must be a non-negative number, got {value}"
            )));
        }
    }
    Ok(())
}

fn product_payload(product: &Product) -> AuditPayload {
    let mut payload = AuditPayload::new();
    payload.insert("product_id".to_string(), json!(product.id));
    payload.insert("sku".to_string(), json!(product.sku));
    payload.insert("name".to_string(), json!(product.name));
    payload
}
