//! `Ledger`: the single entry point callers use.
//!
//! Wires every service to one shared backend and one actor id, and exposes
//! the full operation surface as plain methods.

use std::io::BufRead;
use std::sync::Arc;

use shelfmark_audit::{AuditService, ChainBreak};
use shelfmark_contracts::{
    audit::AuditLogEntry,
    category::Category,
    error::LedgerResult,
    product::{Product, ProductDraft},
    sale::{SaleItemRequest, SaleReceipt},
    search::{FilterOptions, InventorySummary, Page},
};
use shelfmark_core::traits::{Backend, StoreRead};

use crate::{
    category::CategoryService, import::ImportPipeline, product::ProductService,
    sale::SaleProcessor,
};

pub struct Ledger {
    backend: Arc<dyn Backend>,
    categories: CategoryService,
    products: ProductService,
    importer: ImportPipeline,
    sales: SaleProcessor,
    audit: AuditService,
}

impl Ledger {
    /// `actor` is recorded on every audit entry this ledger appends.
    pub fn new(backend: Arc<dyn Backend>, actor: impl Into<String>) -> Self {
        let actor = actor.into();
        let audit = AuditService::new(backend.clone(), actor.clone());

        Self {
            categories: CategoryService::new(backend.clone()),
            products: ProductService::new(backend.clone(), audit.clone()),
            importer: ImportPipeline::new(backend.clone(), actor.clone()),
            sales: SaleProcessor::new(backend.clone(), actor),
            audit,
            backend,
        }
    }

    pub fn actor(&self) -> &str {
        self.audit.actor()
    }

    // ── Categories ───────────────────────────────────────────────────────────

    pub fn create_category(&self, category: Category) -> LedgerResult<Category> {
        self.categories.create_category(category)
    }

    pub fn get_category(&self, id: &str) -> LedgerResult<Category> {
        self.categories.get_category(id)
    }

    pub fn list_categories(&self, page: Page) -> LedgerResult<Vec<Category>> {
        self.categories.list_categories(page)
    }

    // ── Products ─────────────────────────────────────────────────────────────

    pub fn create_product(&self, draft: ProductDraft) -> LedgerResult<Product> {
        self.products.create_product(draft)
    }

    pub fn get_product(&self, id: &str) -> LedgerResult<Product> {
        self.products.get_product(id)
    }

    pub fn get_product_by_sku(&self, sku: &str) -> LedgerResult<Product> {
        self.products.get_product_by_sku(sku)
    }

    pub fn list_products(&self, page: Page) -> LedgerResult<Vec<Product>> {
        self.products.list_products(page)
    }

    pub fn update_product(&self, id: &str, draft: ProductDraft) -> LedgerResult<Product> {
        self.products.update_product(id, draft)
    }

    pub fn delete_product(&self, id: &str) -> LedgerResult<Product> {
        self.products.delete_product(id)
    }

    pub fn search_products(&self, filter: FilterOptions) -> LedgerResult<Vec<Product>> {
        self.products.search_products(filter)
    }

    pub fn import_products<R: BufRead>(
        &self,
        category_id: Option<&str>,
        input: R,
    ) -> LedgerResult<usize> {
        self.importer.import_products(category_id, input)
    }

    // ── Sales ────────────────────────────────────────────────────────────────

    pub fn process_sale(&self, items: &[SaleItemRequest]) -> LedgerResult<SaleReceipt> {
        self.sales.process_sale(items)
    }

    pub fn get_sale(&self, id: &str) -> LedgerResult<SaleReceipt> {
        self.sales.get_sale(id)
    }

    pub fn inventory_summary(&self) -> LedgerResult<InventorySummary> {
        self.backend.read()?.inventory_summary()
    }

    // ── Audit ────────────────────────────────────────────────────────────────

    pub fn list_audit_logs(&self, page: Page) -> LedgerResult<Vec<AuditLogEntry>> {
        self.audit.list(page)
    }

    pub fn verify_audit_chain(&self) -> LedgerResult<bool> {
        self.audit.verify_chain()
    }

    /// The first entry at which the chain breaks, if any.
    pub fn audit_chain_break(&self) -> LedgerResult<Option<ChainBreak>> {
        self.audit.first_break()
    }

    /// `Integrity` error when the chain does not verify.
    pub fn ensure_audit_chain_intact(&self) -> LedgerResult<()> {
        self.audit.ensure_chain_intact()
    }
}
