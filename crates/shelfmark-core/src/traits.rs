//! Store capability traits for the shelfmark write pipeline.
//!
//! These traits define the complete storage boundary:
//!
//! - `StoreRead`: consistent read access to products, categories, sales and
//!   the audit log
//! - `StoreTx`: the transaction-scoped capability bundle (reads + writes)
//! - `Transaction`: a `StoreTx` that can be committed or rolled back
//! - `Backend`: the transaction boundary primitive the atomic scope wraps
//!
//! Services only ever see `&dyn StoreRead` or `&mut dyn StoreTx`, so the same
//! code runs against any backend without knowing how isolation is achieved.

use shelfmark_contracts::{
    audit::{AuditLogEntry, PendingAuditEntry},
    category::Category,
    error::LedgerResult,
    product::Product,
    sale::{Sale, SaleItem},
    search::{FilterOptions, InventorySummary, Page},
};

/// Read-only access to committed (or, inside a transaction, working) state.
pub trait StoreRead {
    // ── Products ─────────────────────────────────────────────────────────────

    /// Return `LedgerError::NotFound` when no product has this id.
    fn get_product(&self, id: &str) -> LedgerResult<Product>;

    /// Return `LedgerError::NotFound` when no product has this sku.
    fn get_product_by_sku(&self, sku: &str) -> LedgerResult<Product>;

    /// Products ordered newest first.
    fn list_products(&self, page: Page) -> LedgerResult<Vec<Product>>;

    /// Products matching every criterion in `filter`, newest first.
    ///
    /// The caller is responsible for dropping property keys that are not
    /// safelisted; the store matches whatever keys it is given.
    fn search_products(&self, filter: &FilterOptions) -> LedgerResult<Vec<Product>>;

    fn inventory_summary(&self) -> LedgerResult<InventorySummary>;

    // ── Categories ───────────────────────────────────────────────────────────

    fn get_category(&self, id: &str) -> LedgerResult<Category>;

    fn list_categories(&self, page: Page) -> LedgerResult<Vec<Category>>;

    // ── Sales ────────────────────────────────────────────────────────────────

    fn get_sale(&self, id: &str) -> LedgerResult<Sale>;

    /// Items of one sale in insertion order.
    fn list_sale_items(&self, sale_id: &str) -> LedgerResult<Vec<SaleItem>>;

    // ── Audit log ────────────────────────────────────────────────────────────

    /// The most recently appended entry, or `None` for an empty chain.
    fn last_audit_entry(&self) -> LedgerResult<Option<AuditLogEntry>>;

    /// Entries newest first.
    fn list_audit_entries(&self, page: Page) -> LedgerResult<Vec<AuditLogEntry>>;

    /// Every entry in ascending append order.
    fn all_audit_entries(&self) -> LedgerResult<Vec<AuditLogEntry>>;
}

/// The transaction-scoped capability bundle.
///
/// Every write made through a `StoreTx` becomes visible to other readers only
/// when the owning `Transaction` commits.
pub trait StoreTx: StoreRead {
    /// Reject a duplicate sku with `LedgerError::Conflict`.
    fn insert_product(&mut self, product: Product) -> LedgerResult<()>;

    /// Replace the stored product with the same id.
    fn update_product(&mut self, product: &Product) -> LedgerResult<()>;

    fn delete_product(&mut self, id: &str) -> LedgerResult<()>;

    fn insert_category(&mut self, category: Category) -> LedgerResult<()>;

    fn insert_sale(&mut self, sale: &Sale) -> LedgerResult<()>;

    fn insert_sale_item(&mut self, item: &SaleItem) -> LedgerResult<()>;

    /// Append an entry to the audit log, assigning its sequence id.
    ///
    /// Append-only: there is no way to modify or remove an entry once written.
    fn append_audit_entry(&mut self, entry: PendingAuditEntry) -> LedgerResult<AuditLogEntry>;
}

/// A unit of work that is either committed or rolled back as a whole.
pub trait Transaction: StoreTx {
    /// This transaction viewed as the capability bundle handed to work.
    fn store_tx(&mut self) -> &mut dyn StoreTx;

    /// Make every change durable and visible. Consumes the transaction.
    fn commit(self: Box<Self>) -> LedgerResult<()>;

    /// Discard every change. Dropping a transaction without committing has
    /// the same effect.
    fn rollback(self: Box<Self>);
}

/// The transaction boundary primitive.
///
/// Implementations are single-writer: `begin()` blocks until no other
/// transaction is open. Readers obtained through `read()` are never blocked by
/// the writer and always observe committed state.
pub trait Backend: Send + Sync {
    fn begin(&self) -> LedgerResult<Box<dyn Transaction + '_>>;

    fn read(&self) -> LedgerResult<Box<dyn StoreRead + '_>>;
}
