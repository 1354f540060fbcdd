//! The atomic scope manager: one all-or-nothing unit of work per call.
//!
//! The scope enforces a single rule:
//!
//!   begin → work(&mut StoreTx) → commit | rollback
//!
//! `work` commits only if it returns `Ok`. An `Err` rolls back and is
//! returned unchanged. A panic inside `work` rolls back and is re-raised to
//! the caller, never swallowed. Scopes do not nest: an operation that needs
//! compound consistency opens exactly one scope for all of its writes.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use shelfmark_contracts::error::LedgerResult;

use crate::traits::{Backend, StoreTx};

/// Runs closures against a fresh transaction from a `Backend`.
#[derive(Clone, Copy)]
pub struct AtomicScope<'b> {
    backend: &'b dyn Backend,
}

impl<'b> AtomicScope<'b> {
    pub fn new(backend: &'b dyn Backend) -> Self {
        Self { backend }
    }

    /// Run `work` inside one transaction.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `work` (after rolling back), or the
    /// backend's error if the transaction cannot begin or commit.
    ///
    /// # Panics
    ///
    /// Re-raises any panic from `work` after the transaction is rolled back.
    pub fn run<T, F>(&self, work: F) -> LedgerResult<T>
    where
        F: FnOnce(&mut dyn StoreTx) -> LedgerResult<T>,
    {
        let mut tx = self.backend.begin()?;
        debug!("atomic scope opened");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(tx.store_tx())));

        match outcome {
            Ok(Ok(value)) => {
                tx.commit()?;
                debug!("atomic scope committed");
                Ok(value)
            }
            Ok(Err(err)) => {
                tx.rollback();
                warn!(error = %err, "atomic scope rolled back");
                Err(err)
            }
            Err(payload) => {
                tx.rollback();
                warn!("atomic scope rolled back after panic");
                panic::resume_unwind(payload)
            }
        }
    }
}

/// Shorthand for `AtomicScope::new(backend).run(work)`.
pub fn run_atomic<T, F>(backend: &dyn Backend, work: F) -> LedgerResult<T>
where
    F: FnOnce(&mut dyn StoreTx) -> LedgerResult<T>,
{
    AtomicScope::new(backend).run(work)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::{Arc, Mutex};

    use shelfmark_contracts::{
        audit::{AuditLogEntry, PendingAuditEntry},
        category::Category,
        error::{LedgerError, LedgerResult},
        product::Product,
        sale::{Sale, SaleItem},
        search::{FilterOptions, InventorySummary, Page},
    };

    use crate::traits::{Backend, StoreRead, StoreTx, Transaction};

    use super::{run_atomic, AtomicScope};

    // ── Mock backend ─────────────────────────────────────────────────────────

    /// Records lifecycle events and the categories "written" in each
    /// transaction, only publishing writes on commit.
    #[derive(Default)]
    struct RecordingBackend {
        events: Arc<Mutex<Vec<&'static str>>>,
        committed: Arc<Mutex<Vec<String>>>,
        fail_commit: bool,
    }

    struct RecordingTx<'a> {
        backend: &'a RecordingBackend,
        pending: Vec<String>,
    }

    fn unsupported<T>() -> LedgerResult<T> {
        Err(LedgerError::storage("not supported by recording backend"))
    }

    impl StoreRead for RecordingTx<'_> {
        fn get_product(&self, _id: &str) -> LedgerResult<Product> {
            unsupported()
        }
        fn get_product_by_sku(&self, _sku: &str) -> LedgerResult<Product> {
            unsupported()
        }
        fn list_products(&self, _page: Page) -> LedgerResult<Vec<Product>> {
            unsupported()
        }
        fn search_products(&self, _filter: &FilterOptions) -> LedgerResult<Vec<Product>> {
            unsupported()
        }
        fn inventory_summary(&self) -> LedgerResult<InventorySummary> {
            unsupported()
        }
        fn get_category(&self, id: &str) -> LedgerResult<Category> {
            Err(LedgerError::not_found("category", id))
        }
        fn list_categories(&self, _page: Page) -> LedgerResult<Vec<Category>> {
            unsupported()
        }
        fn get_sale(&self, _id: &str) -> LedgerResult<Sale> {
            unsupported()
        }
        fn list_sale_items(&self, _sale_id: &str) -> LedgerResult<Vec<SaleItem>> {
            unsupported()
        }
        fn last_audit_entry(&self) -> LedgerResult<Option<AuditLogEntry>> {
            Ok(None)
        }
        fn list_audit_entries(&self, _page: Page) -> LedgerResult<Vec<AuditLogEntry>> {
            unsupported()
        }
        fn all_audit_entries(&self) -> LedgerResult<Vec<AuditLogEntry>> {
            unsupported()
        }
    }

    impl StoreTx for RecordingTx<'_> {
        fn insert_product(&mut self, _product: Product) -> LedgerResult<()> {
            unsupported()
        }
        fn update_product(&mut self, _product: &Product) -> LedgerResult<()> {
            unsupported()
        }
        fn delete_product(&mut self, _id: &str) -> LedgerResult<()> {
            unsupported()
        }
        fn insert_category(&mut self, category: Category) -> LedgerResult<()> {
            self.pending.push(category.id);
            Ok(())
        }
        fn insert_sale(&mut self, _sale: &Sale) -> LedgerResult<()> {
            unsupported()
        }
        fn insert_sale_item(&mut self, _item: &SaleItem) -> LedgerResult<()> {
            unsupported()
        }
        fn append_audit_entry(
            &mut self,
            _entry: PendingAuditEntry,
        ) -> LedgerResult<AuditLogEntry> {
            unsupported()
        }
    }

    impl Transaction for RecordingTx<'_> {
        fn store_tx(&mut self) -> &mut dyn StoreTx {
            self
        }

        fn commit(self: Box<Self>) -> LedgerResult<()> {
            self.backend.events.lock().unwrap().push("commit");
            if self.backend.fail_commit {
                return Err(LedgerError::storage("disk full"));
            }
            self.backend.committed.lock().unwrap().extend(self.pending);
            Ok(())
        }

        fn rollback(self: Box<Self>) {
            self.backend.events.lock().unwrap().push("rollback");
        }
    }

    impl Backend for RecordingBackend {
        fn begin(&self) -> LedgerResult<Box<dyn Transaction + '_>> {
            self.events.lock().unwrap().push("begin");
            Ok(Box::new(RecordingTx {
                backend: self,
                pending: Vec::new(),
            }))
        }

        fn read(&self) -> LedgerResult<Box<dyn StoreRead + '_>> {
            Ok(Box::new(RecordingTx {
                backend: self,
                pending: Vec::new(),
            }))
        }
    }

    fn category(id: &str) -> Category {
        Category {
            id: id.to_string(),
            name: id.to_string(),
            attribute_definitions: vec![],
        }
    }

    // ── Tests ────────────────────────────────────────────────────────────────

    /// A successful closure commits and returns its value.
    #[test]
    fn test_ok_commits() {
        let backend = RecordingBackend::default();

        let value = AtomicScope::new(&backend)
            .run(|tx| {
                tx.insert_category(category("a"))?;
                tx.insert_category(category("b"))?;
                Ok(42)
            })
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(*backend.events.lock().unwrap(), vec!["begin", "commit"]);
        assert_eq!(*backend.committed.lock().unwrap(), vec!["a", "b"]);
    }

    /// An error return rolls back every write made in the scope.
    #[test]
    fn test_err_rolls_back() {
        let backend = RecordingBackend::default();

        let result: LedgerResult<()> = run_atomic(&backend, |tx| {
            tx.insert_category(category("a"))?;
            tx.get_category("missing")?;
            Ok(())
        });

        assert_eq!(result, Err(LedgerError::not_found("category", "missing")));
        assert_eq!(*backend.events.lock().unwrap(), vec!["begin", "rollback"]);
        assert!(
            backend.committed.lock().unwrap().is_empty(),
            "no write may survive a rolled-back scope"
        );
    }

    /// A panic rolls back and is re-raised rather than swallowed.
    #[test]
    fn test_panic_rolls_back_and_propagates() {
        let backend = RecordingBackend::default();

        let caught = panic::catch_unwind(AssertUnwindSafe(|| {
            let _: LedgerResult<()> = run_atomic(&backend, |tx| {
                tx.insert_category(category("a"))?;
                panic!("fault inside work");
            });
        }));

        assert!(caught.is_err(), "the panic must reach the caller");
        assert_eq!(*backend.events.lock().unwrap(), vec!["begin", "rollback"]);
        assert!(backend.committed.lock().unwrap().is_empty());
    }

    /// A failed commit surfaces as the scope's error.
    #[test]
    fn test_commit_failure_is_returned() {
        let backend = RecordingBackend {
            fail_commit: true,
            ..Default::default()
        };

        let result = run_atomic(&backend, |tx| tx.insert_category(category("a")));

        assert_eq!(result, Err(LedgerError::storage("disk full")));
        assert_eq!(*backend.events.lock().unwrap(), vec!["begin", "commit"]);
    }
}
