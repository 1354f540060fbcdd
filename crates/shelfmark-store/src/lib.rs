//! # shelfmark-store
//!
//! The reference storage backend for shelfmark.
//!
//! ## Overview
//!
//! [`MemoryStore`] implements the `Backend` trait from `shelfmark-core` with
//! snapshot transactions: a transaction works on a private copy of the
//! tables and publishes it atomically on commit. One writer at a time,
//! unlimited concurrent readers.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shelfmark_store::MemoryStore;
//!
//! let store = MemoryStore::open("shelfmark.json")?;
//! // Pass `Arc::new(store)` to the shelfmark services.
//! ```

pub mod memory;
pub mod tables;

pub use memory::MemoryStore;
pub use tables::{TableView, Tables};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use shelfmark_contracts::{
        audit::PendingAuditEntry,
        category::{AttributeDefinition, AttributeType, Category},
        error::LedgerError,
        product::{Product, ProductDraft, Properties, PropertyValue},
        sale::{Sale, SaleItem},
        search::{FilterOptions, Page},
    };
    use shelfmark_core::{
        run_atomic,
        traits::{Backend, StoreRead, StoreTx, Transaction},
    };

    use crate::MemoryStore;

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// Products created `age_secs` seconds ago so ordering is deterministic.
    fn product(id: &str, sku: &str, price: f64, age_secs: i64) -> Product {
        ProductDraft {
            name: format!("Product {id}"),
            sku: sku.to_string(),
            base_price: price,
            quantity: 1,
            ..Default::default()
        }
        .into_product(id, Utc::now() - Duration::seconds(age_secs))
    }

    fn pending(action: &str) -> PendingAuditEntry {
        PendingAuditEntry {
            action: action.to_string(),
            actor: "tester".to_string(),
            timestamp: Utc::now(),
            payload: serde_json::Map::new(),
            prev_hash: String::new(),
            current_hash: "00".repeat(32),
        }
    }

    fn seed(store: &MemoryStore, products: Vec<Product>) {
        run_atomic(store, |tx| {
            for p in products {
                tx.insert_product(p)?;
            }
            Ok(())
        })
        .unwrap();
    }

    // ── Transactions ──────────────────────────────────────────────────────────

    #[test]
    fn test_commit_publishes_writes() {
        let store = MemoryStore::new();
        seed(&store, vec![product("p1", "SKU-1", 5.0, 0)]);

        let found = store.read().unwrap().get_product("p1").unwrap();
        assert_eq!(found.sku, "SKU-1");
    }

    #[test]
    fn test_rollback_discards_writes() {
        let store = MemoryStore::new();
        let tx = {
            let mut tx = store.begin().unwrap();
            tx.insert_product(product("p1", "SKU-1", 5.0, 0)).unwrap();
            tx
        };
        tx.rollback();

        assert_eq!(
            store.read().unwrap().get_product("p1"),
            Err(LedgerError::not_found("product", "p1"))
        );
    }

    #[test]
    fn test_dropped_transaction_discards_writes() {
        let store = MemoryStore::new();
        {
            let mut tx = store.begin().unwrap();
            tx.insert_product(product("p1", "SKU-1", 5.0, 0)).unwrap();
        }
        assert!(store
            .read()
            .unwrap()
            .list_products(Page::default())
            .unwrap()
            .is_empty());
    }

    /// Readers see committed state while a transaction is still open, and
    /// the transaction sees its own writes.
    #[test]
    fn test_open_transaction_is_isolated() {
        let store = MemoryStore::new();
        let mut tx = store.begin().unwrap();
        tx.insert_product(product("p1", "SKU-1", 5.0, 0)).unwrap();

        assert!(tx.get_product("p1").is_ok(), "own writes are visible");
        assert!(
            store.read().unwrap().get_product("p1").is_err(),
            "uncommitted writes are invisible to readers"
        );

        tx.commit().unwrap();
        assert!(store.read().unwrap().get_product("p1").is_ok());
    }

    // ── Product constraints ───────────────────────────────────────────────────

    #[test]
    fn test_duplicate_sku_conflicts() {
        let store = MemoryStore::new();
        seed(&store, vec![product("p1", "SKU-1", 5.0, 0)]);

        let result = run_atomic(&store, |tx| tx.insert_product(product("p2", "SKU-1", 6.0, 0)));
        assert!(matches!(result, Err(LedgerError::Conflict { .. })));
    }

    #[test]
    fn test_update_to_foreign_sku_conflicts() {
        let store = MemoryStore::new();
        seed(
            &store,
            vec![product("p1", "SKU-1", 5.0, 0), product("p2", "SKU-2", 6.0, 0)],
        );

        let mut p2 = store.read().unwrap().get_product("p2").unwrap();
        p2.sku = "SKU-1".to_string();
        let result = run_atomic(&store, |tx| tx.update_product(&p2));
        assert!(matches!(result, Err(LedgerError::Conflict { .. })));

        p2.sku = "SKU-2".to_string();
        p2.quantity = 9;
        run_atomic(&store, |tx| tx.update_product(&p2)).unwrap();
        assert_eq!(store.read().unwrap().get_product("p2").unwrap().quantity, 9);
    }

    #[test]
    fn test_delete_missing_product_is_not_found() {
        let store = MemoryStore::new();
        let result = run_atomic(&store, |tx| tx.delete_product("ghost"));
        assert_eq!(result, Err(LedgerError::not_found("product", "ghost")));
    }

    #[test]
    fn test_list_products_newest_first() {
        let store = MemoryStore::new();
        seed(
            &store,
            vec![
                product("old", "A", 1.0, 30),
                product("new", "B", 1.0, 0),
                product("mid", "C", 1.0, 10),
            ],
        );

        let ids: Vec<String> = store
            .read()
            .unwrap()
            .list_products(Page::new(2, 0))
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["new", "mid"]);
    }

    // ── Search ────────────────────────────────────────────────────────────────

    #[test]
    fn test_search_filters() {
        let store = MemoryStore::new();
        let mut lamp = product("lamp", "LMP-1", 40.0, 2);
        lamp.name = "Desk Lamp".to_string();
        lamp.category_id = Some("elec".to_string());
        lamp.properties = Properties::from([("voltage".to_string(), PropertyValue::from("220"))]);
        let mut fan = product("fan", "FAN-1", 80.0, 1);
        fan.category_id = Some("elec".to_string());
        fan.properties = Properties::from([("voltage".to_string(), PropertyValue::from(110.0))]);
        let chair = product("chair", "CHR-1", 60.0, 0);
        seed(&store, vec![lamp, fan, chair]);

        let view = store.read().unwrap();
        let ids = |filter: FilterOptions| -> Vec<String> {
            view.search_products(&filter)
                .unwrap()
                .into_iter()
                .map(|p| p.id)
                .collect()
        };

        assert_eq!(ids(FilterOptions::default()), vec!["chair", "fan", "lamp"]);
        assert_eq!(
            ids(FilterOptions {
                query: Some("desk".to_string()),
                ..Default::default()
            }),
            vec!["lamp"]
        );
        assert_eq!(
            ids(FilterOptions {
                category_id: Some("elec".to_string()),
                ..Default::default()
            }),
            vec!["fan", "lamp"]
        );
        assert_eq!(
            ids(FilterOptions {
                min_price: Some(50.0),
                max_price: Some(80.0),
                ..Default::default()
            }),
            vec!["chair", "fan"]
        );
        assert_eq!(
            ids(FilterOptions {
                properties: Properties::from([(
                    "voltage".to_string(),
                    PropertyValue::from(220.0)
                )]),
                ..Default::default()
            }),
            vec!["lamp"],
            "numeric filters match numeric strings"
        );
        assert_eq!(
            ids(FilterOptions {
                limit: 1,
                offset: 1,
                ..Default::default()
            }),
            vec!["fan"]
        );
    }

    // ── Inventory ─────────────────────────────────────────────────────────────

    #[test]
    fn test_inventory_summary_groups_by_category() {
        let store = MemoryStore::new();
        run_atomic(&store, |tx| {
            tx.insert_category(Category {
                id: "elec".to_string(),
                name: "Electrical".to_string(),
                attribute_definitions: vec![AttributeDefinition::new(
                    "voltage",
                    AttributeType::Number,
                )],
            })?;
            let mut a = product("a", "A", 10.0, 0);
            a.category_id = Some("elec".to_string());
            a.quantity = 3;
            tx.insert_product(a)?;
            let mut b = product("b", "B", 2.5, 0);
            b.quantity = 4;
            tx.insert_product(b)
        })
        .unwrap();

        let summary = store.read().unwrap().inventory_summary().unwrap();
        assert_eq!(summary.total_items, 2);
        assert_eq!(summary.total_value, 40.0);

        let names: Vec<&str> = summary
            .category_breakdown
            .iter()
            .map(|b| b.category_name.as_str())
            .collect();
        assert_eq!(names, vec!["Uncategorized", "Electrical"]);
        assert_eq!(summary.category_breakdown[1].total_value, 30.0);
    }

    // ── Sales ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_sale_and_items_round_trip() {
        let store = MemoryStore::new();
        let sale = Sale {
            id: "s1".to_string(),
            total_amount: 12.0,
            created_at: Utc::now(),
        };
        let item = SaleItem {
            sale_id: "s1".to_string(),
            product_id: "p1".to_string(),
            quantity: 2,
            unit_price: 6.0,
            cost_price: 4.0,
        };
        run_atomic(&store, |tx| {
            tx.insert_sale_item(&item)?;
            tx.insert_sale(&sale)
        })
        .unwrap();

        let view = store.read().unwrap();
        assert_eq!(view.get_sale("s1").unwrap(), sale);
        assert_eq!(view.list_sale_items("s1").unwrap(), vec![item]);
        assert!(view.list_sale_items("other").unwrap().is_empty());
    }

    // ── Audit log ─────────────────────────────────────────────────────────────

    #[test]
    fn test_audit_ids_increase_and_list_newest_first() {
        let store = MemoryStore::new();
        run_atomic(&store, |tx| {
            tx.append_audit_entry(pending("A"))?;
            tx.append_audit_entry(pending("B"))?;
            tx.append_audit_entry(pending("C"))
        })
        .unwrap();

        let view = store.read().unwrap();
        let all: Vec<u64> = view.all_audit_entries().unwrap().iter().map(|e| e.id).collect();
        assert_eq!(all, vec![1, 2, 3]);

        let newest: Vec<String> = view
            .list_audit_entries(Page::new(2, 0))
            .unwrap()
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(newest, vec!["C", "B"]);
        assert_eq!(view.last_audit_entry().unwrap().unwrap().action, "C");
    }

    // ── File durability ───────────────────────────────────────────────────────

    #[test]
    fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelfmark.json");

        {
            let store = MemoryStore::open(&path).unwrap();
            seed(&store, vec![product("p1", "SKU-1", 5.0, 0)]);
            run_atomic(&store, |tx| tx.append_audit_entry(pending("CREATE_PRODUCT"))).unwrap();
        }
        assert!(path.exists(), "commit must write the snapshot");

        let reopened = MemoryStore::open(&path).unwrap();
        assert_eq!(reopened.path(), Some(path.as_path()));
        let view = reopened.read().unwrap();
        let original = view.get_product("p1").unwrap();
        assert_eq!(original.sku, "SKU-1");
        assert_eq!(view.last_audit_entry().unwrap().unwrap().id, 1);
    }

    #[test]
    fn test_rolled_back_work_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelfmark.json");
        let store = MemoryStore::open(&path).unwrap();

        let result: Result<(), LedgerError> = run_atomic(&store, |tx| {
            tx.insert_product(product("p1", "SKU-1", 5.0, 0))?;
            Err(LedgerError::validation("abort"))
        });
        assert!(result.is_err());
        assert!(!path.exists(), "nothing committed, nothing written");
    }

    #[test]
    fn test_corrupt_snapshot_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelfmark.json");
        std::fs::write(&path, b"{ not json").unwrap();

        assert!(matches!(
            MemoryStore::open(&path),
            Err(LedgerError::Storage { .. })
        ));
    }
}
