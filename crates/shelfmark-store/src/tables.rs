//! The store's tables and the query logic over them.
//!
//! `Tables` is plain data: it is cloned into a transaction's working set,
//! serialized to the snapshot file and swapped back in on commit. All read and
//! write rules live here, behind `TableView`, so the committed view and the
//! transactional view share one implementation.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use shelfmark_contracts::{
    audit::{AuditLogEntry, PendingAuditEntry},
    category::Category,
    error::{LedgerError, LedgerResult},
    product::Product,
    sale::{Sale, SaleItem},
    search::{CategoryBreakdown, FilterOptions, InventorySummary, Page},
};
use shelfmark_core::traits::{StoreRead, StoreTx};

/// Every persisted record, keyed for lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tables {
    #[serde(default)]
    pub(crate) products: BTreeMap<String, Product>,
    #[serde(default)]
    pub(crate) categories: BTreeMap<String, Category>,
    #[serde(default)]
    pub(crate) sales: BTreeMap<String, Sale>,
    #[serde(default)]
    pub(crate) sale_items: Vec<SaleItem>,
    /// Append order is id order.
    #[serde(default)]
    pub(crate) audit_log: Vec<AuditLogEntry>,
    /// The last audit id handed out. Only ever increases.
    #[serde(default)]
    pub(crate) audit_sequence: u64,
}

impl Tables {
    fn products_newest_first(&self) -> Vec<&Product> {
        let mut products: Vec<&Product> = self.products.values().collect();
        products.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        products
    }

    fn sku_owner(&self, sku: &str) -> Option<&Product> {
        self.products.values().find(|p| p.sku == sku)
    }
}

fn matches_filter(product: &Product, filter: &FilterOptions, query: Option<&str>) -> bool {
    if let Some(q) = query {
        let hit = product.name.to_lowercase().contains(q) || product.sku.to_lowercase().contains(q);
        if !hit {
            return false;
        }
    }

    if let Some(category_id) = &filter.category_id {
        if product.category_id.as_deref() != Some(category_id.as_str()) {
            return false;
        }
    }

    if filter.min_price.is_some_and(|min| product.base_price < min) {
        return false;
    }
    if filter.max_price.is_some_and(|max| product.base_price > max) {
        return false;
    }

    filter.properties.iter().all(|(key, wanted)| {
        product
            .properties
            .get(key)
            .is_some_and(|actual| actual.matches(wanted))
    })
}

/// Read/write access to a `Tables` behind any pointer: a lock guard for the
/// committed view, a transaction's working set for writes.
pub struct TableView<D>(pub(crate) D);

impl<D: Deref<Target = Tables>> StoreRead for TableView<D> {
    fn get_product(&self, id: &str) -> LedgerResult<Product> {
        self.0
            .products
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("product", id))
    }

    fn get_product_by_sku(&self, sku: &str) -> LedgerResult<Product> {
        self.0
            .sku_owner(sku)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("product with sku", sku))
    }

    fn list_products(&self, page: Page) -> LedgerResult<Vec<Product>> {
        Ok(page.apply(self.0.products_newest_first().into_iter().cloned()))
    }

    fn search_products(&self, filter: &FilterOptions) -> LedgerResult<Vec<Product>> {
        let query = filter
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        let hits = self
            .0
            .products_newest_first()
            .into_iter()
            .filter(|p| matches_filter(p, filter, query.as_deref()))
            .cloned();

        Ok(filter.page().apply(hits))
    }

    fn inventory_summary(&self) -> LedgerResult<InventorySummary> {
        let mut groups: BTreeMap<Option<String>, (usize, f64)> = BTreeMap::new();
        for product in self.0.products.values() {
            let slot = groups.entry(product.category_id.clone()).or_default();
            slot.0 += 1;
            slot.1 += product.base_price * f64::from(product.quantity);
        }

        let mut summary = InventorySummary::default();
        for (category_id, (count, total_value)) in groups {
            let category_name = match &category_id {
                None => "Uncategorized".to_string(),
                Some(id) => self
                    .0
                    .categories
                    .get(id)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| format!("unknown category {id}")),
            };
            summary.total_items += count;
            summary.total_value += total_value;
            summary.category_breakdown.push(CategoryBreakdown {
                category_id,
                category_name,
                count,
                total_value,
            });
        }

        Ok(summary)
    }

    fn get_category(&self, id: &str) -> LedgerResult<Category> {
        self.0
            .categories
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("category", id))
    }

    fn list_categories(&self, page: Page) -> LedgerResult<Vec<Category>> {
        Ok(page.apply(self.0.categories.values().cloned()))
    }

    fn get_sale(&self, id: &str) -> LedgerResult<Sale> {
        self.0
            .sales
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("sale", id))
    }

    fn list_sale_items(&self, sale_id: &str) -> LedgerResult<Vec<SaleItem>> {
        Ok(self
            .0
            .sale_items
            .iter()
            .filter(|item| item.sale_id == sale_id)
            .cloned()
            .collect())
    }

    fn last_audit_entry(&self) -> LedgerResult<Option<AuditLogEntry>> {
        Ok(self.0.audit_log.last().cloned())
    }

    fn list_audit_entries(&self, page: Page) -> LedgerResult<Vec<AuditLogEntry>> {
        Ok(page.apply(self.0.audit_log.iter().rev().cloned()))
    }

    fn all_audit_entries(&self) -> LedgerResult<Vec<AuditLogEntry>> {
        Ok(self.0.audit_log.clone())
    }
}

impl<D: DerefMut<Target = Tables>> StoreTx for TableView<D> {
    fn insert_product(&mut self, product: Product) -> LedgerResult<()> {
        if product.name.trim().is_empty() || product.sku.trim().is_empty() {
            return Err(LedgerError::validation("product name and sku are required"));
        }
        if self.0.products.contains_key(&product.id) {
            return Err(LedgerError::conflict(format!(
                "product id '{}' already exists",
                product.id
            )));
        }
        if self.0.sku_owner(&product.sku).is_some() {
            return Err(LedgerError::conflict(format!(
                "duplicate sku '{}'",
                product.sku
            )));
        }
        self.0.products.insert(product.id.clone(), product);
        Ok(())
    }

    fn update_product(&mut self, product: &Product) -> LedgerResult<()> {
        if !self.0.products.contains_key(&product.id) {
            return Err(LedgerError::not_found("product", product.id.clone()));
        }
        if product.name.trim().is_empty() || product.sku.trim().is_empty() {
            return Err(LedgerError::validation("product name and sku are required"));
        }
        if let Some(owner) = self.0.sku_owner(&product.sku) {
            if owner.id != product.id {
                return Err(LedgerError::conflict(format!(
                    "duplicate sku '{}'",
                    product.sku
                )));
            }
        }
        self.0.products.insert(product.id.clone(), product.clone());
        Ok(())
    }

    fn delete_product(&mut self, id: &str) -> LedgerResult<()> {
        self.0
            .products
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| LedgerError::not_found("product", id))
    }

    fn insert_category(&mut self, category: Category) -> LedgerResult<()> {
        if category.id.trim().is_empty() {
            return Err(LedgerError::validation("category id is required"));
        }
        if self.0.categories.contains_key(&category.id) {
            return Err(LedgerError::conflict(format!(
                "category id '{}' already exists",
                category.id
            )));
        }
        self.0.categories.insert(category.id.clone(), category);
        Ok(())
    }

    fn insert_sale(&mut self, sale: &Sale) -> LedgerResult<()> {
        if self.0.sales.contains_key(&sale.id) {
            return Err(LedgerError::conflict(format!(
                "sale id '{}' already exists",
                sale.id
            )));
        }
        self.0.sales.insert(sale.id.clone(), sale.clone());
        Ok(())
    }

    fn insert_sale_item(&mut self, item: &SaleItem) -> LedgerResult<()> {
        self.0.sale_items.push(item.clone());
        Ok(())
    }

    fn append_audit_entry(&mut self, entry: PendingAuditEntry) -> LedgerResult<AuditLogEntry> {
        let id = self.0.audit_sequence + 1;
        let entry = entry.into_entry(id);
        self.0.audit_sequence = id;
        self.0.audit_log.push(entry.clone());
        Ok(entry)
    }
}
