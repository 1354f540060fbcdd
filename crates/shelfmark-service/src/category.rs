//! Category blueprints: creation and lookup.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use shelfmark_contracts::{
    category::{AttributeType, Category},
    error::{LedgerError, LedgerResult},
    generate_id,
    search::Page,
};
use shelfmark_core::{
    run_atomic,
    traits::{Backend, StoreRead, StoreTx},
};

pub struct CategoryService {
    backend: Arc<dyn Backend>,
}

impl CategoryService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Store a new category, generating its id when none is given.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty name, an empty or repeated attribute key,
    ///   or `options` on an attribute that is not `select`
    /// - `Conflict` when the id is already taken
    pub fn create_category(&self, mut category: Category) -> LedgerResult<Category> {
        if category.id.trim().is_empty() {
            category.id = generate_id();
        }
        check_blueprint(&category)?;

        run_atomic(self.backend.as_ref(), |tx| tx.insert_category(category.clone()))?;

        info!(
            category_id = %category.id,
            attributes = category.attribute_definitions.len(),
            "category created"
        );
        Ok(category)
    }

    pub fn get_category(&self, id: &str) -> LedgerResult<Category> {
        self.backend.read()?.get_category(id)
    }

    pub fn list_categories(&self, page: Page) -> LedgerResult<Vec<Category>> {
        self.backend.read()?.list_categories(page)
    }
}

fn check_blueprint(category: &Category) -> LedgerResult<()> {
    if category.name.trim().is_empty() {
        return Err(LedgerError::validation("category name is required"));
    }

    let mut seen = BTreeSet::new();
    for attr in &category.attribute_definitions {
        if attr.key.trim().is_empty() {
            return Err(LedgerError::validation("attribute key must not be empty"));
        }
        if !seen.insert(attr.key.as_str()) {
            return Err(LedgerError::validation(format!(
                "attribute \"{}\" is declared twice",
                attr.key
            )));
        }
        if attr.kind != AttributeType::Select && !attr.options.is_empty() {
            return Err(LedgerError::validation(format!(
                "attribute \"{}\" of type {} cannot declare options",
                attr.key, attr.kind
            )));
        }
    }

    Ok(())
}
