//! Bulk product import from comma-separated input.
//!
//! The header is checked first, then the rest of the input is parsed before
//! a transaction is opened. All rows then
//! commit together or not at all, each with its own `CREATE_PRODUCT` audit
//! entry threaded through a `ChainCursor`.
//!
//! Columns:
//!
//! | column                 | required | meaning                        |
//! |------------------------|----------|--------------------------------|
//! | `name`                 | yes      | product name                   |
//! | `sku`                  | yes      | unique stock-keeping unit      |
//! | `base_price` / `price` | yes      | selling price                  |
//! | `quantity`             | no       | initial stock, default 0       |
//! | `cost_price`           | no       | unit cost, default 0           |
//!
//! Any other column becomes a product property named after its header, holding
//! the cell's raw text (empty cells included). The category's attribute types
//! are checked against those strings.

use std::io::BufRead;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info};

use shelfmark_audit::ChainCursor;
use shelfmark_contracts::{
    audit::{actions, AuditPayload},
    category::Category,
    error::{LedgerError, LedgerResult},
    generate_id,
    product::{Product, Properties, PropertyValue},
};
use shelfmark_core::{
    run_atomic,
    traits::{Backend, StoreTx},
};
use shelfmark_schema::validate_properties;

use crate::csv::{Reader, Record};
use crate::product::{check_prices, resolve_category};

/// Where each known column sits in the header.
#[derive(Debug, Clone, PartialEq)]
struct Columns {
    width: usize,
    name: usize,
    sku: usize,
    price: usize,
    quantity: Option<usize>,
    cost_price: Option<usize>,
    /// `(index, property key)` for every other column.
    properties: Vec<(usize, String)>,
}

impl Columns {
    fn from_header(header: &[String]) -> LedgerResult<Self> {
        let keys: Vec<String> = header.iter().map(|h| h.trim().to_string()).collect();
        let find = |names: &[&str]| {
            keys.iter()
                .position(|k| names.iter().any(|n| k.eq_ignore_ascii_case(n)))
        };
        let require = |names: &[&str]| {
            find(names).ok_or_else(|| {
                LedgerError::validation(format!(
                    "CSV header is missing required column \"{}\"",
                    names[0]
                ))
            })
        };

        let name = require(&["name"])?;
        let sku = require(&["sku"])?;
        let price = require(&["base_price", "price"])?;
        let quantity = find(&["quantity"]);
        let cost_price = find(&["cost_price"]);

        let reserved = [Some(name), Some(sku), Some(price), quantity, cost_price];
        let properties = keys
            .iter()
            .enumerate()
            .filter(|(idx, key)| !reserved.contains(&Some(*idx)) && !key.is_empty())
            .map(|(idx, key)| (idx, key.clone()))
            .collect();

        Ok(Self {
            width: keys.len(),
            name,
            sku,
            price,
            quantity,
            cost_price,
            properties,
        })
    }

    /// Turn one row into a validated product.
    fn build_product(
        &self,
        record: &Record,
        category: Option<&Category>,
        now: DateTime<Utc>,
    ) -> LedgerResult<Product> {
        let fields = &record.fields;
        if fields.len() != self.width {
            return Err(LedgerError::validation(format!(
                "expected {} columns, found {}",
                self.width,
                fields.len()
            )));
        }

        let name = fields[self.name].trim();
        let sku = fields[self.sku].trim();
        if name.is_empty() || sku.is_empty() {
            return Err(LedgerError::validation("name and sku must not be empty"));
        }

        let base_price = parse_price("price", &fields[self.price])?;
        let cost_price = match self.cost_price {
            Some(idx) if !fields[idx].trim().is_empty() => parse_price("cost_price", &fields[idx])?,
            _ => 0.0,
        };
        check_prices(base_price, cost_price)?;

        let quantity = match self.quantity {
            Some(idx) if !fields[idx].trim().is_empty() => {
                let raw = fields[idx].trim();
                raw.parse::<u32>().map_err(|_| {
                    LedgerError::validation(format!("invalid quantity \"{raw}\""))
                })?
            }
            _ => 0,
        };

        let properties = self.property_bag(fields);
        validate_properties(category, &properties)?;

        Ok(Product {
            id: generate_id(),
            name: name.to_string(),
            sku: sku.to_string(),
            category_id: category.map(|c| c.id.clone()),
            base_price,
            cost_price,
            quantity,
            properties,
            created_at: now,
            updated_at: now,
        })
    }

    /// Raw cell strings keyed by header.
    fn property_bag(&self, fields: &[String]) -> Properties {
        self.properties
            .iter()
            .map(|(idx, key)| (key.clone(), PropertyValue::String(fields[*idx].clone())))
            .collect()
    }
}

fn parse_price(column: &str, raw: &str) -> LedgerResult<f64> {
    let raw = raw.trim();
    raw.parse::<f64>()
        .map_err(|_| LedgerError::validation(format!("invalid {column} \"{raw}\"")))
}

fn import_payload(product: &Product) -> AuditPayload {
    let mut payload = AuditPayload::new();
    payload.insert("action".to_string(), json!("import_product"));
    payload.insert("product_id".to_string(), json!(product.id));
    payload.insert("sku".to_string(), json!(product.sku));
    payload.insert("name".to_string(), json!(product.name));
    payload
}

pub struct ImportPipeline {
    backend: Arc<dyn Backend>,
    actor: String,
}

impl ImportPipeline {
    pub fn new(backend: Arc<dyn Backend>, actor: impl Into<String>) -> Self {
        Self {
            backend,
            actor: actor.into(),
        }
    }

    /// Import every row of `input`, returning the number of products created.
    ///
    /// # Errors
    ///
    /// - `NotFound` when `category_id` names an unknown category (nothing read)
    /// - `Input` for an empty or unreadable stream
    /// - `Validation` for a missing required column (no transaction opened),
    ///   or for a bad row, with its line number
    /// - `Conflict` for a duplicate sku, with its line number
    ///
    /// Any row failure or audit failure rolls back the whole import.
    pub fn import_products<R: BufRead>(
        &self,
        category_id: Option<&str>,
        input: R,
    ) -> LedgerResult<usize> {
        let category = resolve_category(self.backend.read()?.as_ref(), category_id)?;

        let mut reader = Reader::new(input);
        let columns = Columns::from_header(&reader.header()?)?;
        let rows = reader.rest()?;

        if rows.is_empty() {
            debug!("import input has no data rows");
            return Ok(0);
        }

        let imported = run_atomic(self.backend.as_ref(), |tx| {
            let mut cursor = ChainCursor::seed(&*tx)?;
            let now = Utc::now();

            for record in &rows {
                let product = columns
                    .build_product(record, category.as_ref(), now)
                    .map_err(|e| e.at_line(record.line))?;
                let payload = import_payload(&product);

                tx.insert_product(product)
                    .map_err(|e| e.at_line(record.line))?;
                cursor
                    .append(tx, actions::CREATE_PRODUCT, &self.actor, payload)
                    .map_err(|e| e.at_line(record.line))?;
            }

            Ok(rows.len())
        })?;

        info!(
            count = imported,
            category_id = category_id.unwrap_or("-"),
            "products imported"
        );
        Ok(imported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_columns_accept_price_alias_and_reserved() {
        let cols = Columns::from_header(&header(&[
            "SKU", "name", "price", "quantity", "voltage", "cost_price",
        ]))
        .unwrap();

        assert_eq!(cols.sku, 0);
        assert_eq!(cols.price, 2);
        assert_eq!(cols.quantity, Some(3));
        assert_eq!(cols.cost_price, Some(5));
        assert_eq!(cols.properties, vec![(4, "voltage".to_string())]);
    }

    #[test]
    fn test_missing_column_named() {
        let err = Columns::from_header(&header(&["name", "base_price"])).unwrap_err();
        assert_eq!(
            err,
            LedgerError::validation("CSV header is missing required column \"sku\"")
        );
    }

    #[test]
    fn test_build_product_reads_reserved_columns() {
        let cols =
            Columns::from_header(&header(&["name", "sku", "base_price", "quantity", "cost_price", "color"]))
                .unwrap();
        let record = Record {
            line: 2,
            fields: header(&["Lamp", "L-1", "19.5", "4", "7.25", ""]),
        };

        let product = cols.build_product(&record, None, Utc::now()).unwrap();
        assert_eq!(product.base_price, 19.5);
        assert_eq!(product.cost_price, 7.25);
        assert_eq!(product.quantity, 4);
        assert_eq!(product.properties.get("color"), Some(&PropertyValue::from("")));
    }

    #[test]
    fn test_build_product_rejects_bad_rows() {
        let cols = Columns::from_header(&header(&["name", "sku", "base_price", "quantity"])).unwrap();
        let row = |fields: &[&str]| Record {
            line: 7,
            fields: header(fields),
        };

        let cases = [
            (row(&["Lamp", "L-1", "cheap", "1"]), "invalid price \"cheap\""),
            (row(&["Lamp", "L-1", "2"]), "expected 4 columns, found 3"),
            (row(&["", "L-1", "2", "1"]), "name and sku must not be empty"),
            (row(&["Lamp", "L-1", "2", "-1"]), "invalid quantity \"-1\""),
            (row(&["Lamp", "L-1", "-2", "1"]), "base_price must be a non-negative number"),
        ];
        for (record, expected) in cases {
            let err = cols.build_product(&record, None, Utc::now()).unwrap_err();
            assert!(
                err.to_string().contains(expected),
                "expected {expected:?} in {err}"
            );
        }
    }

    #[test]
    fn test_cells_stay_raw_strings() {
        use shelfmark_contracts::category::{AttributeDefinition, AttributeType};

        let category = Category {
            id: "c".to_string(),
            name: "Lights".to_string(),
            attribute_definitions: vec![
                AttributeDefinition::new("dimmable", AttributeType::Boolean),
                AttributeDefinition::new("finish", AttributeType::String).required(),
            ],
        };
        let cols = Columns::from_header(&header(&["name", "sku", "price", "dimmable", "finish"]))
            .unwrap();
        let row = |fields: &[&str]| Record {
            line: 3,
            fields: header(fields),
        };

        let bag = cols.property_bag(&header(&["Lamp", "L-1", "3", " 220 ", ""]));
        assert_eq!(bag.get("dimmable"), Some(&PropertyValue::from(" 220 ")));
        assert_eq!(bag.get("finish"), Some(&PropertyValue::from("")));

        let err = cols
            .build_product(&row(&["Lamp", "L-1", "3", "true", "matte"]), Some(&category), Utc::now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation { .. }), "got {err:?}");
        assert!(err.to_string().contains("dimmable"), "got {err}");

        let product = cols
            .build_product(&row(&["Lamp", "L-1", "3", "", ""]), None, Utc::now())
            .unwrap();
        assert_eq!(product.properties.len(), 2);

        let plain = Category {
            attribute_definitions: vec![category.attribute_definitions[1].clone()],
            ..category
        };
        cols.build_product(&row(&["Lamp", "L-1", "3", "yes", ""]), Some(&plain), Utc::now())
            .unwrap();
    }
}
