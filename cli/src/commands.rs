//! Subcommand definitions and their dispatch onto the `Ledger`.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use shelfmark_contracts::{
    category::{AttributeDefinition, AttributeType, Category},
    error::{LedgerError, LedgerResult},
    product::{ProductDraft, PropertyValue},
    sale::SaleItemRequest,
    search::{FilterOptions, Page},
};
use shelfmark_service::Ledger;

#[derive(Subcommand)]
pub enum Command {
    /// Manage category blueprints.
    #[command(subcommand)]
    Category(CategoryCommand),
    /// Manage products.
    #[command(subcommand)]
    Product(ProductCommand),
    /// Import products from a CSV file (header: name,sku,base_price,...).
    Import {
        /// Path to the CSV file.
        file: PathBuf,
        /// Validate every row against this category.
        #[arg(long)]
        category: Option<String>,
    },
    /// Sell one or more products: `shelfmark sale <product_id:qty>...`
    Sale {
        #[arg(required = true, value_parser = parse_sale_item)]
        items: Vec<SaleItemRequest>,
    },
    /// Show a recorded sale and its items.
    Receipt { sale_id: String },
    /// Search products.
    Search(SearchArgs),
    /// Inspect and verify the audit chain.
    #[command(subcommand)]
    Audit(AuditCommand),
    /// Stock value per category.
    Inventory,
}

#[derive(Subcommand)]
pub enum CategoryCommand {
    /// Create a category.
    Add {
        name: String,
        /// Explicit id; generated when omitted.
        #[arg(long)]
        id: Option<String>,
        /// `key:type[:required][:options=A|B][:unit=U]`, repeatable.
        #[arg(long = "attr", value_parser = parse_attribute)]
        attributes: Vec<AttributeDefinition>,
    },
    List(PageArgs),
    Show { id: String },
}

#[derive(Subcommand)]
pub enum ProductCommand {
    /// Create a product.
    Add(ProductFields),
    /// Change fields of an existing product. Omitted fields keep their value.
    Update {
        id: String,
        #[command(flatten)]
        fields: ProductFields,
        /// Detach the product from its category.
        #[arg(long, conflicts_with = "category")]
        clear_category: bool,
    },
    Delete { id: String },
    Show {
        id: String,
        /// Treat the argument as a sku.
        #[arg(long)]
        sku: bool,
    },
    List(PageArgs),
}

#[derive(Args)]
pub struct ProductFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    sku: Option<String>,
    #[arg(long)]
    price: Option<f64>,
    #[arg(long)]
    cost: Option<f64>,
    #[arg(long)]
    quantity: Option<u32>,
    #[arg(long)]
    category: Option<String>,
    /// `key=value`, repeatable. Numbers and true/false are typed.
    #[arg(long = "prop", value_parser = parse_property)]
    properties: Vec<(String, PropertyValue)>,
}

#[derive(Subcommand)]
pub enum AuditCommand {
    /// Entries, newest first.
    List(PageArgs),
    /// Recompute every hash in the chain.
    Verify {
        /// Fail with a non-zero exit status when the chain is broken.
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Args)]
pub struct PageArgs {
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long, default_value_t = 0)]
    offset: usize,
}

impl PageArgs {
    fn page(&self, page_size: usize) -> Page {
        Page::new(self.limit.unwrap_or(page_size), self.offset)
    }
}

#[derive(Args)]
pub struct SearchArgs {
    /// Matched against name and sku.
    #[arg(long)]
    query: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    min_price: Option<f64>,
    #[arg(long)]
    max_price: Option<f64>,
    /// `key=value`; only keys the category declares are applied.
    #[arg(long = "prop", value_parser = parse_property)]
    properties: Vec<(String, PropertyValue)>,
    #[command(flatten)]
    page: PageArgs,
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

/// Run `command` and print its result as pretty JSON.
pub fn run(ledger: &Ledger, command: Command, page_size: usize) -> LedgerResult<()> {
    match command {
        Command::Category(cmd) => run_category(ledger, cmd, page_size),
        Command::Product(cmd) => run_product(ledger, cmd, page_size),
        Command::Import { file, category } => {
            let handle = File::open(&file).map_err(|e| LedgerError::Input {
                reason: format!("failed to open '{}': {}", file.display(), e),
            })?;
            let count = ledger.import_products(category.as_deref(), BufReader::new(handle))?;
            info!(file = %file.display(), count, "import finished");
            print_json(&json!({ "imported": count }))
        }
        Command::Sale { items } => print_json(&ledger.process_sale(&items)?),
        Command::Receipt { sale_id } => print_json(&ledger.get_sale(&sale_id)?),
        Command::Search(args) => {
            let filter = FilterOptions {
                query: args.query,
                category_id: args.category,
                min_price: args.min_price,
                max_price: args.max_price,
                properties: args.properties.into_iter().collect(),
                limit: args.page.limit.unwrap_or(page_size),
                offset: args.page.offset,
            };
            print_json(&ledger.search_products(filter)?)
        }
        Command::Audit(AuditCommand::List(page)) => {
            print_json(&ledger.list_audit_logs(page.page(page_size))?)
        }
        Command::Audit(AuditCommand::Verify { strict: true }) => {
            ledger.ensure_audit_chain_intact()?;
            print_json(&json!({ "valid": true }))
        }
        Command::Audit(AuditCommand::Verify { strict: false }) => {
            let report = match ledger.audit_chain_break()? {
                None => json!({ "valid": true }),
                Some(broken) => json!({
                    "valid": false,
                    "entry_id": broken.entry_id,
                    "reason": broken.to_string(),
                }),
            };
            print_json(&report)
        }
        Command::Inventory => print_json(&ledger.inventory_summary()?),
    }
}

fn run_category(ledger: &Ledger, cmd: CategoryCommand, page_size: usize) -> LedgerResult<()> {
    match cmd {
        CategoryCommand::Add {
            name,
            id,
            attributes,
        } => print_json(&ledger.create_category(Category {
            id: id.unwrap_or_default(),
            name,
            attribute_definitions: attributes,
        })?),
        CategoryCommand::List(page) => print_json(&ledger.list_categories(page.page(page_size))?),
        CategoryCommand::Show { id } => print_json(&ledger.get_category(&id)?),
    }
}

fn run_product(ledger: &Ledger, cmd: ProductCommand, page_size: usize) -> LedgerResult<()> {
    match cmd {
        ProductCommand::Add(fields) => {
            let draft = fields.into_draft(ProductDraft::default(), false)?;
            print_json(&ledger.create_product(draft)?)
        }
        ProductCommand::Update {
            id,
            fields,
            clear_category,
        } => {
            let current = ledger.get_product(&id)?;
            let base = ProductDraft {
                name: current.name,
                sku: current.sku,
                category_id: current.category_id,
                base_price: current.base_price,
                cost_price: current.cost_price,
                quantity: current.quantity,
                properties: current.properties,
            };
            let draft = fields.into_draft(base, clear_category)?;
            print_json(&ledger.update_product(&id, draft)?)
        }
        ProductCommand::Delete { id } => print_json(&ledger.delete_product(&id)?),
        ProductCommand::Show { id, sku: true } => print_json(&ledger.get_product_by_sku(&id)?),
        ProductCommand::Show { id, sku: false } => print_json(&ledger.get_product(&id)?),
        ProductCommand::List(page) => print_json(&ledger.list_products(page.page(page_size))?),
    }
}

impl ProductFields {
    /// Overlay the given flags on `base`.
    fn into_draft(self, mut base: ProductDraft, clear_category: bool) -> LedgerResult<ProductDraft> {
        if let Some(name) = self.name {
            base.name = name;
        }
        if let Some(sku) = self.sku {
            base.sku = sku;
        }
        if let Some(price) = self.price {
            base.base_price = price;
        }
        if let Some(cost) = self.cost {
            base.cost_price = cost;
        }
        if let Some(quantity) = self.quantity {
            base.quantity = quantity;
        }
        if clear_category {
            base.category_id = None;
        } else if let Some(category) = self.category {
            base.category_id = Some(category);
        }
        base.properties.extend(self.properties);

        if base.name.trim().is_empty() || base.sku.trim().is_empty() {
            return Err(LedgerError::validation("--name and --sku are required"));
        }
        Ok(base)
    }
}

fn print_json<T: Serialize>(value: &T) -> LedgerResult<()> {
    println!("{}", render_json(value)?);
    Ok(())
}

fn render_json<T: Serialize>(value: &T) -> LedgerResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| LedgerError::Storage {
        reason: format!("failed to render output: {e}"),
    })
}

// ── Argument parsers ─────────────────────────────────────────────────────────

fn parse_sale_item(s: &str) -> Result<SaleItemRequest, String> {
    let (product_id, quantity) = s
        .rsplit_once(':')
        .ok_or_else(|| format!("expected <product_id:qty>, got '{s}'"))?;
    let quantity = quantity
        .parse::<i64>()
        .map_err(|_| format!("quantity '{quantity}' is not an integer"))?;
    if product_id.is_empty() {
        return Err(format!("missing product id in '{s}'"));
    }
    Ok(SaleItemRequest::new(product_id, quantity))
}

fn parse_property(s: &str) -> Result<(String, PropertyValue), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing property key in '{s}'"));
    }
    Ok((key.to_string(), PropertyValue::infer(value.trim())))
}

fn parse_attribute(s: &str) -> Result<AttributeDefinition, String> {
    let mut parts = s.split(':');
    let key = parts.next().unwrap_or_default().trim();
    let kind = match parts.next().map(str::trim) {
        Some("string") => AttributeType::String,
        Some("number") => AttributeType::Number,
        Some("boolean") => AttributeType::Boolean,
        Some("select") => AttributeType::Select,
        Some(other) => return Err(format!("unknown attribute type '{other}'")),
        None => return Err(format!("expected key:type, got '{s}'")),
    };

    let mut attr = AttributeDefinition::new(key, kind);
    for modifier in parts {
        match modifier.split_once('=') {
            None if modifier == "required" => attr = attr.required(),
            Some(("options", list)) => attr = attr.with_options(list.split('|').map(str::trim)),
            Some(("unit", unit)) => attr = attr.with_unit(unit),
            _ => return Err(format!("unknown attribute modifier '{modifier}'")),
        }
    }
    Ok(attr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sale_item() {
        assert_eq!(
            parse_sale_item("p-1:3").unwrap(),
            SaleItemRequest::new("p-1", 3)
        );
        assert_eq!(
            parse_sale_item("a:b:-2").unwrap(),
            SaleItemRequest::new("a:b", -2),
            "only the last colon splits; the service rejects the quantity"
        );
        assert!(parse_sale_item("p-1").is_err());
        assert!(parse_sale_item("p-1:x").is_err());
        assert!(parse_sale_item(":4").is_err());
    }

    #[test]
    fn test_parse_property_types_values() {
        assert_eq!(
            parse_property("voltage=220").unwrap(),
            ("voltage".to_string(), PropertyValue::Number(220.0))
        );
        assert_eq!(
            parse_property("dimmable=true").unwrap().1,
            PropertyValue::Boolean(true)
        );
        assert_eq!(
            parse_property("plug = EU").unwrap(),
            ("plug".to_string(), PropertyValue::from("EU"))
        );
        assert!(parse_property("novalue").is_err());
        assert!(parse_property("=x").is_err());
    }

    #[test]
    fn test_parse_attribute() {
        let attr = parse_attribute("plug:select:required:options=EU|US").unwrap();
        assert_eq!(
            attr,
            AttributeDefinition::new("plug", AttributeType::Select)
                .required()
                .with_options(["EU", "US"])
        );

        let attr = parse_attribute("voltage:number:unit=V").unwrap();
        assert_eq!(attr.unit, "V");
        assert!(!attr.required);

        assert!(parse_attribute("voltage").is_err());
        assert!(parse_attribute("voltage:float").is_err());
        assert!(parse_attribute("voltage:number:mandatory").is_err());
    }

    #[test]
    fn test_fields_overlay_base() {
        let fields = ProductFields {
            name: None,
            sku: None,
            price: Some(12.0),
            cost: None,
            quantity: None,
            category: Some("tools".to_string()),
            properties: vec![("size".to_string(), PropertyValue::from("L"))],
        };
        let base = ProductDraft {
            name: "Hammer".to_string(),
            sku: "HM-1".to_string(),
            base_price: 10.0,
            ..Default::default()
        };

        let draft = fields.into_draft(base, false).unwrap();
        assert_eq!(draft.name, "Hammer");
        assert_eq!(draft.base_price, 12.0);
        assert_eq!(draft.category_id.as_deref(), Some("tools"));
        assert_eq!(draft.properties.get("size"), Some(&PropertyValue::from("L")));
    }

    #[test]
    fn test_add_requires_name_and_sku() {
        let fields = ProductFields {
            name: Some("Saw".to_string()),
            sku: None,
            price: Some(1.0),
            cost: None,
            quantity: None,
            category: None,
            properties: Vec::new(),
        };
        assert!(matches!(
            fields.into_draft(ProductDraft::default(), false),
            Err(LedgerError::Validation { .. })
        ));
    }

    #[test]
    fn test_render_failure_is_storage_error() {
        let mut odd = std::collections::BTreeMap::new();
        odd.insert((1, 2), "tuple keys have no JSON form");

        assert!(matches!(render_json(&odd), Err(LedgerError::Storage { .. })));
        assert!(render_json(&json!({ "valid": true }))
            .unwrap()
            .contains("\"valid\": true"));
    }
}
