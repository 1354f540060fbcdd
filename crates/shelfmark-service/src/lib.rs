//! # shelfmark-service
//!
//! The operations shelfmark exposes: categories, product CRUD and search,
//! bulk import, sales and audit verification.
//!
//! This crate provides:
//! - `CategoryService`, `ProductService`, `ImportPipeline` and `SaleProcessor`
//! - The `Ledger` facade that wires them to one backend and one actor
//!
//! Product create/update/delete commit first and audit afterwards on a
//! best-effort basis. Import and sale append their audit entries inside the
//! same atomic scope as the data they describe, so an audit failure aborts
//! them.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shelfmark_service::Ledger;
//! use shelfmark_store::MemoryStore;
//!
//! let ledger = Ledger::new(Arc::new(MemoryStore::open("shelfmark.json")?), "clerk-1");
//! let imported = ledger.import_products(None, std::io::BufReader::new(file))?;
//! assert!(ledger.verify_audit_chain()?);
//! ```

pub mod category;
pub mod csv;
pub mod import;
pub mod ledger;
pub mod product;
pub mod sale;

pub use category::CategoryService;
pub use import::ImportPipeline;
pub use ledger::Ledger;
pub use product::ProductService;
pub use sale::SaleProcessor;

// ── Tests ─────────────────────────────────────────────────────────────────────
