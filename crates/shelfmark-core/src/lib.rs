//! # shelfmark-core
//!
//! The storage boundary and the all-or-nothing unit of work.
//!
//! This crate provides:
//! - The capability traits (`StoreRead`, `StoreTx`, `Transaction`, `Backend`)
//! - The `AtomicScope` that commits on success and rolls back on error or panic
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shelfmark_core::{run_atomic, traits::Backend};
//!
//! let count = run_atomic(&backend, |tx| {
//!     tx.insert_product(product)?;
//!     Ok(1)
//! })?;
//! ```

pub mod scope;
pub mod traits;

pub use scope::{run_atomic, AtomicScope};
