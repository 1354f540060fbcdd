//! # shelfmark-contracts
//!
//! Shared data model and error types for the shelfmark retail ledger.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions, error types and identifier generation.

pub mod audit;
pub mod category;
pub mod error;
pub mod product;
pub mod sale;
pub mod search;

use uuid::Uuid;

/// Generate a fresh entity identifier (UUID v4, hyphenated).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
