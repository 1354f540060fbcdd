//! # shelfmark-audit
//!
//! Append-only, SHA-256 hash-chained audit log for shelfmark.
//!
//! ## Overview
//!
//! Every mutation appends an `AuditLogEntry` whose hash commits to its
//! payload, its timestamp and the previous entry's hash. Editing or removing
//! any entry after the fact breaks the chain, and `verify_chain` detects it.
//!
//! Appends come in two flavours:
//!
//! - **ambient** (`AuditService::log_action`, `ChainLink::Ambient`): read the
//!   last hash from the store, then append;
//! - **threaded** (`ChainCursor`): the caller carries the previous hash across
//!   several appends inside one transaction.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shelfmark_audit::ChainCursor;
//!
//! run_atomic(&backend, |tx| {
//!     let mut cursor = ChainCursor::seed(&*tx)?;
//!     cursor.append(tx, "CREATE_PRODUCT", "system", payload_a)?;
//!     cursor.append(tx, "CREATE_PRODUCT", "system", payload_b)?;
//!     Ok(())
//! })?;
//! ```

pub mod chain;
pub mod cursor;
pub mod service;

pub use chain::{
    canonical_json, find_break, format_timestamp, hash_entry, verify_chain, BreakKind, ChainBreak,
    GENESIS_PREV_HASH,
};
pub use cursor::{append_entry, last_hash, ChainCursor, ChainLink};
pub use service::AuditService;

// ── Tests ─────────────────────────────────────────────────────────────────────
