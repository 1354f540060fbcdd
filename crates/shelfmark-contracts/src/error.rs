//! Error types for the shelfmark write pipeline.
//!
//! All fallible operations return `LedgerResult<T>`. Each variant carries
//! enough context (line numbers, attribute keys, stock counts) for the caller
//! to act on it without re-reading the store.

use thiserror::Error;

/// The unified error type for shelfmark.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// A referenced product, category or sale does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// A schema violation, malformed row or bad field format.
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    /// A sale requested more units than are on hand.
    #[error(
        "insufficient stock for product '{product_id}': {available} available, {requested} requested"
    )]
    InsufficientStock {
        product_id: String,
        available: u32,
        requested: u32,
    },

    /// A uniqueness constraint was violated (duplicate sku, duplicate id).
    #[error("conflict: {reason}")]
    Conflict { reason: String },

    /// The audit chain failed verification.
    #[error("audit chain integrity violated: {reason}")]
    Integrity { reason: String },

    /// The input stream could not be read or tokenized.
    #[error("malformed input: {reason}")]
    Input { reason: String },

    /// The storage backend failed (poisoned lock, unwritable snapshot).
    #[error("storage failure: {reason}")]
    Storage { reason: String },

    /// A configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },
}

impl LedgerError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        LedgerError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        LedgerError::Validation {
            reason: reason.into(),
        }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        LedgerError::Conflict {
            reason: reason.into(),
        }
    }

    pub fn storage(reason: impl Into<String>) -> Self {
        LedgerError::Storage {
            reason: reason.into(),
        }
    }

    /// Prefix the error's context with a CSV line number.
    ///
    /// Variants whose message is a free-form reason get `CSV line N: ` in
    /// front of it. `NotFound` and `InsufficientStock` have structured fields
    /// only and are folded into a `Validation` error carrying the line.
    pub fn at_line(self, line: usize) -> Self {
        let prefix = |reason: String| format!("CSV line {line}: {reason}");
        match self {
            LedgerError::Validation { reason } => LedgerError::Validation {
                reason: prefix(reason),
            },
            LedgerError::Conflict { reason } => LedgerError::Conflict {
                reason: prefix(reason),
            },
            LedgerError::Input { reason } => LedgerError::Input {
                reason: prefix(reason),
            },
            LedgerError::Storage { reason } => LedgerError::Storage {
                reason: prefix(reason),
            },
            LedgerError::Integrity { reason } => LedgerError::Integrity {
                reason: prefix(reason),
            },
            LedgerError::Config { reason } => LedgerError::Config {
                reason: prefix(reason),
            },
            other @ (LedgerError::NotFound { .. } | LedgerError::InsufficientStock { .. }) => {
                LedgerError::Validation {
                    reason: prefix(other.to_string()),
                }
            }
        }
    }
}

/// Convenience alias used throughout the shelfmark crates.
pub type LedgerResult<T> = Result<T, LedgerError>;
