//! Audit log entry types.
//!
//! `AuditLogEntry` is one link of the tamper-evident chain. The hashing and
//! verification rules live in `shelfmark-audit`; this module only defines the
//! shapes shared with the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The structured description of an audited action.
pub type AuditPayload = Map<String, Value>;

/// A committed entry in the audit chain.
///
/// `current_hash` commits to `payload`, `timestamp` and `prev_hash`; `prev_hash`
/// commits to the preceding entry. Changing any of them after the fact is
/// detected by the chain verifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Store-assigned sequence id. Starts at 1, strictly increasing, never reused.
    pub id: u64,
    /// Free-form action tag, e.g. `"CREATE_PRODUCT"`.
    pub action: String,
    /// Who performed the action.
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub payload: AuditPayload,
    /// `current_hash` of the previous entry; empty for the first entry.
    pub prev_hash: String,
    /// Lowercase hex SHA-256 digest of this entry.
    pub current_hash: String,
}

/// An entry whose hash has been computed but which the store has not yet
/// assigned an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAuditEntry {
    pub action: String,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub payload: AuditPayload,
    pub prev_hash: String,
    pub current_hash: String,
}

impl PendingAuditEntry {
    pub fn into_entry(self, id: u64) -> AuditLogEntry {
        AuditLogEntry {
            id,
            action: self.action,
            actor: self.actor,
            timestamp: self.timestamp,
            payload: self.payload,
            prev_hash: self.prev_hash,
            current_hash: self.current_hash,
        }
    }
}

/// How an ambient audit append treats its own failure.
///
/// Basic product create/update/delete log with `BestEffort`: the primary
/// mutation is already committed, so a failed append is reported to the log
/// sink and swallowed. `Fatal` propagates the failure to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditPolicy {
    Fatal,
    BestEffort,
}

/// Well-known action tags.
pub mod actions {
    pub const CREATE_PRODUCT: &str = "CREATE_PRODUCT";
    pub const UPDATE_PRODUCT: &str = "UPDATE_PRODUCT";
    pub const DELETE_PRODUCT: &str = "DELETE_PRODUCT";
    pub const SALE_PROCESSED: &str = "SALE_PROCESSED";
}
