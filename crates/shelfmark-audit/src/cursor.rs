//! Appending entries inside an open transaction.
//!
//! Two modes exist:
//!
//! - **Ambient** (`ChainLink::Ambient`): read the store's last entry for the
//!   previous hash, then append. Correct only while the caller holds the
//!   single writer slot and appends at most once per transaction.
//! - **Threaded** (`ChainLink::Threaded` / `ChainCursor`): the caller carries
//!   the previous hash in memory. Required whenever a transaction appends more
//!   than one entry, since a store read mid-transaction is not guaranteed to
//!   observe the transaction's own earlier appends.

use chrono::Utc;
use tracing::debug;

use shelfmark_contracts::{
    audit::{AuditLogEntry, AuditPayload, PendingAuditEntry},
    error::LedgerResult,
};
use shelfmark_core::traits::{StoreRead, StoreTx};

use crate::chain::{hash_entry, GENESIS_PREV_HASH};

/// Where an append takes its previous hash from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainLink<'a> {
    /// Read the last entry from the store.
    Ambient,
    /// Use this hash verbatim.
    Threaded(&'a str),
}

/// The hash of the last entry visible to `store`, or the genesis value.
pub fn last_hash<R: StoreRead + ?Sized>(store: &R) -> LedgerResult<String> {
    Ok(store
        .last_audit_entry()?
        .map(|entry| entry.current_hash)
        .unwrap_or_else(|| GENESIS_PREV_HASH.to_string()))
}

/// Hash and append one entry.
///
/// The returned entry's `current_hash` is the value to thread into the next
/// append of the same transaction.
pub fn append_entry<T: StoreTx + ?Sized>(
    tx: &mut T,
    link: ChainLink<'_>,
    action: &str,
    actor: &str,
    payload: AuditPayload,
) -> LedgerResult<AuditLogEntry> {
    let prev_hash = match link {
        ChainLink::Ambient => last_hash(&*tx)?,
        ChainLink::Threaded(hash) => hash.to_string(),
    };

    let timestamp = Utc::now();
    let current_hash = hash_entry(&payload, &timestamp, &prev_hash);

    let entry = tx.append_audit_entry(PendingAuditEntry {
        action: action.to_string(),
        actor: actor.to_string(),
        timestamp,
        payload,
        prev_hash,
        current_hash,
    })?;

    debug!(
        entry_id = entry.id,
        action = %entry.action,
        current_hash = %entry.current_hash,
        "audit entry appended"
    );

    Ok(entry)
}

/// Carries the previous hash across several appends in one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainCursor {
    prev_hash: String,
}

impl ChainCursor {
    /// Start from the last entry committed before the transaction began.
    ///
    /// Call this before the transaction appends anything.
    pub fn seed<R: StoreRead + ?Sized>(store: &R) -> LedgerResult<Self> {
        Ok(Self {
            prev_hash: last_hash(store)?,
        })
    }

    /// Start from an explicitly known hash.
    pub fn from_hash(prev_hash: impl Into<String>) -> Self {
        Self {
            prev_hash: prev_hash.into(),
        }
    }

    /// The hash the next append will link to.
    pub fn prev_hash(&self) -> &str {
        &self.prev_hash
    }

    /// Append in threaded mode and advance the cursor to the new entry.
    pub fn append<T: StoreTx + ?Sized>(
        &mut self,
        tx: &mut T,
        action: &str,
        actor: &str,
        payload: AuditPayload,
    ) -> LedgerResult<AuditLogEntry> {
        let entry = append_entry(tx, ChainLink::Threaded(&self.prev_hash), action, actor, payload)?;
        self.prev_hash = entry.current_hash.clone();
        Ok(entry)
    }
}
