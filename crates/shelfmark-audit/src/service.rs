//! The audit chain service: ambient appends, listing and verification.
//!
//! `AuditService` is used outside of any caller-held transaction. Each
//! `log_action` call opens its own atomic scope, so the read of the last hash
//! and the append happen under the backend's single writer slot.

use std::sync::Arc;

use tracing::{error, info, warn};

use shelfmark_contracts::{
    audit::{AuditLogEntry, AuditPayload, AuditPolicy},
    error::{LedgerError, LedgerResult},
    search::Page,
};
use shelfmark_core::{run_atomic, traits::Backend};

use crate::{
    chain::{find_break, ChainBreak},
    cursor::{append_entry, ChainLink},
};

/// Appends, lists and verifies audit entries against a shared backend.
#[derive(Clone)]
pub struct AuditService {
    backend: Arc<dyn Backend>,
    actor: String,
}

impl AuditService {
    /// `actor` is recorded on every entry this service appends.
    pub fn new(backend: Arc<dyn Backend>, actor: impl Into<String>) -> Self {
        Self {
            backend,
            actor: actor.into(),
        }
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// Append one entry in ambient mode.
    ///
    /// With `AuditPolicy::Fatal` a failed append is returned as an error.
    /// With `AuditPolicy::BestEffort` it is logged at error level and
    /// `Ok(None)` is returned, leaving the caller's already committed
    /// mutation in place.
    pub fn log_action(
        &self,
        action: &str,
        payload: AuditPayload,
        policy: AuditPolicy,
    ) -> LedgerResult<Option<AuditLogEntry>> {
        let appended = run_atomic(self.backend.as_ref(), |tx| {
            append_entry(tx, ChainLink::Ambient, action, &self.actor, payload)
        });

        match (appended, policy) {
            (Ok(entry), _) => Ok(Some(entry)),
            (Err(err), AuditPolicy::Fatal) => Err(err),
            (Err(err), AuditPolicy::BestEffort) => {
                error!(action = %action, error = %err, "audit append failed; mutation kept");
                Ok(None)
            }
        }
    }

    /// Entries newest first.
    pub fn list(&self, page: Page) -> LedgerResult<Vec<AuditLogEntry>> {
        self.backend.read()?.list_audit_entries(page)
    }

    /// The first break in the committed chain, if any.
    pub fn first_break(&self) -> LedgerResult<Option<ChainBreak>> {
        let entries = self.backend.read()?.all_audit_entries()?;
        let broken = find_break(&entries);

        match &broken {
            Some(b) => warn!(
                entry_id = b.entry_id,
                position = b.position,
                reason = %b,
                "audit chain verification failed"
            ),
            None => info!(entries = entries.len(), "audit chain verified"),
        }

        Ok(broken)
    }

    /// True when every committed entry verifies.
    pub fn verify_chain(&self) -> LedgerResult<bool> {
        Ok(self.first_break()?.is_none())
    }

    /// Like `verify_chain`, but a broken chain is an `Integrity` error naming
    /// the first bad entry.
    pub fn ensure_chain_intact(&self) -> LedgerResult<()> {
        match self.first_break()? {
            None => Ok(()),
            Some(b) => Err(LedgerError::Integrity {
                reason: b.to_string(),
            }),
        }
    }
}
