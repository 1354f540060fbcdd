//! `MemoryStore`: the reference single-writer `Backend`.
//!
//! Committed tables sit behind an `RwLock`, so any number of readers can take
//! a consistent view at once. A separate writer `Mutex` admits one transaction
//! at a time. `begin()` clones the committed tables into a working set; every
//! write lands in that copy; `commit()` swaps it in whole. Rolling back is
//! just dropping the copy.
//!
//! A store opened with `MemoryStore::open` also writes the committed tables
//! to a JSON snapshot on every commit (write to a temp file, then rename), and
//! reloads them on the next open.

use std::fs;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, RwLock};

use tracing::{debug, info};

use shelfmark_contracts::error::{LedgerError, LedgerResult};
use shelfmark_core::traits::{Backend, StoreRead, StoreTx, Transaction};

use crate::tables::{TableView, Tables};

/// An in-memory store with optional JSON-file durability.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    writer: Mutex<()>,
    path: Option<PathBuf>,
}

impl MemoryStore {
    /// A purely in-memory store. Nothing survives the process.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a file-backed store, loading `path` if it exists.
    ///
    /// # Errors
    ///
    /// `LedgerError::Storage` when the file exists but cannot be read or does
    /// not contain a valid snapshot.
    pub fn open(path: impl Into<PathBuf>) -> LedgerResult<Self> {
        let path = path.into();
        let tables = if path.exists() {
            let bytes = fs::read(&path).map_err(|e| {
                LedgerError::storage(format!("failed to read '{}': {}", path.display(), e))
            })?;
            let tables: Tables = serde_json::from_slice(&bytes).map_err(|e| {
                LedgerError::storage(format!(
                    "snapshot '{}' is not valid: {}",
                    path.display(),
                    e
                ))
            })?;
            info!(
                path = %path.display(),
                products = tables.products.len(),
                audit_entries = tables.audit_log.len(),
                "store snapshot loaded"
            );
            tables
        } else {
            debug!(path = %path.display(), "no snapshot yet, starting empty");
            Tables::default()
        };

        Ok(Self {
            tables: RwLock::new(tables),
            writer: Mutex::new(()),
            path: Some(path),
        })
    }

    /// The snapshot file, if this store is file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn publish(&self, tables: Tables) -> LedgerResult<()> {
        if let Some(path) = &self.path {
            persist(path, &tables)?;
        }
        let mut committed = self
            .tables
            .write()
            .map_err(|e| LedgerError::storage(format!("store lock poisoned: {e}")))?;
        *committed = tables;
        Ok(())
    }
}

fn persist(path: &Path, tables: &Tables) -> LedgerResult<()> {
    let bytes = serde_json::to_vec_pretty(tables)
        .map_err(|e| LedgerError::storage(format!("failed to serialize snapshot: {e}")))?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes)
        .map_err(|e| LedgerError::storage(format!("failed to write '{}': {}", tmp.display(), e)))?;
    fs::rename(&tmp, path).map_err(|e| {
        LedgerError::storage(format!(
            "failed to move snapshot into '{}': {}",
            path.display(),
            e
        ))
    })?;

    debug!(path = %path.display(), "snapshot persisted");
    Ok(())
}

/// A transaction's private copy of the tables, plus the writer slot it holds.
pub struct WorkingSet<'a> {
    store: &'a MemoryStore,
    tables: Tables,
    _writer: MutexGuard<'a, ()>,
}

impl Deref for WorkingSet<'_> {
    type Target = Tables;

    fn deref(&self) -> &Tables {
        &self.tables
    }
}

impl DerefMut for WorkingSet<'_> {
    fn deref_mut(&mut self) -> &mut Tables {
        &mut self.tables
    }
}

impl<'a> Transaction for TableView<WorkingSet<'a>> {
    fn store_tx(&mut self) -> &mut dyn StoreTx {
        self
    }

    fn commit(self: Box<Self>) -> LedgerResult<()> {
        let TableView(WorkingSet {
            store,
            tables,
            _writer: writer,
        }) = *self;
        let published = store.publish(tables);
        // Release the writer slot only once the new tables are visible.
        drop(writer);
        published
    }

    fn rollback(self: Box<Self>) {
        debug!("working set discarded");
    }
}

impl Backend for MemoryStore {
    fn begin(&self) -> LedgerResult<Box<dyn Transaction + '_>> {
        let writer = self
            .writer
            .lock()
            .map_err(|e| LedgerError::storage(format!("writer lock poisoned: {e}")))?;
        let tables = self
            .tables
            .read()
            .map_err(|e| LedgerError::storage(format!("store lock poisoned: {e}")))?
            .clone();

        Ok(Box::new(TableView(WorkingSet {
            store: self,
            tables,
            _writer: writer,
        })))
    }

    fn read(&self) -> LedgerResult<Box<dyn StoreRead + '_>> {
        let guard = self
            .tables
            .read()
            .map_err(|e| LedgerError::storage(format!("store lock poisoned: {e}")))?;
        Ok(Box::new(TableView(guard)))
    }
}
