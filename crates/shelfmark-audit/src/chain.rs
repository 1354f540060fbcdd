//! Hash-chain primitives: canonical payloads, entry hashing and verification.
//!
//! Hash input layout (bytes, in order):
//!   1. canonical JSON of the payload (object keys sorted at every depth,
//!      no whitespace)
//!   2. the timestamp as RFC 3339 UTC with exactly nine fractional digits,
//!      e.g. `2026-10-19T08:30:00.000000042Z`
//!   3. prev_hash as UTF-8 (empty for the first entry)
//!
//! The digest is rendered as 64 lowercase hex characters.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};

use shelfmark_contracts::audit::{AuditLogEntry, AuditPayload};

/// The `prev_hash` of the first entry in a chain.
pub const GENESIS_PREV_HASH: &str = "";

/// Serialize `payload` deterministically.
///
/// Keys are sorted lexicographically at every nesting level regardless of how
/// the map was built, so recomputing a hash after a store round-trip always
/// sees the same bytes.
pub fn canonical_json(payload: &AuditPayload) -> String {
    let mut out = String::new();
    write_object(payload, &mut out);
    out
}

fn write_object(map: &serde_json::Map<String, Value>, out: &mut String) {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    out.push('{');
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        write_value(&map[key], out);
    }
    out.push('}');
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => write_object(map, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Render a timestamp in the fixed form that enters the hash.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Compute `SHA256(canonical(payload) ++ timestamp ++ prev_hash)` as lowercase hex.
pub fn hash_entry(payload: &AuditPayload, timestamp: &DateTime<Utc>, prev_hash: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(payload).as_bytes());
    hasher.update(format_timestamp(timestamp).as_bytes());
    hasher.update(prev_hash.as_bytes());

    hex::encode(hasher.finalize())
}

/// Why a chain failed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakKind {
    /// The entry does not link to its predecessor.
    PrevHashMismatch { expected: String, found: String },
    /// The entry's stored hash does not match its contents.
    HashMismatch { expected: String, found: String },
}

/// The first entry at which a chain stops verifying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainBreak {
    /// Store id of the offending entry.
    pub entry_id: u64,
    /// Zero-based position in append order.
    pub position: usize,
    pub kind: BreakKind,
}

impl fmt::Display for ChainBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            BreakKind::PrevHashMismatch { expected, found } => write!(
                f,
                "entry {} (position {}) links to '{}' but the previous hash is '{}'",
                self.entry_id, self.position, found, expected
            ),
            BreakKind::HashMismatch { expected, found } => write!(
                f,
                "entry {} (position {}) stores hash '{}' but its contents hash to '{}'",
                self.entry_id, self.position, found, expected
            ),
        }
    }
}

/// Walk `entries` (ascending append order) and return the first break.
///
/// For every entry, in order:
///
/// 1. **Linkage**: the stored `prev_hash` equals the expected previous hash
///    (`GENESIS_PREV_HASH` for the first entry, then the predecessor's
///    `current_hash`).
/// 2. **Content**: the stored `current_hash` equals the hash recomputed from
///    payload, timestamp and the expected previous hash.
///
/// Returns `None` when every entry passes. An empty chain has no break.
pub fn find_break(entries: &[AuditLogEntry]) -> Option<ChainBreak> {
    let mut expected_prev = GENESIS_PREV_HASH.to_string();

    for (position, entry) in entries.iter().enumerate() {
        if entry.prev_hash != expected_prev {
            return Some(ChainBreak {
                entry_id: entry.id,
                position,
                kind: BreakKind::PrevHashMismatch {
                    expected: expected_prev,
                    found: entry.prev_hash.clone(),
                },
            });
        }

        let recomputed = hash_entry(&entry.payload, &entry.timestamp, &expected_prev);
        if entry.current_hash != recomputed {
            return Some(ChainBreak {
                entry_id: entry.id,
                position,
                kind: BreakKind::HashMismatch {
                    expected: recomputed,
                    found: entry.current_hash.clone(),
                },
            });
        }

        expected_prev = entry.current_hash.clone();
    }

    None
}

/// True when the whole chain verifies. An empty chain is valid.
pub fn verify_chain(entries: &[AuditLogEntry]) -> bool {
    find_break(entries).is_none()
}
