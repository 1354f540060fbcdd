//! Safelisted property keys for dynamic search.
//!
//! Search filters on product properties are keyed by caller-supplied strings.
//! Only keys declared by the searched category, and shaped like a plain
//! identifier, are allowed through. Anything else is dropped silently and the
//! search runs on the remaining filters.

use std::collections::BTreeSet;

use tracing::debug;

use shelfmark_contracts::{category::Category, product::Properties};

/// The property keys a search may filter on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Safelist {
    keys: BTreeSet<String>,
}

impl Safelist {
    /// The allow-list for `category`; empty when there is no category.
    pub fn for_category(category: Option<&Category>) -> Self {
        let keys = category
            .map(|c| c.attribute_keys().map(str::to_string).collect())
            .unwrap_or_default();
        Self { keys }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// True when `key` is declared and has a safe identifier shape.
    pub fn permits(&self, key: &str) -> bool {
        self.keys.contains(key) && is_safe_identifier(key)
    }

    /// Drop every filter key this safelist does not permit.
    ///
    /// Returns the dropped keys so callers can log them.
    pub fn retain(&self, filters: &mut Properties) -> Vec<String> {
        let mut dropped = Vec::new();
        filters.retain(|key, _| {
            let keep = self.permits(key);
            if !keep {
                dropped.push(key.clone());
            }
            keep
        });
        if !dropped.is_empty() {
            debug!(dropped = ?dropped, "ignoring property filters outside the safelist");
        }
        dropped
    }
}

/// `^[A-Za-z][A-Za-z0-9_]*$`
pub fn is_safe_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
