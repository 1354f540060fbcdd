//! # shelfmark-schema
//!
//! Gatekeeping for the dynamic property bag.
//!
//! - [`validate_properties`] checks a product's properties against its
//!   category's attribute definitions before any write.
//! - [`Safelist`] decides which property keys a search may filter on.
//!
//! Both are pure: no store access, no side effects beyond debug logging.

pub mod safelist;
pub mod validator;

pub use safelist::{is_safe_identifier, Safelist};
pub use validator::validate_properties;

// ── Tests ─────────────────────────────────────────────────────────────────────
