//! Products and their dynamic property bag.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One value in a product's property bag.
///
/// Decoded from JSON without a tag: `true` becomes `Boolean`, `220` becomes
/// `Number`, `"220"` stays a `String`. CSV imports always produce `String`
/// values; the validator decides whether a string is acceptable for a
/// numeric attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Boolean(bool),
    Number(f64),
    String(String),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// The numeric reading of this value: a native number, or a string that
    /// parses as a float.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            PropertyValue::String(s) => s.trim().parse::<f64>().ok(),
            PropertyValue::Boolean(_) => None,
        }
    }

    /// Equality used by search filters.
    ///
    /// Identical values match. A number and a string also match when the
    /// string parses to the same number, so `voltage = 220` finds products
    /// imported from CSV with `"220"`.
    pub fn matches(&self, other: &PropertyValue) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (PropertyValue::Number(_), PropertyValue::String(_))
            | (PropertyValue::String(_), PropertyValue::Number(_)) => {
                match (self.as_number(), other.as_number()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            _ => false,
        }
    }

    /// Infer a value from loose text, as typed on a command line.
    ///
    /// `true`/`false` become booleans, anything that parses as a float
    /// becomes a number, everything else stays a string.
    pub fn infer(raw: &str) -> Self {
        match raw {
            "true" => PropertyValue::Boolean(true),
            "false" => PropertyValue::Boolean(false),
            _ => match raw.parse::<f64>() {
                Ok(n) if n.is_finite() => PropertyValue::Number(n),
                _ => PropertyValue::String(raw.to_string()),
            },
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Boolean(b) => write!(f, "{b}"),
            PropertyValue::Number(n) => write!(f, "{n}"),
            PropertyValue::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

/// A product's flexible attributes, keyed by attribute name.
pub type Properties = BTreeMap<String, PropertyValue>;

/// A stocked product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Globally unique stock-keeping unit.
    pub sku: String,
    /// The category whose attribute definitions `properties` must satisfy.
    pub category_id: Option<String>,
    pub base_price: f64,
    pub cost_price: f64,
    /// Units on hand. Unsigned, so it can never go negative.
    pub quantity: u32,
    #[serde(default)]
    pub properties: Properties,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The caller-supplied fields of a product, used for create and update.
///
/// Identity and timestamps are assigned by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub category_id: Option<String>,
    pub base_price: f64,
    #[serde(default)]
    pub cost_price: f64,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub properties: Properties,
}

impl ProductDraft {
    /// Materialize the draft as a new product with the given id and clock.
    pub fn into_product(self, id: impl Into<String>, now: DateTime<Utc>) -> Product {
        Product {
            id: id.into(),
            name: self.name,
            sku: self.sku,
            category_id: self.category_id,
            base_price: self.base_price,
            cost_price: self.cost_price,
            quantity: self.quantity,
            properties: self.properties,
            created_at: now,
            updated_at: now,
        }
    }
}
