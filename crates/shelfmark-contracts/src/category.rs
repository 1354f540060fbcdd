//! Categories: the schema blueprint for product properties.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The value type an attribute definition demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Number,
    Boolean,
    /// A string drawn from the definition's `options`.
    Select,
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeType::String => "string",
            AttributeType::Number => "number",
            AttributeType::Boolean => "boolean",
            AttributeType::Select => "select",
        };
        f.write_str(name)
    }
}

/// One rule governing a dynamic product property.
///
/// Example in JSON:
/// ```json
/// { "key": "voltage", "type": "number", "required": true, "unit": "Volts" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: AttributeType,
    #[serde(default)]
    pub required: bool,
    /// Allowed values for `select` attributes. Empty means any string.
    #[serde(default)]
    pub options: Vec<String>,
    /// Display unit, e.g. "Volts". Informational only.
    #[serde(default)]
    pub unit: String,
}

impl AttributeDefinition {
    pub fn new(key: impl Into<String>, kind: AttributeType) -> Self {
        Self {
            key: key.into(),
            kind,
            required: false,
            options: Vec::new(),
            unit: String::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }
}

/// A product category and its ordered attribute definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub attribute_definitions: Vec<AttributeDefinition>,
}

impl Category {
    /// The declared attribute keys, in declaration order.
    pub fn attribute_keys(&self) -> impl Iterator<Item = &str> {
        self.attribute_definitions.iter().map(|a| a.key.as_str())
    }
}
