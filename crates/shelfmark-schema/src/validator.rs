//! Property bag validation against a category blueprint.
//!
//! Attribute definitions are checked in declaration order and the first
//! violation is returned. For each definition:
//!
//! 1. **Presence**: a `required` key must be in the bag.
//! 2. **Type**: a present value must match the declared `AttributeType`:
//!    - `string`  → `PropertyValue::String`
//!    - `boolean` → `PropertyValue::Boolean`
//!    - `number`  → `PropertyValue::Number`, or a string that parses as a float
//!    - `select`  → a string that is exactly one of `options` (any string when
//!      `options` is empty)
//!
//! Keys in the bag that the category does not declare are accepted as-is.

use tracing::debug;

use shelfmark_contracts::{
    category::{AttributeDefinition, AttributeType, Category},
    error::{LedgerError, LedgerResult},
    product::{Properties, PropertyValue},
};

/// Validate `properties` against `category`.
///
/// Products without a category are schema-free, so `None` always passes.
///
/// # Errors
///
/// `LedgerError::Validation` naming the offending key.
pub fn validate_properties(category: Option<&Category>, properties: &Properties) -> LedgerResult<()> {
    let Some(category) = category else {
        return Ok(());
    };

    for attr in &category.attribute_definitions {
        match properties.get(&attr.key) {
            None if attr.required => {
                debug!(category_id = %category.id, key = %attr.key, "required property missing");
                return Err(LedgerError::validation(format!(
                    "missing required property \"{}\"",
                    attr.key
                )));
            }
            None => continue,
            Some(value) => check_type(attr, value)?,
        }
    }

    Ok(())
}

fn check_type(attr: &AttributeDefinition, value: &PropertyValue) -> LedgerResult<()> {
    let ok = match (attr.kind, value) {
        (AttributeType::String, PropertyValue::String(_)) => true,
        (AttributeType::Boolean, PropertyValue::Boolean(_)) => true,
        (AttributeType::Number, PropertyValue::Number(n)) => n.is_finite(),
        (AttributeType::Number, PropertyValue::String(s)) => s.trim().parse::<f64>().is_ok(),
        (AttributeType::Select, PropertyValue::String(s)) => {
            if attr.options.is_empty() || attr.options.iter().any(|o| o == s) {
                true
            } else {
                return Err(LedgerError::validation(format!(
                    "property \"{}\" value \"{}\" is not in allowed options [{}]",
                    attr.key,
                    s,
                    attr.options.join(", ")
                )));
            }
        }
        _ => false,
    };

    if ok {
        Ok(())
    } else {
        let expected = match attr.kind {
            AttributeType::Select => "a string for select type".to_string(),
            AttributeType::Number => "a number".to_string(),
            AttributeType::Boolean => "a boolean".to_string(),
            AttributeType::String => "a string".to_string(),
        };
        Err(LedgerError::validation(format!(
            "property \"{}\" must be {}, got {}",
            attr.key,
            expected,
            describe(value)
        )))
    }
}

fn describe(value: &PropertyValue) -> String {
    match value {
        PropertyValue::String(s) => format!("\"{s}\""),
        other => other.to_string(),
    }
}
