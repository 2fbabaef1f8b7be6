//! Single-property checks.
//!
//! Rules run in a fixed order and the first failure is reported. `object`
//! and untyped properties are only subject to the null rule.

use mockapi_core::{Schema, SchemaType};
use serde_json::Value;

use crate::error::Violation;

/// Check one decoded value against its property schema.
///
/// # Errors
///
/// Returns the first [`Violation`] the value triggers.
pub fn validate_property(name: &str, value: &Value, schema: &Schema) -> Result<(), Violation> {
    let fail = |rule: String| Err(Violation::new(name, format!("property '{name}' {rule}")));

    if value.is_null() {
        return if schema.nullable {
            Ok(())
        } else {
            fail("must not be null".into())
        };
    }

    match schema.schema_type {
        Some(SchemaType::String) => {
            let Some(s) = value.as_str() else {
                return fail("must be a string".into());
            };
            let len = s.chars().count() as u64;
            if let Some(min) = schema.min_length {
                if len < min {
                    return fail(format!("must be at least {min} characters long"));
                }
            }
            if let Some(max) = schema.max_length {
                if len > max {
                    return fail(format!("must be at most {max} characters long"));
                }
            }
            if let Some(allowed) = &schema.enum_values {
                if !allowed.iter().any(|v| enum_repr(v) == s) {
                    let listed: Vec<String> = allowed.iter().map(enum_repr).collect();
                    return fail(format!("must be one of [{}]", listed.join(", ")));
                }
            }
            Ok(())
        }
        Some(SchemaType::Integer | SchemaType::Number) => {
            if value.is_number() {
                Ok(())
            } else {
                fail("must be a number".into())
            }
        }
        Some(SchemaType::Boolean) => {
            if value.is_boolean() {
                Ok(())
            } else {
                fail("must be a boolean".into())
            }
        }
        Some(SchemaType::Array) => {
            let Some(items) = value.as_array() else {
                return fail("must be an array".into());
            };
            match schema.min_items {
                Some(min) if (items.len() as u64) < min => {
                    fail(format!("must contain at least {min} items"))
                }
                _ => Ok(()),
            }
        }
        Some(SchemaType::Object) | None => Ok(()),
    }
}

fn enum_repr(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
