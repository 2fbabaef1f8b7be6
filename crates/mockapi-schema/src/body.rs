//! # Content Negotiation and Body Validation
//!
//! Order of checks for an operation that declares a request body:
//!
//! 1. Required body, no bytes: [`BodyError::BodyRequired`].
//! 2. Bytes and a media-type mapping: the `Content-Type` must be present
//!    and its base type (parameters after `;` dropped) must match a
//!    declared media type. Matching is case-insensitive; an exact key wins
//!    over `type/*`, which wins over `*/*`.
//! 3. The matched media type has a schema: decode, resolve composition,
//!    then report every missing required field and every failing property.
//!
//! `application/x-www-form-urlencoded` bodies decode to an object of
//! strings, with values coerced to the declared property type where it is
//! `integer`, `number` or `boolean`, and repeated keys collected into an
//! array for `array` properties. Every other media type decodes as JSON.

use std::collections::BTreeMap;

use mockapi_core::{MediaType, RequestBody, Schema, SchemaType};
use serde_json::{Map, Number, Value};

use crate::error::{BodyError, Violation};
use crate::property::validate_property;
use crate::resolve::{resolve, ResolvedConstraints};

/// The form media type, which gets its own decoder.
pub const FORM_MEDIA_TYPE: &str = "application/x-www-form-urlencoded";

/// Validate a request body against its declaration.
///
/// Returns the decoded body when a schema-bearing media type matched, and
/// `None` when there was nothing to decode or validate.
///
/// # Errors
///
/// See the module docs for the order in which the [`BodyError`] variants
/// are produced.
pub fn validate_body(
    declared: Option<&RequestBody>,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<Option<Value>, BodyError> {
    let Some(declared) = declared else {
        return Ok(None);
    };

    if bytes.is_empty() {
        return if declared.required {
            Err(BodyError::BodyRequired)
        } else {
            Ok(None)
        };
    }

    if declared.content.is_empty() {
        return Ok(None);
    }

    let allowed: Vec<String> = declared.content.keys().cloned().collect();
    let base = match content_type.map(base_media_type) {
        Some(base) if !base.is_empty() => base,
        _ => return Err(BodyError::ContentTypeRequired { allowed }),
    };

    let Some((key, media)) = match_media_type(&declared.content, &base) else {
        tracing::debug!(component = "NEGOTIATOR", content_type = %base, "media type rejected");
        return Err(BodyError::UnsupportedMediaType {
            content_type: base,
            allowed,
        });
    };
    tracing::debug!(component = "NEGOTIATOR", content_type = %base, matched = key, "media type accepted");

    let Some(schema) = &media.schema else {
        return Ok(None);
    };

    let constraints = resolve(Some(schema));
    let value = decode(&base, bytes, &constraints.properties)?;

    let violations = check(&value, &constraints);
    if violations.is_empty() {
        Ok(Some(value))
    } else {
        Err(BodyError::Violations(violations))
    }
}

/// Find the declared media type answering `base` (already lower-cased,
/// parameters stripped).
pub fn match_media_type<'a>(
    content: &'a BTreeMap<String, MediaType>,
    base: &str,
) -> Option<(&'a str, &'a MediaType)> {
    let exact = content
        .iter()
        .find(|(key, _)| base_media_type(key) == base);
    if let Some((key, media)) = exact {
        return Some((key.as_str(), media));
    }

    let major = base.split('/').next().unwrap_or(base);
    let family = content.iter().find(|(key, _)| {
        base_media_type(key)
            .strip_suffix("/*")
            .is_some_and(|m| m == major)
    });
    if let Some((key, media)) = family {
        return Some((key.as_str(), media));
    }

    content
        .iter()
        .find(|(key, _)| base_media_type(key) == "*/*")
        .map(|(key, media)| (key.as_str(), media))
}

/// Decode a form body, coercing values per the declared properties.
pub fn decode_form(bytes: &[u8], properties: &BTreeMap<String, Schema>) -> Value {
    let mut out = Map::new();
    for (key, raw) in url::form_urlencoded::parse(bytes) {
        let schema = properties.get(key.as_ref());
        match schema.and_then(|s| s.schema_type) {
            Some(SchemaType::Array) => {
                let item_type = schema
                    .and_then(|s| s.items.as_deref())
                    .and_then(|items| items.schema_type);
                let entry = out
                    .entry(key.into_owned())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(items) = entry {
                    items.push(coerce(&raw, item_type));
                }
            }
            declared => {
                out.insert(key.into_owned(), coerce(&raw, declared));
            }
        }
    }
    Value::Object(out)
}

fn base_media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn decode(
    base: &str,
    bytes: &[u8],
    properties: &BTreeMap<String, Schema>,
) -> Result<Value, BodyError> {
    if base == FORM_MEDIA_TYPE {
        return Ok(decode_form(bytes, properties));
    }
    serde_json::from_slice(bytes).map_err(|e| BodyError::InvalidBody(e.to_string()))
}

/// Leave the raw string in place when it does not parse; the property
/// check then reports the type mismatch.
fn coerce(raw: &str, declared: Option<SchemaType>) -> Value {
    match declared {
        Some(SchemaType::Integer | SchemaType::Number) => raw
            .parse::<i64>()
            .map(Value::from)
            .ok()
            .or_else(|| {
                raw.parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
            })
            .unwrap_or_else(|| Value::String(raw.to_string())),
        Some(SchemaType::Boolean) => match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(raw.to_string()),
        },
        _ => Value::String(raw.to_string()),
    }
}

fn check(value: &Value, constraints: &ResolvedConstraints) -> Vec<Violation> {
    let Some(object) = value.as_object() else {
        if constraints.is_empty() {
            return Vec::new();
        }
        return vec![Violation::new("", "request body must be a JSON object")];
    };

    let mut violations = Vec::new();
    for name in &constraints.required {
        if !object.contains_key(name) {
            violations.push(Violation::new(
                name.as_str(),
                format!("body must have required property '{name}'"),
            ));
        }
    }
    for (name, schema) in &constraints.properties {
        if let Some(v) = object.get(name) {
            if let Err(violation) = validate_property(name, v, schema) {
                violations.push(violation);
            }
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn declared(required: bool, media: &[(&str, Option<Schema>)]) -> RequestBody {
        RequestBody {
            required,
            content: media
                .iter()
                .map(|(k, s)| (k.to_string(), MediaType { schema: s.clone() }))
                .collect(),
        }
    }

    fn named_schema() -> Schema {
        Schema {
            required: vec!["name".into()],
            properties: [(
                "name".to_string(),
                Schema {
                    min_length: Some(3),
                    ..Schema::of_type(SchemaType::String)
                },
            )]
            .into_iter()
            .collect(),
            ..Schema::of_type(SchemaType::Object)
        }
    }

    fn json_body() -> RequestBody {
        declared(true, &[("application/json", Some(named_schema()))])
    }

    fn violations(result: Result<Option<Value>, BodyError>) -> Vec<Violation> {
        match result {
            Err(BodyError::Violations(v)) => v,
            other => panic!("expected violations, got {other:?}"),
        }
    }

    #[test]
    fn no_declaration_accepts_anything() {
        assert_eq!(validate_body(None, None, b"garbage"), Ok(None));
    }

    #[test]
    fn required_body_missing() {
        assert_eq!(
            validate_body(Some(&json_body()), Some("application/json"), b""),
            Err(BodyError::BodyRequired)
        );
        let optional = declared(false, &[("application/json", Some(named_schema()))]);
        assert_eq!(validate_body(Some(&optional), None, b""), Ok(None));
    }

    #[test]
    fn missing_content_type() {
        let err = validate_body(Some(&json_body()), None, b"{}").unwrap_err();
        assert_eq!(
            err,
            BodyError::ContentTypeRequired {
                allowed: vec!["application/json".into()]
            }
        );
    }

    #[test]
    fn unsupported_content_type_names_allowed_set() {
        let err = validate_body(Some(&json_body()), Some("text/plain"), b"hi").unwrap_err();
        assert_eq!(
            err,
            BodyError::UnsupportedMediaType {
                content_type: "text/plain".into(),
                allowed: vec!["application/json".into()]
            }
        );
    }

    #[test]
    fn content_type_parameters_and_case_are_ignored() {
        let result = validate_body(
            Some(&json_body()),
            Some("Application/JSON; charset=utf-8"),
            br#"{"name":"abc"}"#,
        );
        assert_eq!(result, Ok(Some(json!({"name": "abc"}))));
    }

    #[test]
    fn malformed_json_is_invalid_body() {
        let err = validate_body(Some(&json_body()), Some("application/json"), b"{nope").unwrap_err();
        assert!(matches!(err, BodyError::InvalidBody(_)));
    }

    #[test]
    fn empty_object_reports_one_missing_field() {
        let v = violations(validate_body(
            Some(&json_body()),
            Some("application/json"),
            b"{}",
        ));
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].message, "body must have required property 'name'");
    }

    #[test]
    fn short_name_reports_one_length_violation() {
        let v = violations(validate_body(
            Some(&json_body()),
            Some("application/json"),
            br#"{"name":"ab"}"#,
        ));
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].field, "name");
    }

    #[test]
    fn all_violations_are_collected() {
        let mut schema = named_schema();
        schema.required.push("age".into());
        schema
            .properties
            .insert("age".into(), Schema::of_type(SchemaType::Integer));
        schema
            .properties
            .insert("active".into(), Schema::of_type(SchemaType::Boolean));
        let body = declared(true, &[("application/json", Some(schema))]);

        let v = violations(validate_body(
            Some(&body),
            Some("application/json"),
            br#"{"name":"ab","active":"yes"}"#,
        ));
        assert_eq!(v.len(), 3);
    }

    #[test]
    fn non_object_body_against_object_schema() {
        let v = violations(validate_body(
            Some(&json_body()),
            Some("application/json"),
            b"[1,2]",
        ));
        assert_eq!(v, vec![Violation::new("", "request body must be a JSON object")]);
    }

    #[test]
    fn media_type_without_schema_skips_decoding() {
        let body = declared(true, &[("application/octet-stream", None)]);
        assert_eq!(
            validate_body(Some(&body), Some("application/octet-stream"), &[0xff, 0x00]),
            Ok(None)
        );
    }

    #[test]
    fn wildcard_media_types() {
        let content: BTreeMap<String, MediaType> = [
            ("*/*".to_string(), MediaType::default()),
            ("text/*".to_string(), MediaType::default()),
            ("application/json".to_string(), MediaType::default()),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            match_media_type(&content, "application/json").map(|m| m.0),
            Some("application/json")
        );
        assert_eq!(match_media_type(&content, "text/csv").map(|m| m.0), Some("text/*"));
        assert_eq!(match_media_type(&content, "image/png").map(|m| m.0), Some("*/*"));
    }

    #[test]
    fn form_body_is_coerced_and_validated() {
        let mut schema = named_schema();
        schema
            .properties
            .insert("age".into(), Schema::of_type(SchemaType::Integer));
        schema
            .properties
            .insert("admin".into(), Schema::of_type(SchemaType::Boolean));
        let body = declared(true, &[(FORM_MEDIA_TYPE, Some(schema))]);

        let value = validate_body(Some(&body), Some(FORM_MEDIA_TYPE), b"name=Ada+L&age=36&admin=true")
            .unwrap()
            .unwrap();
        assert_eq!(value, json!({"name": "Ada L", "age": 36, "admin": true}));
    }

    #[test]
    fn form_numbers_match_json_numbers() {
        let mut schema = named_schema();
        schema
            .properties
            .insert("age".into(), Schema::of_type(SchemaType::Integer));
        let body = declared(
            true,
            &[
                ("application/json", Some(schema.clone())),
                (FORM_MEDIA_TYPE, Some(schema)),
            ],
        );

        let from_json = validate_body(Some(&body), Some("application/json"), br#"{"name":"Ada","age":36.5}"#)
            .unwrap()
            .unwrap();
        let from_form = validate_body(Some(&body), Some(FORM_MEDIA_TYPE), b"name=Ada&age=36.5")
            .unwrap()
            .unwrap();
        assert_eq!(from_form, from_json);

        let exponent = validate_body(Some(&body), Some(FORM_MEDIA_TYPE), b"name=Ada&age=1e3")
            .unwrap()
            .unwrap();
        assert_eq!(exponent["age"], json!(1000.0));
    }

    #[test]
    fn form_values_that_do_not_parse_stay_strings() {
        let props: BTreeMap<String, Schema> =
            [("age".to_string(), Schema::of_type(SchemaType::Integer))]
                .into_iter()
                .collect();
        assert_eq!(decode_form(b"age=old", &props), json!({"age": "old"}));
    }

    #[test]
    fn repeated_form_keys_fill_array_properties() {
        let props: BTreeMap<String, Schema> = [(
            "n".to_string(),
            Schema {
                items: Some(Box::new(Schema::of_type(SchemaType::Number))),
                ..Schema::of_type(SchemaType::Array)
            },
        )]
        .into_iter()
        .collect();
        assert_eq!(decode_form(b"n=1.5&n=2", &props), json!({"n": [1.5, 2]}));
    }
}
