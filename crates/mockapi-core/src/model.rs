//! # API Description Model
//!
//! Typed view of the parts of an OpenAPI 3.x document the mock server acts
//! on: operations, parameters, request bodies, schemas and security
//! declarations. Everything here is deserialized from an already
//! `$ref`-inlined document (see [`crate::loader`]) and is immutable once
//! built.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde_json::Value;

// ── HTTP methods ────────────────────────────────────────────────────────────

/// HTTP methods an OpenAPI path item can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
    /// `HEAD`
    Head,
    /// `OPTIONS`
    Options,
    /// `TRACE`
    Trace,
}

impl HttpMethod {
    /// Every method, in path-item declaration order.
    pub const ALL: [HttpMethod; 8] = [
        Self::Get,
        Self::Put,
        Self::Post,
        Self::Delete,
        Self::Options,
        Self::Head,
        Self::Patch,
        Self::Trace,
    ];

    /// Upper-case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
        }
    }

    /// Lower-case key used for the method in an OpenAPI path item.
    pub fn path_item_key(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
            Self::Head => "head",
            Self::Options => "options",
            Self::Trace => "trace",
        }
    }

    /// Parse a wire method name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
    }

    /// Whether requests with this method semantically carry a body
    /// (create, replace, partial update).
    pub fn carries_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Security ────────────────────────────────────────────────────────────────

/// One security requirement alternative: scheme name → required scopes.
///
/// Satisfied only when every named scheme is satisfied. An empty
/// requirement names no scheme and is always satisfied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SecurityRequirement(pub BTreeMap<String, Vec<String>>);

impl SecurityRequirement {
    /// Names of the schemes this alternative requires.
    pub fn scheme_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Whether this alternative names no scheme at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const N: usize> From<[(&str, Vec<String>); N]> for SecurityRequirement {
    fn from(entries: [(&str, Vec<String>); N]) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(name, scopes)| (name.to_string(), scopes))
                .collect(),
        )
    }
}

/// Where an `apiKey` credential is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    /// Request header.
    Header,
    /// Query-string parameter.
    Query,
    /// Cookie.
    Cookie,
    /// Anything else. Never satisfiable.
    #[serde(other)]
    Unknown,
}

/// A named security scheme from `components.securitySchemes`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum SecurityScheme {
    /// `type: http` — `scheme` is e.g. `bearer` or `basic`.
    #[serde(rename = "http")]
    Http {
        /// HTTP authentication scheme name.
        scheme: String,
        /// Optional hint about the bearer token format.
        #[serde(rename = "bearerFormat", default)]
        bearer_format: Option<String>,
    },
    /// `type: apiKey`.
    #[serde(rename = "apiKey")]
    ApiKey {
        /// Header, query parameter or cookie name.
        name: String,
        /// Where the key travels.
        #[serde(rename = "in")]
        location: ApiKeyLocation,
    },
    /// `oauth2`, `openIdConnect`, `mutualTLS` and anything unrecognized.
    #[serde(other)]
    Other,
}

impl SecurityScheme {
    /// Whether this is an `http` scheme whose sub-kind is `bearer`.
    pub fn is_bearer(&self) -> bool {
        matches!(self, Self::Http { scheme, .. } if scheme.eq_ignore_ascii_case("bearer"))
    }
}

// ── Parameters & bodies ─────────────────────────────────────────────────────

/// Location of a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// Query string.
    Query,
    /// Path template segment.
    Path,
    /// Request header.
    Header,
    /// Cookie.
    Cookie,
}

impl ParameterLocation {
    /// Lower-case OpenAPI name of the location.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Path => "path",
            Self::Header => "header",
            Self::Cookie => "cookie",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared operation parameter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Where the parameter is read from.
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Whether the parameter must be present and non-empty.
    #[serde(default)]
    pub required: bool,
    /// Optional value schema.
    #[serde(default)]
    pub schema: Option<Schema>,
}

/// Schema attached to one media type of a request body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MediaType {
    /// Body schema, if declared.
    #[serde(default)]
    pub schema: Option<Schema>,
}

/// A declared request body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RequestBody {
    /// Whether a body must be supplied.
    #[serde(default)]
    pub required: bool,
    /// Media type (e.g. `application/json`) → schema.
    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,
}

// ── Operations ──────────────────────────────────────────────────────────────

/// One (path, method) entry of the description.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Method this operation answers.
    pub method: HttpMethod,
    /// Path template as written in the document (e.g. `/users/{id}`).
    pub path: String,
    /// `operationId`, when declared.
    pub operation_id: Option<String>,
    /// Parameters, path-item-level ones merged in.
    pub parameters: Vec<Parameter>,
    /// Request body declaration.
    pub request_body: Option<RequestBody>,
    /// Operation-level security override. `Some(vec![])` disables security
    /// for this operation; `None` defers to the document default.
    pub security: Option<Vec<SecurityRequirement>>,
}

// ── Schemas ─────────────────────────────────────────────────────────────────

/// Declared value type of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaType {
    /// `string`
    String,
    /// `integer`
    Integer,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// `array`
    Array,
    /// `object`
    Object,
}

impl SchemaType {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }

    /// Lower-case JSON Schema name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A schema node. Composition children are full schema nodes themselves.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "SchemaRepr")]
pub struct Schema {
    /// Declared type; `None` when absent or unrecognized.
    pub schema_type: Option<SchemaType>,
    /// Whether `null` is an acceptable value.
    pub nullable: bool,
    /// Names of required properties.
    pub required: Vec<String>,
    /// Declared properties.
    pub properties: BTreeMap<String, Schema>,
    /// String minimum length, in characters.
    pub min_length: Option<u64>,
    /// String maximum length, in characters.
    pub max_length: Option<u64>,
    /// Allowed values.
    pub enum_values: Option<Vec<Value>>,
    /// Array minimum item count.
    pub min_items: Option<u64>,
    /// Array item schema.
    pub items: Option<Box<Schema>>,
    /// AND-composed children.
    pub all_of: Vec<Schema>,
    /// Exactly-one OR-composed children.
    pub one_of: Vec<Schema>,
    /// At-least-one OR-composed children.
    pub any_of: Vec<Schema>,
}

impl Schema {
    /// Schema with just a type.
    pub fn of_type(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Self::default()
        }
    }
}

/// `type` is a single name in OpenAPI 3.0 and may be a list in 3.1.
#[derive(Deserialize)]
#[serde(untagged)]
enum TypeField {
    Single(String),
    Multiple(Vec<String>),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaRepr {
    #[serde(rename = "type", default)]
    type_field: Option<TypeField>,
    #[serde(default)]
    nullable: Option<bool>,
    #[serde(default)]
    required: Vec<String>,
    #[serde(default)]
    properties: BTreeMap<String, Schema>,
    #[serde(default)]
    min_length: Option<u64>,
    #[serde(default)]
    max_length: Option<u64>,
    #[serde(rename = "enum", default)]
    enum_values: Option<Vec<Value>>,
    #[serde(default)]
    min_items: Option<u64>,
    #[serde(default)]
    items: Option<Box<Schema>>,
    #[serde(default)]
    all_of: Vec<Schema>,
    #[serde(default)]
    one_of: Vec<Schema>,
    #[serde(default)]
    any_of: Vec<Schema>,
}

impl From<SchemaRepr> for Schema {
    fn from(repr: SchemaRepr) -> Self {
        let mut nullable = repr.nullable.unwrap_or(false);
        let schema_type = match repr.type_field {
            None => None,
            Some(TypeField::Single(name)) => {
                if name == "null" {
                    nullable = true;
                }
                SchemaType::parse(&name)
            }
            Some(TypeField::Multiple(names)) => {
                if names.iter().any(|n| n == "null") {
                    nullable = true;
                }
                names.iter().find_map(|n| SchemaType::parse(n))
            }
        };

        Self {
            schema_type,
            nullable,
            required: repr.required,
            properties: repr.properties,
            min_length: repr.min_length,
            max_length: repr.max_length,
            enum_values: repr.enum_values,
            min_items: repr.min_items,
            items: repr.items,
            all_of: repr.all_of,
            one_of: repr.one_of,
            any_of: repr.any_of,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn method_parse_is_case_insensitive() {
        assert_eq!(HttpMethod::parse("get"), Some(HttpMethod::Get));
        assert_eq!(HttpMethod::parse("PATCH"), Some(HttpMethod::Patch));
        assert_eq!(HttpMethod::parse("connect"), None);
    }

    #[test]
    fn only_write_methods_carry_bodies() {
        assert!(HttpMethod::Post.carries_body());
        assert!(HttpMethod::Put.carries_body());
        assert!(HttpMethod::Patch.carries_body());
        assert!(!HttpMethod::Get.carries_body());
        assert!(!HttpMethod::Delete.carries_body());
    }

    #[test]
    fn schema_deserializes_constraints_and_composition() {
        let schema: Schema = serde_json::from_value(json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": {"type": "string", "minLength": 3, "maxLength": 10},
                "tags": {"type": "array", "minItems": 1, "items": {"type": "string"}},
                "color": {"type": "string", "enum": ["red", "green"]}
            },
            "allOf": [{"required": ["age"]}],
            "oneOf": [{"properties": {"a": {"type": "integer"}}}]
        }))
        .unwrap();

        assert_eq!(schema.schema_type, Some(SchemaType::Object));
        assert_eq!(schema.required, vec!["name".to_string()]);
        assert_eq!(schema.properties["name"].min_length, Some(3));
        assert_eq!(schema.properties["name"].max_length, Some(10));
        assert_eq!(schema.properties["tags"].min_items, Some(1));
        assert_eq!(
            schema.properties["color"].enum_values,
            Some(vec![json!("red"), json!("green")])
        );
        assert_eq!(schema.all_of.len(), 1);
        assert_eq!(schema.one_of.len(), 1);
        assert!(schema.any_of.is_empty());
    }

    #[test]
    fn openapi_31_type_array_sets_nullable() {
        let schema: Schema = serde_json::from_value(json!({"type": ["string", "null"]})).unwrap();
        assert_eq!(schema.schema_type, Some(SchemaType::String));
        assert!(schema.nullable);
    }

    #[test]
    fn unknown_type_is_untyped() {
        let schema: Schema = serde_json::from_value(json!({"type": "file"})).unwrap();
        assert_eq!(schema.schema_type, None);
        assert!(!schema.nullable);
    }

    #[test]
    fn security_schemes_deserialize_by_type() {
        let bearer: SecurityScheme =
            serde_json::from_value(json!({"type": "http", "scheme": "Bearer"})).unwrap();
        assert!(bearer.is_bearer());

        let key: SecurityScheme =
            serde_json::from_value(json!({"type": "apiKey", "name": "X-Key", "in": "header"}))
                .unwrap();
        assert_eq!(
            key,
            SecurityScheme::ApiKey {
                name: "X-Key".into(),
                location: ApiKeyLocation::Header
            }
        );

        let odd: SecurityScheme =
            serde_json::from_value(json!({"type": "apiKey", "name": "k", "in": "body"})).unwrap();
        assert!(matches!(
            odd,
            SecurityScheme::ApiKey {
                location: ApiKeyLocation::Unknown,
                ..
            }
        ));

        let oauth: SecurityScheme =
            serde_json::from_value(json!({"type": "oauth2", "flows": {}})).unwrap();
        assert_eq!(oauth, SecurityScheme::Other);
    }

    #[test]
    fn empty_security_requirement() {
        let req: SecurityRequirement = serde_json::from_value(json!({})).unwrap();
        assert!(req.is_empty());
        let req: SecurityRequirement =
            serde_json::from_value(json!({"apiKey": [], "oauth": ["read"]})).unwrap();
        assert_eq!(req.scheme_names().collect::<Vec<_>>(), vec!["apiKey", "oauth"]);
    }
}
