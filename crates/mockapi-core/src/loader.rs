//! # API Description Loading
//!
//! Reads an OpenAPI 3.x document (YAML or JSON — YAML is a superset, so one
//! parser serves both), inlines local `$ref` pointers, and compiles the
//! result into an [`ApiDocument`].
//!
//! ## Reference inlining
//!
//! Only the parts of the document the server acts on are walked: every path
//! item and every security scheme. A `$ref` of the form `#/json/pointer` is
//! replaced by the (recursively inlined) value it points to. Following a
//! reference that is already being expanded on the current chain is a
//! [`CoreError::CyclicReference`], so a successfully loaded schema tree is
//! always finite. Definitions under `components` that nothing references are
//! never visited.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::document::{ApiDocument, Route};
use crate::error::CoreError;
use crate::model::{
    HttpMethod, Operation, Parameter, RequestBody, SecurityRequirement, SecurityScheme,
};
use crate::path::PathTemplate;

// ---------------------------------------------------------------------------
// Raw document shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RawDocument {
    openapi: Option<Value>,
    #[serde(default)]
    info: Option<RawInfo>,
    #[serde(default)]
    security: Option<Vec<SecurityRequirement>>,
    #[serde(default)]
    paths: Map<String, Value>,
    #[serde(default)]
    components: RawComponents,
}

#[derive(Deserialize)]
struct RawInfo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    version: Option<Value>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawComponents {
    #[serde(default)]
    security_schemes: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawPathItem {
    #[serde(default)]
    parameters: Vec<Parameter>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOperation {
    #[serde(default)]
    operation_id: Option<String>,
    #[serde(default)]
    parameters: Vec<Parameter>,
    #[serde(default)]
    request_body: Option<RequestBody>,
    #[serde(default)]
    security: Option<Vec<SecurityRequirement>>,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

impl ApiDocument {
    /// Load and compile the description at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Read`] if the file cannot be read, and any of the
    /// parse / structure / reference errors of [`ApiDocument::parse`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse and compile a description from YAML or JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Parse`] for malformed text and the structural or
    /// reference errors of [`ApiDocument::from_value`].
    pub fn parse(source: &str) -> Result<Self, CoreError> {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(source).map_err(|e| CoreError::Parse(e.to_string()))?;
        let value = serde_json::to_value(yaml).map_err(|e| CoreError::Parse(e.to_string()))?;
        Self::from_value(value)
    }

    /// Compile an already-parsed description.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDocument`] when the `openapi` version is
    /// missing or not 3.x, or a section has the wrong shape;
    /// [`CoreError::InvalidPathTemplate`] for unusable path keys; and the
    /// reference errors described in the module docs.
    pub fn from_value(root: Value) -> Result<Self, CoreError> {
        let raw: RawDocument = serde_json::from_value(root.clone())
            .map_err(|e| CoreError::InvalidDocument(e.to_string()))?;

        let version = match &raw.openapi {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => {
                return Err(CoreError::InvalidDocument(
                    "missing \"openapi\" version field".into(),
                ))
            }
        };
        if !version.starts_with("3.") {
            return Err(CoreError::InvalidDocument(format!(
                "unsupported OpenAPI version \"{version}\"; expected 3.x"
            )));
        }

        let mut security_schemes = BTreeMap::new();
        for (name, value) in &raw.components.security_schemes {
            let inlined = inline_refs(value, &root, &mut Vec::new())?;
            let scheme: SecurityScheme = serde_json::from_value(inlined).map_err(|e| {
                CoreError::InvalidDocument(format!("security scheme \"{name}\": {e}"))
            })?;
            security_schemes.insert(name.clone(), scheme);
        }

        let mut routes = Vec::new();
        for (key, value) in &raw.paths {
            if key.starts_with("x-") {
                continue;
            }
            let template = PathTemplate::parse(key)?;
            let inlined = inline_refs(value, &root, &mut Vec::new())?;
            let operations = compile_path_item(key, inlined)?;
            routes.push(Route {
                template,
                operations,
            });
        }

        routes.sort_by(|a, b| {
            a.template
                .specificity()
                .cmp(&b.template.specificity())
                .then_with(|| a.template.as_str().cmp(b.template.as_str()))
        });

        let (title, version) = match raw.info {
            Some(info) => (
                info.title,
                info.version.map(|v| match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                }),
            ),
            None => (None, None),
        };

        Ok(Self {
            title,
            version,
            security: raw.security,
            security_schemes,
            routes,
        })
    }
}

// ---------------------------------------------------------------------------
// Compilation helpers
// ---------------------------------------------------------------------------

fn compile_path_item(
    path: &str,
    item: Value,
) -> Result<BTreeMap<HttpMethod, Operation>, CoreError> {
    let item: RawPathItem = serde_json::from_value(item)
        .map_err(|e| CoreError::InvalidDocument(format!("path \"{path}\": {e}")))?;

    let mut operations = BTreeMap::new();
    for method in HttpMethod::ALL {
        let Some(value) = item.rest.get(method.path_item_key()) else {
            continue;
        };
        let raw: RawOperation = serde_json::from_value(value.clone()).map_err(|e| {
            CoreError::InvalidDocument(format!(
                "operation {} \"{path}\": {e}",
                method.as_str()
            ))
        })?;

        operations.insert(
            method,
            Operation {
                method,
                path: path.to_string(),
                operation_id: raw.operation_id,
                parameters: merge_parameters(&item.parameters, raw.parameters),
                request_body: raw.request_body,
                security: raw.security,
            },
        );
    }
    Ok(operations)
}

/// Path-item parameters apply to every operation unless the operation
/// redeclares the same (name, location).
fn merge_parameters(shared: &[Parameter], own: Vec<Parameter>) -> Vec<Parameter> {
    let mut merged: Vec<Parameter> = shared
        .iter()
        .filter(|p| {
            !own.iter()
                .any(|o| o.name == p.name && o.location == p.location)
        })
        .cloned()
        .collect();
    merged.extend(own);
    merged
}

/// Replace every local `$ref` object under `value` with its target.
///
/// `chain` holds the references currently being expanded; meeting one of
/// them again is a cycle.
fn inline_refs(value: &Value, root: &Value, chain: &mut Vec<String>) -> Result<Value, CoreError> {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                let pointer = reference
                    .strip_prefix('#')
                    .ok_or_else(|| CoreError::ExternalReference(reference.clone()))?;
                if chain.iter().any(|r| r == reference) {
                    return Err(CoreError::CyclicReference(reference.clone()));
                }
                let target = root
                    .pointer(pointer)
                    .ok_or_else(|| CoreError::UnresolvedReference(reference.clone()))?;

                chain.push(reference.clone());
                let resolved = inline_refs(target, root, chain);
                chain.pop();
                return resolved;
            }

            let mut out = Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), inline_refs(v, root, chain)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|v| inline_refs(v, root, chain))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}
