//! # Request Validation Pipeline
//!
//! Runs once per request, in a fixed order, stopping at the first failing
//! stage:
//!
//! 1. Security: some requirement alternative must be satisfied.
//! 2. Body, for `POST` / `PUT` / `PATCH` only: negotiation, decoding and
//!    schema checks, reporting every violation at once.
//! 3. Parameters: the first required parameter that is absent or empty.
//!
//! A passing request yields the decoded body, if one was validated, so the
//! mock generator does not decode it a second time.

use mockapi_core::{ApiDocument, Operation, ParameterLocation};
use mockapi_schema::{validate_body, BodyError};
use serde_json::Value;
use thiserror::Error;

use crate::request::InboundRequest;
use crate::security::{effective_requirements, is_satisfied};

/// Coarse class of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusHint {
    /// No security alternative was satisfied.
    Unauthorized,
    /// Content type missing or not declared.
    UnsupportedMediaType,
    /// Everything else.
    BadRequest,
}

/// Why a request was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationFailure {
    /// Stage 1.
    #[error("no security requirement is satisfied")]
    Unauthorized,

    /// Stage 2.
    #[error(transparent)]
    Body(#[from] BodyError),

    /// Stage 3.
    #[error("missing required {location} parameter '{name}'")]
    MissingParameter {
        /// Parameter name.
        name: String,
        /// Where it was expected.
        location: ParameterLocation,
    },
}

impl ValidationFailure {
    /// Which class of failure this is.
    pub fn status_hint(&self) -> StatusHint {
        match self {
            Self::Unauthorized => StatusHint::Unauthorized,
            Self::Body(BodyError::ContentTypeRequired { .. } | BodyError::UnsupportedMediaType { .. }) => {
                StatusHint::UnsupportedMediaType
            }
            Self::Body(_) | Self::MissingParameter { .. } => StatusHint::BadRequest,
        }
    }
}

/// Validate `request` against `operation`.
///
/// # Errors
///
/// Returns the first failing stage as a [`ValidationFailure`].
pub fn validate(
    document: &ApiDocument,
    operation: &Operation,
    request: &InboundRequest,
) -> Result<Option<Value>, ValidationFailure> {
    let requirements = effective_requirements(document, operation);
    if !is_satisfied(request, requirements, &document.security_schemes) {
        tracing::warn!(
            component = "VALIDATOR",
            method = %request.method,
            path = %request.path,
            alternatives = requirements.len(),
            "security requirements not satisfied"
        );
        return Err(ValidationFailure::Unauthorized);
    }

    let mut body = None;
    if request.method.carries_body() {
        body = validate_body(
            operation.request_body.as_ref(),
            request.content_type(),
            &request.body,
        )
        .map_err(|err| {
            match &err {
                BodyError::Violations(violations) => {
                    for v in violations {
                        tracing::warn!(
                            component = "VALIDATOR",
                            path = %request.path,
                            field = %v.field,
                            "{}",
                            v.message
                        );
                    }
                }
                other => {
                    tracing::warn!(component = "NEGOTIATOR", path = %request.path, error = %other, "body rejected");
                }
            }
            ValidationFailure::Body(err)
        })?;
    }

    if let Some(missing) = operation
        .parameters
        .iter()
        .find(|p| p.required && !request.has_value(p.location, &p.name))
    {
        tracing::warn!(
            component = "VALIDATOR",
            path = %request.path,
            parameter = %missing.name,
            location = %missing.location,
            "required parameter missing"
        );
        return Err(ValidationFailure::MissingParameter {
            name: missing.name.clone(),
            location: missing.location,
        });
    }

    tracing::debug!(component = "VALIDATOR", path = %request.path, "request valid");
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockapi_core::{
        ApiKeyLocation, HttpMethod, MediaType, Parameter, RequestBody, Schema, SchemaType,
        SecurityRequirement, SecurityScheme,
    };
    use serde_json::json;

    fn secured_doc() -> ApiDocument {
        ApiDocument {
            security: Some(vec![SecurityRequirement::from([("key", vec![])])]),
            security_schemes: [(
                "key".to_string(),
                SecurityScheme::ApiKey {
                    name: "X-Key".into(),
                    location: ApiKeyLocation::Header,
                },
            )]
            .into_iter()
            .collect(),
            ..ApiDocument::default()
        }
    }

    fn create_user() -> Operation {
        let schema = Schema {
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
        };
        Operation {
            method: HttpMethod::Post,
            path: "/users".into(),
            operation_id: Some("createUser".into()),
            parameters: vec![Parameter {
                name: "tenant".into(),
                location: ParameterLocation::Query,
                required: true,
                schema: None,
            }],
            request_body: Some(RequestBody {
                required: true,
                content: [(
                    "application/json".to_string(),
                    MediaType {
                        schema: Some(schema),
                    },
                )]
                .into_iter()
                .collect(),
            }),
            security: None,
        }
    }

    fn post(body: &'static str) -> InboundRequest {
        InboundRequest::new(HttpMethod::Post, "/users").with_body("application/json", body)
    }

    #[test]
    fn security_runs_before_body() {
        let err = validate(&secured_doc(), &create_user(), &post("not json")).unwrap_err();
        assert_eq!(err, ValidationFailure::Unauthorized);
        assert_eq!(err.status_hint(), StatusHint::Unauthorized);
    }

    #[test]
    fn body_runs_before_parameters() {
        let req = post("{}").with_header("X-Key", "k");
        let err = validate(&secured_doc(), &create_user(), &req).unwrap_err();
        match err {
            ValidationFailure::Body(BodyError::Violations(v)) => assert_eq!(v.len(), 1),
            other => panic!("expected violations, got {other:?}"),
        }
    }

    #[test]
    fn missing_parameter_is_reported_last() {
        let req = post(r#"{"name":"abc"}"#).with_header("X-Key", "k");
        let err = validate(&secured_doc(), &create_user(), &req).unwrap_err();
        assert_eq!(err.to_string(), "missing required query parameter 'tenant'");
        assert_eq!(err.status_hint(), StatusHint::BadRequest);
    }

    #[test]
    fn valid_request_returns_decoded_body() {
        let req = post(r#"{"name":"abc"}"#)
            .with_header("X-Key", "k")
            .with_query("tenant=acme");
        let body = validate(&secured_doc(), &create_user(), &req).unwrap();
        assert_eq!(body, Some(json!({"name": "abc"})));
    }

    #[test]
    fn unsupported_media_type_hint() {
        let req = InboundRequest::new(HttpMethod::Post, "/users")
            .with_body("text/plain", "abc")
            .with_query("tenant=acme");
        let err = validate(&ApiDocument::default(), &create_user(), &req).unwrap_err();
        assert_eq!(err.status_hint(), StatusHint::UnsupportedMediaType);
    }

    #[test]
    fn body_is_not_checked_for_get() {
        let mut op = create_user();
        op.method = HttpMethod::Get;
        let req = InboundRequest::new(HttpMethod::Get, "/users").with_query("tenant=acme");
        assert_eq!(validate(&ApiDocument::default(), &op, &req), Ok(None));
    }

    #[test]
    fn operation_without_security_passes_without_headers() {
        let mut op = create_user();
        op.security = Some(vec![]);
        let req = post(r#"{"name":"abc"}"#).with_query("tenant=acme");
        assert!(validate(&secured_doc(), &op, &req).is_ok());
    }
}
