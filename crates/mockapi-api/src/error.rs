//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Validation failures, lookup misses and unsupported operations all map
//! to a status code and a JSON body of the form
//! `{"error": {"code", "message", "details?"}}`.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use mockapi_core::HttpMethod;
use mockapi_schema::{BodyError, Violation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::ValidationFailure;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. "NOT_FOUND", "BAD_REQUEST").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Per-field violations, present only for body validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// No route, or no record with the requested id (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed request: missing body or parameter, undecodable body (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Body decoded but broke the schema. Every violation is reported (400).
    #[error("request body failed validation")]
    Validation(Vec<Violation>),

    /// No security requirement alternative is satisfied (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The path exists but does not declare this method (405).
    #[error("method not allowed; allowed: {}", join_methods(.allowed))]
    MethodNotAllowed {
        /// Methods the path declares.
        allowed: Vec<HttpMethod>,
    },

    /// Missing or undeclared content type (415).
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// The operation exists but the mock has no behavior for it (501).
    #[error("not implemented: {0}")]
    NotImplemented(String),
}

fn join_methods(methods: &[HttpMethod]) -> String {
    methods
        .iter()
        .map(HttpMethod::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::BadRequest(_) | Self::Validation(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::MethodNotAllowed { .. } => (StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED"),
            Self::UnsupportedMediaType(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_MEDIA_TYPE")
            }
            Self::NotImplemented(_) => (StatusCode::NOT_IMPLEMENTED, "NOT_IMPLEMENTED"),
        }
    }

    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        self.status_and_code().0
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.to_string();

        let details = match &self {
            Self::Validation(violations) => serde_json::to_value(violations).ok(),
            _ => None,
        };

        let allow = match &self {
            Self::MethodNotAllowed { allowed } => HeaderValue::from_str(&join_methods(allowed)).ok(),
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(allow) = allow {
            response.headers_mut().insert(header::ALLOW, allow);
        }
        response
    }
}

impl From<ValidationFailure> for AppError {
    fn from(failure: ValidationFailure) -> Self {
        match failure {
            ValidationFailure::Unauthorized => Self::Unauthorized(failure.to_string()),
            ValidationFailure::Body(BodyError::Violations(violations)) => {
                Self::Validation(violations)
            }
            ValidationFailure::Body(
                err @ (BodyError::ContentTypeRequired { .. }
                | BodyError::UnsupportedMediaType { .. }),
            ) => Self::UnsupportedMediaType(err.to_string()),
            ValidationFailure::Body(err) => Self::BadRequest(err.to_string()),
            ValidationFailure::MissingParameter { .. } => Self::BadRequest(failure.to_string()),
        }
    }
}
