//! Body validation outcomes.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// One failed rule on one field of a request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Property the rule applies to. Empty for whole-body violations.
    pub field: String,
    /// Human-readable description of the failure.
    pub message: String,
}

impl Violation {
    /// Build a violation for `field`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Why a request body was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BodyError {
    /// The operation requires a body and none was sent.
    #[error("request body is required")]
    BodyRequired,

    /// A body was sent without a `Content-Type` header.
    #[error("content type required; expected one of: {}", .allowed.join(", "))]
    ContentTypeRequired {
        /// Media types the operation declares.
        allowed: Vec<String>,
    },

    /// The `Content-Type` matches none of the declared media types.
    #[error("unsupported media type \"{content_type}\"; expected one of: {}", .allowed.join(", "))]
    UnsupportedMediaType {
        /// Base type the client sent.
        content_type: String,
        /// Media types the operation declares.
        allowed: Vec<String>,
    },

    /// The bytes could not be decoded as the negotiated media type.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// The body decoded but broke one or more schema rules.
    #[error("request body failed validation with {} violation(s)", .0.len())]
    Violations(Vec<Violation>),
}
