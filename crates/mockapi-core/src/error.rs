//! # Error Hierarchy
//!
//! Structured error types for loading and compiling an API description,
//! built with `thiserror`. Every variant carries enough context for an
//! operator to locate the offending part of the document.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading an API description.
///
/// All of these are startup errors: once an [`ApiDocument`](crate::ApiDocument)
/// exists, nothing in this crate can fail.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The description file could not be read.
    #[error("failed to read API description {}: {source}", path.display())]
    Read {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The description is not well-formed YAML or JSON.
    #[error("failed to parse API description: {0}")]
    Parse(String),

    /// The description parsed but violates a structural rule.
    #[error("invalid API description: {0}")]
    InvalidDocument(String),

    /// A local `$ref` points at nothing.
    #[error("unresolvable reference \"{0}\"")]
    UnresolvedReference(String),

    /// A `$ref` points outside the document.
    #[error("external reference \"{0}\" is not supported; only local \"#/...\" references are")]
    ExternalReference(String),

    /// Following `$ref` pointers leads back to a reference already being
    /// expanded.
    #[error("cyclic reference through \"{0}\"")]
    CyclicReference(String),

    /// A path key is not a usable template.
    #[error("invalid path template \"{template}\": {reason}")]
    InvalidPathTemplate {
        /// The offending path key.
        template: String,
        /// Why it was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_error_names_the_path() {
        let err = CoreError::Read {
            path: PathBuf::from("/tmp/api.yaml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/api.yaml"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn cyclic_reference_display() {
        let err = CoreError::CyclicReference("#/components/schemas/Node".into());
        assert!(err.to_string().contains("#/components/schemas/Node"));
    }

    #[test]
    fn invalid_path_template_display() {
        let err = CoreError::InvalidPathTemplate {
            template: "users".into(),
            reason: "must start with '/'".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("users"));
        assert!(msg.contains("must start with"));
    }
}
