#![deny(missing_docs)]

//! # mockapi-core — API Description Model for the Mock Server
//!
//! This crate owns the immutable, in-memory view of an OpenAPI 3.x document
//! that every other crate in the workspace reads from. It has no internal
//! crate dependencies — only `serde`, `serde_json`, `serde_yaml` and
//! `thiserror` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Built once, read-only thereafter.** [`ApiDocument`] is constructed at
//!    startup by [`ApiDocument::from_path`] and shared behind an `Arc`. There
//!    is no process-wide mutable document state.
//!
//! 2. **References are resolved at load time.** Local `$ref` pointers are
//!    inlined before typed deserialization, so the [`Schema`] tree handed to
//!    the validators is finite and self-contained. Cyclic references are a
//!    load error, never a runtime loop.
//!
//! 3. **Path templates are compiled once.** [`PathTemplate`] performs
//!    segment-wise matching and parameter extraction for request dispatch.
//!
//! 4. **[`CoreError`] hierarchy.** Structured errors with `thiserror`.

pub mod document;
pub mod error;
pub mod loader;
pub mod model;
pub mod path;

pub use document::{ApiDocument, Route, RouteMatch};
pub use error::CoreError;
pub use model::{
    ApiKeyLocation, HttpMethod, MediaType, Operation, Parameter, ParameterLocation, RequestBody,
    Schema, SchemaType, SecurityRequirement, SecurityScheme,
};
pub use path::{resource_name, PathTemplate};
