//! # mockapi-schema — Request Body Validation
//!
//! Everything between "the request carries these bytes" and "the body is
//! acceptable for this operation":
//!
//! - [`resolve`] flattens a schema and its `allOf` / `oneOf` / `anyOf`
//!   children into one required list and one property map.
//! - [`validate_property`] checks a single decoded value against a single
//!   property schema.
//! - [`validate_body`] negotiates the content type against the declared
//!   media types, decodes the bytes, and collects every violation.
//!
//! This is deliberately not a general JSON Schema validator. The supported
//! keywords are `required`, `type`, `nullable`, `minLength`, `maxLength`,
//! `enum`, `minItems` and the three composition operators.
//!
//! All functions are pure: they read the immutable description model from
//! `mockapi-core` and never touch shared state.

pub mod body;
pub mod error;
pub mod property;
pub mod resolve;

pub use body::{decode_form, match_media_type, validate_body, FORM_MEDIA_TYPE};
pub use error::{BodyError, Violation};
pub use property::validate_property;
pub use resolve::{resolve, ResolvedConstraints};
