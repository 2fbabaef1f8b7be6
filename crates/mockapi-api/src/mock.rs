//! # Mock Response Generator
//!
//! Turns a validated request into a CRUD call on the resource store.
//!
//! The resource is the first segment of the request path. The record
//! identifier is the value captured by the template's final segment, when
//! that segment is a `{param}`; an identifier that is not a positive
//! integer never matches a record.
//!
//! | Method          | With identifier        | Without identifier |
//! |-----------------|------------------------|--------------------|
//! | `GET`           | 200 record / 404       | 200 full list      |
//! | `POST`          | 201 created record     | 201 created record |
//! | `PUT` / `PATCH` | 200 merged record / 404| 501                |
//! | `DELETE`        | 204 / 404              | 501                |
//! | anything else   | 501                    | 501                |

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mockapi_core::{resource_name, HttpMethod, Route};
use mockapi_schema::{decode_form, FORM_MEDIA_TYPE};
use mockapi_store::{Record, ResourceStore};
use serde_json::Value;

use crate::error::AppError;
use crate::request::InboundRequest;

/// The record identifier a request addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Identifier {
    /// The template has no trailing `{param}`.
    Absent,
    /// Trailing `{param}` holding a positive integer.
    Id(i64),
    /// Trailing `{param}` holding anything else.
    Invalid,
}

impl Identifier {
    fn of(route: &Route, request: &InboundRequest) -> Self {
        let Some(raw) = route
            .template
            .identifier_param()
            .and_then(|name| request.path_param(name))
        else {
            return Self::Absent;
        };
        match raw.parse::<i64>() {
            Ok(id) if id > 0 => Self::Id(id),
            _ => Self::Invalid,
        }
    }
}

/// Answer `request` from `store`.
///
/// `validated` is the body the validation pipeline already decoded, if any.
///
/// # Errors
///
/// [`AppError::NotFound`] for missing records, [`AppError::BadRequest`] for
/// bodies that are not JSON objects, and [`AppError::NotImplemented`] for
/// method/identifier combinations the table above leaves out.
pub fn respond(
    store: &ResourceStore,
    route: &Route,
    request: &InboundRequest,
    validated: Option<Value>,
) -> Result<Response, AppError> {
    let resource = resource_name(&request.path);
    let identifier = Identifier::of(route, request);
    let not_found = || AppError::NotFound(format!("no record at {}", request.path));

    match (request.method, identifier) {
        (HttpMethod::Get, Identifier::Absent) => Ok(Json(store.get(resource)).into_response()),
        (HttpMethod::Get, Identifier::Id(id)) => store
            .get_by_id(resource, id)
            .map(|record| Json(record).into_response())
            .ok_or_else(not_found),

        (HttpMethod::Post, _) => {
            let fields = body_object(validated, request)?;
            let record = store.create(resource, fields);
            Ok((StatusCode::CREATED, Json(record)).into_response())
        }

        (HttpMethod::Put | HttpMethod::Patch, Identifier::Id(id)) => {
            let patch = body_object(validated, request)?;
            store
                .update(resource, id, patch)
                .map(|record| Json(record).into_response())
                .ok_or_else(not_found)
        }

        (HttpMethod::Delete, Identifier::Id(id)) => {
            if store.delete(resource, id) {
                Ok(StatusCode::NO_CONTENT.into_response())
            } else {
                Err(not_found())
            }
        }

        (HttpMethod::Get | HttpMethod::Put | HttpMethod::Patch | HttpMethod::Delete, Identifier::Invalid) => {
            Err(not_found())
        }

        (method, _) => Err(AppError::NotImplemented(format!(
            "{method} {} has no mock behavior",
            route.template.as_str()
        ))),
    }
}

/// The request body as a record. Empty bodies are empty records.
fn body_object(validated: Option<Value>, request: &InboundRequest) -> Result<Record, AppError> {
    let value = match validated {
        Some(value) => value,
        None if request.body.is_empty() => return Ok(Record::new()),
        None => decode_unvalidated(request)?,
    };
    match value {
        Value::Object(fields) => Ok(fields),
        _ => Err(AppError::BadRequest(
            "request body must be a JSON object".into(),
        )),
    }
}

/// Bodies no schema looked at: form-encoded if declared so, JSON otherwise.
fn decode_unvalidated(request: &InboundRequest) -> Result<Value, AppError> {
    let is_form = request
        .content_type()
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|base| base.trim().eq_ignore_ascii_case(FORM_MEDIA_TYPE));
    if is_form {
        return Ok(decode_form(&request.body, &BTreeMap::new()));
    }
    serde_json::from_slice(&request.body)
        .map_err(|e| AppError::BadRequest(format!("invalid body: {e}")))
}
