//! # Request Dispatch
//!
//! The single fallback handler behind every documented path. Route matching
//! is done against the compiled templates of the loaded document rather
//! than by registering one axum route per template, so any set of path keys
//! the document declares is servable.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use mockapi_core::{HttpMethod, RouteMatch};

use crate::error::AppError;
use crate::mock;
use crate::request::InboundRequest;
use crate::state::AppState;
use crate::validation::validate;

/// Match, validate and answer one request.
pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    tracing::info!(
        component = "HTTP SERVER",
        method = %method,
        path = %uri.path(),
        "request received"
    );

    let response = match handle(&state, &method, &uri, headers, body) {
        Ok(response) => response,
        Err(err) => err.into_response(),
    };

    tracing::info!(
        component = "HTTP SERVER",
        method = %method,
        path = %uri.path(),
        status = response.status().as_u16(),
        "response sent"
    );
    response
}

fn handle(
    state: &AppState,
    method: &Method,
    uri: &Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let Some(method) = HttpMethod::parse(method.as_str()) else {
        return Err(AppError::NotImplemented(format!("method {method} is not supported")));
    };

    let (route, operation, path_params) = match state.document.find(method, uri.path()) {
        RouteMatch::Found {
            route,
            operation,
            path_params,
        } => (route, operation, path_params),
        RouteMatch::MethodNotAllowed { allowed } => {
            return Err(AppError::MethodNotAllowed { allowed });
        }
        RouteMatch::NotFound => {
            return Err(AppError::NotFound(format!("no route for {}", uri.path())));
        }
    };

    let request = InboundRequest::from_http(method, uri, headers, body, path_params);
    let validated = validate(&state.document, operation, &request)?;
    mock::respond(&state.store, route, &request, validated)
}
