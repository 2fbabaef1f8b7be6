//! # Inbound Request View
//!
//! The validators need a request they can query by parameter location
//! without caring whether it came off the wire or was built in a test.
//! [`InboundRequest`] owns the method, path, headers, decoded query pairs,
//! captured path parameters and raw body bytes.

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Uri};
use axum_extra::extract::cookie::CookieJar;
use mockapi_core::{HttpMethod, ParameterLocation};

/// A request as seen by the validation pipeline and mock generator.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Request path, without the query string.
    pub path: String,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    path_params: BTreeMap<String, String>,
    /// Raw body bytes; empty when no body was sent.
    pub body: Bytes,
}

impl InboundRequest {
    /// An empty request for `method` on `path`.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            query: Vec::new(),
            path_params: BTreeMap::new(),
            body: Bytes::new(),
        }
    }

    /// Assemble a request from its HTTP pieces and the parameters captured
    /// by route matching.
    pub fn from_http(
        method: HttpMethod,
        uri: &Uri,
        headers: HeaderMap,
        body: Bytes,
        path_params: BTreeMap<String, String>,
    ) -> Self {
        Self {
            method,
            path: uri.path().to_string(),
            headers,
            query: uri.query().map(parse_query).unwrap_or_default(),
            path_params,
            body,
        }
    }

    /// Add a header. Invalid names or values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::from_str(value)) {
            self.headers.append(name, value);
        }
        self
    }

    /// Replace the query string (without the leading `?`).
    #[must_use]
    pub fn with_query(mut self, raw: &str) -> Self {
        self.query = parse_query(raw);
        self
    }

    /// Add a captured path parameter.
    #[must_use]
    pub fn with_path_param(mut self, name: &str, value: &str) -> Self {
        self.path_params.insert(name.to_string(), value.to_string());
        self
    }

    /// Set the body and its `Content-Type`.
    #[must_use]
    pub fn with_body(self, content_type: &str, body: impl Into<Bytes>) -> Self {
        let mut req = self.with_header(header::CONTENT_TYPE.as_str(), content_type);
        req.body = body.into();
        req
    }

    /// First value of header `name` (case-insensitive), if it is valid text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// First value of query parameter `name`.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Captured path parameter `name`.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    /// Value of cookie `name`.
    pub fn cookie(&self, name: &str) -> Option<String> {
        CookieJar::from_headers(&self.headers)
            .get(name)
            .map(|c| c.value().to_string())
    }

    /// `Content-Type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// Whether `name` carries a non-empty value at `location`.
    pub fn has_value(&self, location: ParameterLocation, name: &str) -> bool {
        match location {
            ParameterLocation::Query => self.query(name).is_some_and(|v| !v.is_empty()),
            ParameterLocation::Path => self.path_param(name).is_some_and(|v| !v.is_empty()),
            ParameterLocation::Header => self.header(name).is_some_and(|v| !v.is_empty()),
            ParameterLocation::Cookie => self.cookie(name).is_some_and(|v| !v.is_empty()),
        }
    }
}

fn parse_query(raw: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(raw.as_bytes())
        .into_owned()
        .collect()
}
