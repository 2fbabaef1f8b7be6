//! # API Document
//!
//! The immutable configuration object the server is built around: compiled
//! routes with their operations, the document-wide default security, and
//! the named security schemes. Construct it with
//! [`ApiDocument::from_path`](crate::ApiDocument::from_path) or
//! [`ApiDocument::parse`](crate::ApiDocument::parse) (see
//! [`crate::loader`]).

use std::collections::BTreeMap;

use crate::model::{HttpMethod, Operation, SecurityRequirement, SecurityScheme};
use crate::path::PathTemplate;

/// One path template and the operations declared on it.
#[derive(Debug, Clone)]
pub struct Route {
    /// Compiled template.
    pub template: PathTemplate,
    /// Operations by method.
    pub operations: BTreeMap<HttpMethod, Operation>,
}

impl Route {
    /// Methods declared on this path, sorted.
    pub fn methods(&self) -> Vec<HttpMethod> {
        self.operations.keys().copied().collect()
    }
}

/// Outcome of looking up a request against the document.
#[derive(Debug)]
pub enum RouteMatch<'a> {
    /// A path and method both matched.
    Found {
        /// Matched route.
        route: &'a Route,
        /// Operation for the request's method.
        operation: &'a Operation,
        /// Captured path parameters.
        path_params: BTreeMap<String, String>,
    },
    /// A path matched but declares no operation for the method.
    MethodNotAllowed {
        /// Methods the matched path does declare.
        allowed: Vec<HttpMethod>,
    },
    /// No path template matched.
    NotFound,
}

/// A loaded API description.
#[derive(Debug, Clone, Default)]
pub struct ApiDocument {
    /// `info.title`, when present.
    pub title: Option<String>,
    /// `info.version`, when present.
    pub version: Option<String>,
    /// Document-wide default security. `None` when the document declares
    /// none.
    pub security: Option<Vec<SecurityRequirement>>,
    /// Named schemes from `components.securitySchemes`.
    pub security_schemes: BTreeMap<String, SecurityScheme>,
    /// Routes ordered most specific first.
    pub routes: Vec<Route>,
}

impl ApiDocument {
    /// Find the operation answering `method` on `path`.
    ///
    /// Routes are kept sorted most-specific first, so the first template
    /// that matches is the one to use.
    pub fn find(&self, method: HttpMethod, path: &str) -> RouteMatch<'_> {
        let Some((route, path_params)) = self
            .routes
            .iter()
            .find_map(|r| r.template.matches(path).map(|p| (r, p)))
        else {
            return RouteMatch::NotFound;
        };

        match route.operations.get(&method) {
            Some(operation) => RouteMatch::Found {
                route,
                operation,
                path_params,
            },
            None => RouteMatch::MethodNotAllowed {
                allowed: route.methods(),
            },
        }
    }

    /// Resource names known before any request arrives: the literal first
    /// segment of every template, deduplicated and sorted.
    pub fn static_resources(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .routes
            .iter()
            .filter_map(|r| r.template.static_resource())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// `METHOD /path` for every declared operation, sorted.
    pub fn endpoints(&self) -> Vec<String> {
        let mut endpoints: Vec<String> = self
            .routes
            .iter()
            .flat_map(|r| {
                r.operations
                    .keys()
                    .map(move |m| format!("{} {}", m, r.template.as_str()))
            })
            .collect();
        endpoints.sort();
        endpoints
    }

    /// Total number of operations.
    pub fn operation_count(&self) -> usize {
        self.routes.iter().map(|r| r.operations.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(method: HttpMethod, path: &str) -> Operation {
        Operation {
            method,
            path: path.to_string(),
            operation_id: None,
            parameters: Vec::new(),
            request_body: None,
            security: None,
        }
    }

    fn route(path: &str, methods: &[HttpMethod]) -> Route {
        Route {
            template: PathTemplate::parse(path).unwrap(),
            operations: methods.iter().map(|m| (*m, op(*m, path))).collect(),
        }
    }

    fn doc() -> ApiDocument {
        ApiDocument {
            routes: vec![
                route("/users/me", &[HttpMethod::Get]),
                route("/users", &[HttpMethod::Get, HttpMethod::Post]),
                route("/users/{id}", &[HttpMethod::Get, HttpMethod::Delete]),
            ],
            ..ApiDocument::default()
        }
    }

    #[test]
    fn find_returns_operation_and_params() {
        let d = doc();
        match d.find(HttpMethod::Delete, "/users/9") {
            RouteMatch::Found {
                operation,
                path_params,
                ..
            } => {
                assert_eq!(operation.method, HttpMethod::Delete);
                assert_eq!(path_params["id"], "9");
            }
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[test]
    fn find_prefers_first_listed_specific_route() {
        let d = doc();
        match d.find(HttpMethod::Get, "/users/me") {
            RouteMatch::Found { route, .. } => assert_eq!(route.template.as_str(), "/users/me"),
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[test]
    fn find_reports_method_not_allowed() {
        let d = doc();
        match d.find(HttpMethod::Put, "/users") {
            RouteMatch::MethodNotAllowed { allowed } => {
                assert_eq!(allowed, vec![HttpMethod::Get, HttpMethod::Post]);
            }
            other => panic!("expected MethodNotAllowed, got {other:?}"),
        }
    }

    #[test]
    fn find_reports_not_found() {
        assert!(matches!(
            doc().find(HttpMethod::Get, "/orders"),
            RouteMatch::NotFound
        ));
    }

    #[test]
    fn endpoints_are_sorted_and_resources_deduplicated() {
        let d = doc();
        assert_eq!(
            d.endpoints(),
            vec![
                "DELETE /users/{id}",
                "GET /users",
                "GET /users/me",
                "GET /users/{id}",
                "POST /users",
            ]
        );
        assert_eq!(d.static_resources(), vec!["users"]);
        assert_eq!(d.operation_count(), 5);
    }
}
