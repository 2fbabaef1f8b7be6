//! # Security Evaluation
//!
//! Presence and format checks for declared security schemes. Nothing is
//! authenticated: a bearer token only has to look like one, an API key only
//! has to be there.
//!
//! ## Effective requirements
//!
//! An operation's own `security` list, when declared (even empty), replaces
//! the document default. Otherwise the document default applies. With
//! neither, every request passes.
//!
//! The list is a disjunction of alternatives; each alternative is a
//! conjunction of named schemes. An empty alternative is always satisfied.
//! A scheme name with no definition under `components.securitySchemes` is
//! never satisfied.

use std::collections::BTreeMap;

use mockapi_core::{ApiDocument, ApiKeyLocation, Operation, SecurityRequirement, SecurityScheme};

use crate::request::InboundRequest;

const BEARER_PREFIX: &str = "bearer ";

/// Requirements in force for `operation`.
pub fn effective_requirements<'a>(
    document: &'a ApiDocument,
    operation: &'a Operation,
) -> &'a [SecurityRequirement] {
    operation
        .security
        .as_deref()
        .or(document.security.as_deref())
        .unwrap_or_default()
}

/// Whether `request` satisfies at least one alternative of `requirements`.
pub fn is_satisfied(
    request: &InboundRequest,
    requirements: &[SecurityRequirement],
    schemes: &BTreeMap<String, SecurityScheme>,
) -> bool {
    if requirements.is_empty() {
        return true;
    }
    requirements.iter().any(|alternative| {
        alternative.scheme_names().all(|name| {
            schemes
                .get(name)
                .is_some_and(|scheme| scheme_satisfied(request, scheme))
        })
    })
}

/// Whether `request` carries the credential artifact `scheme` asks for.
pub fn scheme_satisfied(request: &InboundRequest, scheme: &SecurityScheme) -> bool {
    let authorization = request.header("authorization").filter(|v| !v.is_empty());

    match scheme {
        SecurityScheme::Http { .. } if scheme.is_bearer() => authorization
            .and_then(|v| v.get(..BEARER_PREFIX.len()))
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(BEARER_PREFIX)),
        SecurityScheme::Http { .. } | SecurityScheme::Other => authorization.is_some(),
        SecurityScheme::ApiKey { name, location } => match location {
            ApiKeyLocation::Header => request.header(name).is_some_and(|v| !v.is_empty()),
            ApiKeyLocation::Query => request.query(name).is_some_and(|v| !v.is_empty()),
            ApiKeyLocation::Cookie => request.cookie(name).is_some_and(|v| !v.is_empty()),
            ApiKeyLocation::Unknown => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockapi_core::HttpMethod;

    fn schemes() -> BTreeMap<String, SecurityScheme> {
        [
            (
                "bearer".to_string(),
                SecurityScheme::Http {
                    scheme: "bearer".into(),
                    bearer_format: Some("JWT".into()),
                },
            ),
            (
                "basic".to_string(),
                SecurityScheme::Http {
                    scheme: "basic".into(),
                    bearer_format: None,
                },
            ),
            (
                "headerKey".to_string(),
                SecurityScheme::ApiKey {
                    name: "X-Key".into(),
                    location: ApiKeyLocation::Header,
                },
            ),
            (
                "queryKey".to_string(),
                SecurityScheme::ApiKey {
                    name: "api_key".into(),
                    location: ApiKeyLocation::Query,
                },
            ),
            (
                "cookieKey".to_string(),
                SecurityScheme::ApiKey {
                    name: "sid".into(),
                    location: ApiKeyLocation::Cookie,
                },
            ),
            (
                "oddKey".to_string(),
                SecurityScheme::ApiKey {
                    name: "k".into(),
                    location: ApiKeyLocation::Unknown,
                },
            ),
            ("oauth".to_string(), SecurityScheme::Other),
        ]
        .into_iter()
        .collect()
    }

    fn req() -> InboundRequest {
        InboundRequest::new(HttpMethod::Get, "/things")
    }

    fn one(name: &str) -> Vec<SecurityRequirement> {
        vec![SecurityRequirement::from([(name, vec![])])]
    }

    fn operation(security: Option<Vec<SecurityRequirement>>) -> Operation {
        Operation {
            method: HttpMethod::Get,
            path: "/things".into(),
            operation_id: None,
            parameters: vec![],
            request_body: None,
            security,
        }
    }

    #[test]
    fn operation_override_replaces_document_default() {
        let doc = ApiDocument {
            security: Some(one("headerKey")),
            ..ApiDocument::default()
        };
        assert_eq!(effective_requirements(&doc, &operation(None)), one("headerKey").as_slice());
        assert!(effective_requirements(&doc, &operation(Some(vec![]))).is_empty());
        assert_eq!(
            effective_requirements(&doc, &operation(Some(one("bearer")))),
            one("bearer").as_slice()
        );
    }

    #[test]
    fn no_security_anywhere_means_no_check() {
        let doc = ApiDocument::default();
        let op = operation(None);
        let reqs = effective_requirements(&doc, &op);
        assert!(is_satisfied(&req(), reqs, &schemes()));
    }

    #[test]
    fn empty_alternative_always_passes() {
        let reqs = vec![SecurityRequirement::default()];
        assert!(is_satisfied(&req(), &reqs, &BTreeMap::new()));
    }

    #[test]
    fn api_key_header_presence() {
        let s = schemes();
        assert!(!is_satisfied(&req(), &one("headerKey"), &s));
        assert!(!is_satisfied(&req().with_header("X-Key", ""), &one("headerKey"), &s));
        assert!(is_satisfied(&req().with_header("x-key", "anything"), &one("headerKey"), &s));
    }

    #[test]
    fn api_key_query_and_cookie() {
        let s = schemes();
        assert!(is_satisfied(&req().with_query("api_key=1"), &one("queryKey"), &s));
        assert!(!is_satisfied(&req().with_header("api_key", "1"), &one("queryKey"), &s));
        assert!(is_satisfied(&req().with_header("Cookie", "sid=xyz"), &one("cookieKey"), &s));
        assert!(!is_satisfied(&req().with_query("sid=xyz"), &one("cookieKey"), &s));
    }

    #[test]
    fn unknown_api_key_location_never_passes() {
        let r = req().with_header("k", "v").with_query("k=v");
        assert!(!is_satisfied(&r, &one("oddKey"), &schemes()));
    }

    #[test]
    fn bearer_prefix_is_case_insensitive() {
        let s = schemes();
        assert!(is_satisfied(&req().with_header("Authorization", "Bearer abc"), &one("bearer"), &s));
        assert!(is_satisfied(&req().with_header("Authorization", "bEaReR abc"), &one("bearer"), &s));
        assert!(!is_satisfied(&req().with_header("Authorization", "Basic abc"), &one("bearer"), &s));
        assert!(!is_satisfied(&req().with_header("Authorization", "Bear"), &one("bearer"), &s));
        assert!(!is_satisfied(&req(), &one("bearer"), &s));
    }

    #[test]
    fn other_http_and_oauth_need_any_authorization() {
        let s = schemes();
        let authed = req().with_header("Authorization", "whatever");
        assert!(is_satisfied(&authed, &one("basic"), &s));
        assert!(is_satisfied(&authed, &one("oauth"), &s));
        assert!(!is_satisfied(&req(), &one("oauth"), &s));
    }

    #[test]
    fn alternatives_are_or_schemes_are_and() {
        let s = schemes();
        let both = vec![SecurityRequirement::from([
            ("headerKey", vec![]),
            ("queryKey", vec![]),
        ])];
        let only_header = req().with_header("X-Key", "k");
        assert!(!is_satisfied(&only_header, &both, &s));
        assert!(is_satisfied(&only_header.clone().with_query("api_key=q"), &both, &s));

        let either = vec![
            SecurityRequirement::from([("bearer", vec![])]),
            SecurityRequirement::from([("headerKey", vec![])]),
        ];
        assert!(is_satisfied(&only_header, &either, &s));
    }

    #[test]
    fn undefined_scheme_is_unsatisfied() {
        let r = req().with_header("Authorization", "Bearer x");
        assert!(!is_satisfied(&r, &one("ghost"), &schemes()));
    }
}
