//! # Path Templates
//!
//! Compiled form of an OpenAPI path key such as `/users/{id}/posts`.
//! Matching is segment-wise: a request path matches when it has the same
//! number of segments and every literal segment is equal. `{name}` segments
//! match any single non-empty segment and capture it.

use std::collections::BTreeMap;

use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled OpenAPI path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Compile a path key.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPathTemplate`] if the key does not start
    /// with `/`, or a `{...}` segment has an empty or unbalanced name.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let invalid = |reason: &str| CoreError::InvalidPathTemplate {
            template: raw.to_string(),
            reason: reason.to_string(),
        };

        if !raw.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let mut segments = Vec::new();
        for seg in split_segments(raw) {
            if let Some(inner) = seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                if inner.is_empty() || inner.contains(['{', '}']) {
                    return Err(invalid("parameter segment needs a name"));
                }
                segments.push(Segment::Param(inner.to_string()));
            } else if seg.contains(['{', '}']) {
                return Err(invalid("parameters must span a whole segment"));
            } else {
                segments.push(Segment::Literal(seg.to_string()));
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The template exactly as written in the document.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Number of literal segments. Higher means more specific.
    pub fn literal_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count()
    }

    /// Ordering key: at the first position where two same-length templates
    /// differ, a literal segment sorts before a parameter.
    pub(crate) fn specificity(&self) -> Vec<bool> {
        self.segments
            .iter()
            .map(|s| matches!(s, Segment::Param(_)))
            .collect()
    }

    /// Name of the parameter in the final segment, if the template ends
    /// with one. This is the record identifier for CRUD routes.
    pub fn identifier_param(&self) -> Option<&str> {
        match self.segments.last() {
            Some(Segment::Param(name)) => Some(name),
            _ => None,
        }
    }

    /// First segment when it is a literal: the resource this template
    /// addresses, known before any request arrives.
    pub fn static_resource(&self) -> Option<&str> {
        match self.segments.first() {
            Some(Segment::Literal(name)) => Some(name),
            _ => None,
        }
    }

    /// Match a request path, returning captured parameters on success.
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let mut params = BTreeMap::new();
        let mut request = split_segments(path);

        for segment in &self.segments {
            let actual = request.next()?;
            match segment {
                Segment::Literal(lit) => {
                    if lit != actual {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.insert(name.clone(), actual.to_string());
                }
            }
        }

        if request.next().is_some() {
            return None;
        }
        Some(params)
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.trim_matches('/').split('/').filter(|s| !s.is_empty())
}

/// Resource name for a request path: its first segment, slashes trimmed.
///
/// No normalization beyond segment splitting: `/Users/1` names `Users`.
/// The root path names the empty resource.
pub fn resource_name(path: &str) -> &str {
    split_segments(path).next().unwrap_or("")
}
