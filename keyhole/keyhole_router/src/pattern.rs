//! Route patterns.
//!
//! A pattern is a `/`-separated list of segments. A segment is a literal,
//! a `:name` parameter matching exactly one path segment, or a trailing
//! `*name` splat matching the remainder of the path (possibly empty).

use keyhole_core::error::RouteError;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Splat(String),
}

/// A compiled route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    source: String,
    segments: Vec<Segment>,
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

impl RoutePattern {
    /// Compile a pattern.
    ///
    /// # Errors
    ///
    /// `RouteError::InvalidPattern` for an unnamed parameter, a splat that
    /// is not the last segment, or a parameter name used twice.
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let raw: Vec<&str> = split(pattern).collect();
        let mut segments = Vec::with_capacity(raw.len());
        for (i, segment) in raw.iter().enumerate() {
            let compiled = if let Some(name) = segment.strip_prefix(':') {
                if name.is_empty() {
                    return Err(invalid("parameter has no name"));
                }
                Segment::Param(name.to_string())
            } else if let Some(name) = segment.strip_prefix('*') {
                if i + 1 != raw.len() {
                    return Err(invalid("splat must be the last segment"));
                }
                Segment::Splat(if name.is_empty() { "splat" } else { name }.to_string())
            } else {
                Segment::Literal(segment.to_string())
            };

            if let Segment::Param(name) | Segment::Splat(name) = &compiled {
                let taken = segments.iter().any(|existing| {
                    matches!(existing, Segment::Param(n) | Segment::Splat(n) if n == name)
                });
                if taken {
                    return Err(invalid("parameter name used twice"));
                }
            }
            segments.push(compiled);
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match `path`, returning the captured parameters.
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let parts: Vec<&str> = split(path).collect();
        let mut params = BTreeMap::new();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Splat(name) => {
                    params.insert(name.clone(), parts.get(i..).unwrap_or_default().join("/"));
                    return Some(params);
                }
                Segment::Literal(literal) => {
                    if parts.get(i) != Some(&literal.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.insert(name.clone(), (*parts.get(i)?).to_string());
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(params)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_match() {
        let pattern = RoutePattern::parse("admin/dashboard").unwrap();
        assert!(pattern.matches("/admin/dashboard").is_some());
        assert!(pattern.matches("admin/dashboard/").is_some());
        assert!(pattern.matches("admin").is_none());
        assert!(pattern.matches("admin/dashboard/extra").is_none());
    }

    #[test]
    fn test_params_and_splat() {
        let pattern = RoutePattern::parse("users/:id/files/*path").unwrap();
        let params = pattern.matches("users/42/files/a/b.txt?x=1").unwrap();
        assert_eq!(params["id"], "42");
        assert_eq!(params["path"], "a/b.txt");

        let params = pattern.matches("users/42/files").unwrap();
        assert_eq!(params["path"], "");
        assert!(pattern.matches("users").is_none());
    }

    #[test]
    fn test_root_pattern() {
        let pattern = RoutePattern::parse("").unwrap();
        assert!(pattern.matches("/").is_some());
        assert!(pattern.matches("home").is_none());
    }

    #[test]
    fn test_invalid_patterns() {
        for pattern in ["users/:", "*rest/more", "a/:id/b/:id"] {
            assert!(matches!(
                RoutePattern::parse(pattern),
                Err(RouteError::InvalidPattern { .. })
            ));
        }
    }
}
