//! Route-level authentication requirements.
//!
//! A static ordered table evaluated top to bottom, first match wins. Only
//! answers "must this request carry a verified principal". Tier limits belong
//! to the services that read `Principal::tier`.

use axum::http::Method;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Anonymous,
    Authenticated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RoutePattern {
    Exact(String),
    /// `prefix/**`: the prefix itself and everything below it. Empty prefix matches all.
    Subtree(String),
}

impl RoutePattern {
    fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix("/**") {
            Some(prefix) => RoutePattern::Subtree(prefix.to_string()),
            None => RoutePattern::Exact(pattern.to_string()),
        }
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            RoutePattern::Exact(p) => path == p,
            RoutePattern::Subtree(prefix) => {
                path == prefix
                    || path
                        .strip_prefix(prefix.as_str())
                        .map(|rest| rest.starts_with('/'))
                        .unwrap_or(false)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouteRule {
    method: Option<Method>,
    pattern: RoutePattern,
    requirement: Requirement,
}

impl RouteRule {
    pub fn new(method: Option<Method>, pattern: &str, requirement: Requirement) -> Self {
        Self { method, pattern: RoutePattern::parse(pattern), requirement }
    }

    pub fn permit_all(pattern: &str) -> Self {
        Self::new(None, pattern, Requirement::Anonymous)
    }

    pub fn authenticated(pattern: &str) -> Self {
        Self::new(None, pattern, Requirement::Authenticated)
    }

    fn matches(&self, method: &Method, path: &str) -> bool {
        self.method.as_ref().map(|m| m == method).unwrap_or(true) && self.pattern.matches(path)
    }
}

#[derive(Debug, Clone)]
pub struct AuthorizationPolicy {
    rules: Vec<RouteRule>,
}

impl AuthorizationPolicy {
    pub fn new(rules: Vec<RouteRule>) -> Self { Self { rules } }

    /// Requirement for a request; unmatched requests require authentication.
    pub fn requirement_for(&self, method: &Method, path: &str) -> Requirement {
        self.rules
            .iter()
            .find(|r| r.matches(method, path))
            .map(|r| r.requirement)
            .unwrap_or(Requirement::Authenticated)
    }
}

impl Default for AuthorizationPolicy {
    fn default() -> Self {
        Self::new(vec![
            RouteRule::permit_all("/"),
            RouteRule::permit_all("/health"),
            RouteRule::permit_all("/api/auth/**"),
            RouteRule::authenticated("/**"),
        ])
    }
}
