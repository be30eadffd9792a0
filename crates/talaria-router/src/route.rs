//! Route templates and segment-wise pattern matching.
//!
//! A [`RouteTemplate`] pairs a path pattern with an HTTP method and the
//! opaque identity of the handler that owns it. Matching is pure: the
//! template never changes after registration, and a match decision
//! depends only on the template and the concrete request.
//!
//! Templates are NOT validated at registration. A segment with unbalanced
//! braces (`{foo` or `foo}`) is classified as malformed when a request is
//! matched against it and simply never matches, leaving the route
//! unreachable for that path shape.

use http::Method;

use crate::params::Params;

/// Opaque identity of the handler owning a route.
///
/// The router stores and compares handler IDs but never interprets them;
/// the dispatcher maps them back to invokable handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(usize);

impl HandlerId {
    /// Creates a handler ID from a dispatcher slot index.
    #[must_use]
    pub fn new(slot: usize) -> Self {
        Self(slot)
    }

    /// Returns the dispatcher slot index.
    #[must_use]
    pub fn slot(self) -> usize {
        self.0
    }
}

/// How a single pattern segment participates in matching.
enum Segment<'a> {
    /// Must equal the path segment (case-insensitively).
    Literal(&'a str),
    /// Binds any non-empty path segment under the given name.
    Wildcard(&'a str),
    /// Unbalanced braces; the route never matches.
    Malformed,
}

fn classify(segment: &str) -> Segment<'_> {
    if !segment.contains('{') && !segment.contains('}') {
        Segment::Literal(segment)
    } else if segment.len() >= 2 && segment.starts_with('{') && segment.ends_with('}') {
        Segment::Wildcard(&segment[1..segment.len() - 1])
    } else {
        Segment::Malformed
    }
}

/// Splits a pattern or path into segments.
///
/// A single leading `/` is stripped before splitting, so `"/users/7"`,
/// and `"users/7"` produce the same segments. The empty string yields a
/// single empty segment, which is what lets the root pattern `""` match
/// `GET /` as a literal instead of colliding with wildcard routes.
fn segments(value: &str) -> std::str::Split<'_, char> {
    value.strip_prefix('/').unwrap_or(value).split('/')
}

/// An immutable route descriptor: path pattern, HTTP method, and owning
/// handler identity.
///
/// Created during registration and alive for the process lifetime.
///
/// # Example
///
/// ```rust
/// use talaria_router::{HandlerId, RouteTemplate};
/// use http::Method;
///
/// let route = RouteTemplate::new(Method::GET, "users/{id}", HandlerId::new(0));
///
/// assert!(route.matches(&Method::GET, "/users/7"));
/// assert!(route.matches(&Method::GET, "/USERS/7"));
/// assert!(!route.matches(&Method::POST, "/users/7"));
/// assert!(!route.matches(&Method::GET, "/users"));
///
/// let bindings = route.bind("/users/7");
/// assert_eq!(bindings.get("id"), Some("7"));
/// ```
#[derive(Debug, Clone)]
pub struct RouteTemplate {
    method: Method,
    pattern: String,
    handler: HandlerId,
}

impl RouteTemplate {
    /// Creates a new route template.
    ///
    /// The pattern is stored as given; a leading `/` is tolerated and
    /// stripped during matching. No well-formedness check happens here.
    #[must_use]
    pub fn new(method: Method, pattern: impl Into<String>, handler: HandlerId) -> Self {
        Self {
            method,
            pattern: pattern.into(),
            handler,
        }
    }

    /// Returns the HTTP method for this route.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the raw path pattern as registered.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the owning handler identity.
    #[must_use]
    pub fn handler(&self) -> HandlerId {
        self.handler
    }

    /// Decides whether a concrete request matches this route.
    ///
    /// Method comparison is a case-insensitive string match. Path
    /// comparison is segment-wise and case-insensitive; wildcard segments
    /// accept any single non-empty path segment. A malformed template
    /// segment makes the whole route fail to match, indistinguishable
    /// from an ordinary non-match.
    #[must_use]
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        if !self.method.as_str().eq_ignore_ascii_case(method.as_str()) {
            return false;
        }

        let pattern_segments: Vec<&str> = segments(&self.pattern).collect();
        let path_segments: Vec<&str> = segments(path).collect();

        // No variable-length wildcards or trailing catch-alls.
        if pattern_segments.len() != path_segments.len() {
            return false;
        }

        for (pattern, actual) in pattern_segments.iter().zip(&path_segments) {
            match classify(pattern) {
                Segment::Literal(expected) => {
                    if !expected.eq_ignore_ascii_case(actual) {
                        return false;
                    }
                }
                Segment::Wildcard(_) => {
                    if actual.is_empty() {
                        return false;
                    }
                }
                Segment::Malformed => return false,
            }
        }

        true
    }

    /// Extracts wildcard bindings from a path that matched this route.
    ///
    /// For every well-formed `{name}` segment, binds `name` (braces
    /// stripped) to the corresponding request segment. Bound values keep
    /// the request's original casing even though matching is
    /// case-insensitive.
    #[must_use]
    pub fn bind(&self, path: &str) -> Params {
        let mut params = Params::new();
        for (pattern, actual) in segments(&self.pattern).zip(segments(path)) {
            if let Segment::Wildcard(name) = classify(pattern) {
                params.push(name, actual);
            }
        }
        params
    }

    /// Returns the pattern normalized for duplicate comparison: a
    /// trailing `/` is appended when absent, but never to an empty
    /// pattern.
    pub(crate) fn normalized_pattern(&self) -> std::borrow::Cow<'_, str> {
        if self.pattern.is_empty() || self.pattern.ends_with('/') {
            std::borrow::Cow::Borrowed(&self.pattern)
        } else {
            std::borrow::Cow::Owned(format!("{}/", self.pattern))
        }
    }
}
