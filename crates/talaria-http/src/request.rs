//! Inbound request view handed to handlers.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::OnceLock;

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;

use talaria_router::Params;

/// An inbound HTTP request as seen by a handler.
///
/// The transport supplies method, URI, headers, and the collected body;
/// the dispatcher attaches the wildcard bindings of the specific route
/// that matched, so two handlers matched by fan-out each receive their
/// own view of the same request.
///
/// Derived data (query parameters, body decodings) is computed on demand.
/// Every accessor that can fail returns `Option`: callers check for
/// absence instead of handling errors.
///
/// # Example
///
/// ```rust
/// use talaria_http::Request;
/// use talaria_router::Params;
/// use http::{HeaderMap, Method, Uri};
/// use bytes::Bytes;
///
/// let mut wildcards = Params::new();
/// wildcards.push("id", "7");
///
/// let request = Request::new(
///     Method::GET,
///     Uri::from_static("/users/7?verbose=true"),
///     HeaderMap::new(),
///     Bytes::new(),
///     wildcards,
/// );
///
/// assert_eq!(request.path(), "/users/7");
/// assert_eq!(request.wildcard("id"), Some("7"));
/// assert_eq!(request.wildcard_parsed::<i64>("id"), Some(7));
/// assert_eq!(request.query_param("verbose"), Some("true"));
/// assert_eq!(request.query_param("missing"), None);
/// ```
#[derive(Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    wildcards: Params,
    query: OnceLock<HashMap<String, String>>,
}

impl Request {
    /// Creates a request view from transport-supplied parts and the
    /// matched route's wildcard bindings.
    #[must_use]
    pub fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
        wildcards: Params,
    ) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
            wildcards,
            query: OnceLock::new(),
        }
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path, without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the full request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the raw request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the wildcard bindings of the matched route.
    #[must_use]
    pub fn wildcards(&self) -> &Params {
        &self.wildcards
    }

    /// Returns the wildcard value bound to `name`.
    ///
    /// The value keeps the casing it had in the request path.
    #[must_use]
    pub fn wildcard(&self, name: &str) -> Option<&str> {
        self.wildcards.get(name)
    }

    /// Returns the wildcard value bound to `name`, parsed as `T`.
    ///
    /// `None` when the wildcard is missing or the value does not parse.
    #[must_use]
    pub fn wildcard_parsed<T: FromStr>(&self, name: &str) -> Option<T> {
        self.wildcards.get_parsed(name)
    }

    /// Returns the parsed query parameters.
    ///
    /// Parsed lazily from the query string on first access. A malformed
    /// query string yields an empty map.
    #[must_use]
    pub fn query_params(&self) -> &HashMap<String, String> {
        self.query.get_or_init(|| {
            let raw = self.uri.query().unwrap_or("");
            serde_urlencoded::from_str(raw).unwrap_or_else(|e| {
                tracing::debug!("failed to parse query string {raw:?}: {e}");
                HashMap::new()
            })
        })
    }

    /// Returns a single query parameter by name.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params().get(name).map(String::as_str)
    }

    /// Returns the body as UTF-8 text, or `None` if it is not valid
    /// UTF-8.
    #[must_use]
    pub fn body_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Parses the body as `application/x-www-form-urlencoded` pairs.
    ///
    /// Returns `None` when the body does not decode as a form.
    #[must_use]
    pub fn body_form(&self) -> Option<HashMap<String, String>> {
        serde_urlencoded::from_bytes(&self.body).ok()
    }

    /// Deserializes the body as JSON.
    ///
    /// Returns `None` on malformed JSON; the failure is logged, never
    /// surfaced as an error.
    #[must_use]
    pub fn body_json<T: DeserializeOwned>(&self) -> Option<T> {
        match serde_json::from_slice(&self.body) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("malformed JSON body: {e}");
                None
            }
        }
    }
}
