//! Handler registration types.
//!
//! Route discovery is explicit and static: a handler source implements
//! [`RouteSet`] and returns the `(method, pattern, handler)` triples it
//! wants registered. There is no runtime introspection; whatever the
//! source returns is the flattened, registration-ordered contribution of
//! that source.
//!
//! # Example
//!
//! ```rust
//! use talaria_server::{HandlerError, RouteDef, RouteSet};
//! use talaria_http::{Request, ResponseSink};
//! use http::Method;
//!
//! struct UserRoutes;
//!
//! impl RouteSet for UserRoutes {
//!     fn routes(&self) -> Vec<RouteDef> {
//!         vec![
//!             RouteDef::new(Method::GET, "users/{id}", get_user),
//!             RouteDef::new(Method::POST, "users", create_user),
//!         ]
//!     }
//! }
//!
//! async fn get_user(req: Request, res: ResponseSink) -> Result<(), HandlerError> {
//!     match req.wildcard_parsed::<u64>("id") {
//!         Some(id) => res.send_text(format!("user {id}")),
//!         None => res.set_status(http::StatusCode::BAD_REQUEST).send_text("bad id"),
//!     }
//!     Ok(())
//! }
//!
//! async fn create_user(_req: Request, res: ResponseSink) -> Result<(), HandlerError> {
//!     res.send_empty();
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::Method;
use thiserror::Error;

use talaria_http::{Request, ResponseSink};

/// Boxed future returned by a type-erased handler.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), HandlerError>> + Send>>;

/// A type-erased route handler.
///
/// Handlers receive the request view (carrying the wildcard bindings of
/// the route that matched) and a clone of the shared response sink.
pub type RouteHandler = Arc<dyn Fn(Request, ResponseSink) -> HandlerFuture + Send + Sync>;

/// Failure raised by a handler.
///
/// Errors never escape the dispatch boundary: the dispatcher logs them
/// and the serving loop carries on.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Response serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An I/O operation inside the handler failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other handler failure.
    #[error("handler error: {0}")]
    Custom(Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    /// Wraps an arbitrary error as a handler failure.
    pub fn custom(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Custom(Box::new(err))
    }

    /// Creates a handler failure from a message.
    pub fn message(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into().into())
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// A route contributed by a [`RouteSet`]: path pattern, HTTP method, and
/// the handler to invoke on a match.
pub struct RouteDef {
    method: Method,
    pattern: String,
    handler: RouteHandler,
}

impl RouteDef {
    /// Creates a route definition from an async handler function.
    pub fn new<F, Fut>(method: Method, pattern: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Request, ResponseSink) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: RouteHandler = Arc::new(move |req, sink| {
            let handler = Arc::clone(&handler);
            Box::pin(async move { handler(req, sink).await })
        });

        Self {
            method,
            pattern: pattern.into(),
            handler: erased,
        }
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Decomposes the definition for registration.
    #[must_use]
    pub(crate) fn into_parts(self) -> (Method, String, RouteHandler) {
        (self.method, self.pattern, self.handler)
    }
}

impl std::fmt::Debug for RouteDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteDef")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

/// A source of route definitions.
///
/// Implemented by handler types; the dispatcher builder consumes the
/// returned definitions during the registration phase.
pub trait RouteSet {
    /// Returns the routes this source contributes, in registration order.
    fn routes(&self) -> Vec<RouteDef>;
}
