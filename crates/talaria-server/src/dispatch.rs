//! Request dispatch over the frozen route table.
//!
//! Dispatch is a single linear pass over the table in registration
//! order. Under the default fan-out policy EVERY matching route is
//! invoked, not just the first: a literal route and a wildcard route of
//! the same shape both run against the same response sink, and the first
//! handler to write wins. This mirrors the framework's original
//! behavior; [`MatchPolicy::FirstMatchOnly`] is available for callers who
//! want conventional first-wins routing.
//!
//! Handler failures are contained here: an `Err` from a handler is
//! logged and the remaining matches (and the serving loop) carry on.

use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode, Uri};

use talaria_http::{Request, ResponseSink};
use talaria_router::{HandlerId, Params, RouteTable, RouteTableBuilder, RouteTemplate};

use crate::handler::{HandlerError, HandlerFuture, RouteHandler, RouteSet};

/// How many matching routes a single request may reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Invoke every matching route in table order (default).
    #[default]
    FanOutAll,

    /// Stop after the first matching route.
    FirstMatchOnly,
}

fn default_not_found() -> RouteHandler {
    Arc::new(|_req: Request, sink: ResponseSink| -> HandlerFuture {
        Box::pin(async move {
            sink.set_status(StatusCode::NOT_FOUND)
                .send_text("404. Route not found.");
            Ok(())
        })
    })
}

/// Accumulates handler sources during the registration phase.
///
/// Routes rejected as duplicates by the table keep their earlier
/// registration; the rejection is logged by the table, and the new
/// handler is simply dropped.
///
/// # Example
///
/// ```rust
/// use talaria_server::{DispatcherBuilder, HandlerError, RouteDef, RouteSet};
/// use talaria_http::{Request, ResponseSink};
/// use http::Method;
///
/// struct Health;
///
/// impl RouteSet for Health {
///     fn routes(&self) -> Vec<RouteDef> {
///         vec![RouteDef::new(Method::GET, "health", |_req: Request, res: ResponseSink| async move {
///             res.send_text("ok");
///             Ok::<(), HandlerError>(())
///         })]
///     }
/// }
///
/// let dispatcher = DispatcherBuilder::new().register(&Health).freeze();
/// assert_eq!(dispatcher.route_count(), 1);
/// ```
pub struct DispatcherBuilder {
    table: RouteTableBuilder,
    handlers: Vec<RouteHandler>,
    not_found: RouteHandler,
    policy: MatchPolicy,
}

impl DispatcherBuilder {
    /// Creates an empty builder with the default not-found handler and
    /// fan-out matching.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: RouteTableBuilder::new(),
            handlers: Vec::new(),
            not_found: default_not_found(),
            policy: MatchPolicy::default(),
        }
    }

    /// Registers every route contributed by a handler source.
    #[must_use]
    pub fn register(mut self, source: &dyn RouteSet) -> Self {
        for def in source.routes() {
            let (method, pattern, handler) = def.into_parts();
            let id = HandlerId::new(self.handlers.len());
            if self.table.add(RouteTemplate::new(method, pattern, id)) {
                self.handlers.push(handler);
            }
        }
        self
    }

    /// Replaces the not-found collaborator.
    ///
    /// The default sends status 404 with the body
    /// `"404. Route not found."`.
    #[must_use]
    pub fn not_found<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Request, ResponseSink) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        self.not_found = Arc::new(move |req, sink| {
            let handler = Arc::clone(&handler);
            Box::pin(async move { handler(req, sink).await })
        });
        self
    }

    /// Sets the match policy.
    #[must_use]
    pub fn match_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Ends the registration phase and produces the serving-time
    /// dispatcher.
    #[must_use]
    pub fn freeze(self) -> Dispatcher {
        Dispatcher {
            table: self.table.freeze(),
            handlers: self.handlers,
            not_found: self.not_found,
            policy: self.policy,
        }
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Routes one request to every matching handler.
///
/// Owned by the transport; read-only after [`DispatcherBuilder::freeze`],
/// so it can be shared across worker tasks without locking.
pub struct Dispatcher {
    table: RouteTable,
    handlers: Vec<RouteHandler>,
    not_found: RouteHandler,
    policy: MatchPolicy,
}

impl Dispatcher {
    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.table.len()
    }

    /// Returns the active match policy.
    #[must_use]
    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Dispatches one request against the route table.
    ///
    /// Every matching route (table order, subject to the match policy)
    /// receives its own [`Request`] view carrying that route's wildcard
    /// bindings, plus a clone of the shared sink. When nothing matches,
    /// the not-found collaborator runs exactly once.
    pub async fn dispatch(
        &self,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
        sink: ResponseSink,
    ) {
        let path = uri.path().to_string();
        let mut matched = false;

        for route in self.table.iter() {
            if !route.matches(&method, &path) {
                continue;
            }
            matched = true;

            let Some(handler) = self.handlers.get(route.handler().slot()) else {
                tracing::error!(
                    pattern = %route.pattern(),
                    "no handler slot for matched route"
                );
                continue;
            };

            let request = Request::new(
                method.clone(),
                uri.clone(),
                headers.clone(),
                body.clone(),
                route.bind(&path),
            );

            if let Err(e) = handler(request, sink.clone()).await {
                tracing::error!(
                    method = %method,
                    path = %path,
                    pattern = %route.pattern(),
                    error = %e,
                    "handler failed"
                );
            }

            if self.policy == MatchPolicy::FirstMatchOnly {
                break;
            }
        }

        if !matched {
            let request = Request::new(method, uri, headers, body, Params::new());
            if let Err(e) = (self.not_found)(request, sink).await {
                tracing::error!(error = %e, "not-found handler failed");
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.table.len())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::RouteDef;
    use std::sync::Mutex;

    /// Records which handlers ran, in order.
    #[derive(Clone, Default)]
    struct CallLog(Arc<Mutex<Vec<String>>>);

    impl CallLog {
        fn record(&self, entry: impl Into<String>) {
            self.0.lock().unwrap().push(entry.into());
        }

        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    struct TestRoutes {
        log: CallLog,
    }

    impl RouteSet for TestRoutes {
        fn routes(&self) -> Vec<RouteDef> {
            let health_log = self.log.clone();
            let page_log = self.log.clone();
            let user_log = self.log.clone();

            vec![
                RouteDef::new(Method::GET, "health", move |_req, res: ResponseSink| {
                    let log = health_log.clone();
                    async move {
                        log.record("health");
                        res.send_text("healthy");
                        Ok(())
                    }
                }),
                RouteDef::new(Method::GET, "{page}", move |req: Request, res: ResponseSink| {
                    let log = page_log.clone();
                    async move {
                        log.record(format!("page:{}", req.wildcard("page").unwrap_or("?")));
                        res.send_text("page");
                        Ok(())
                    }
                }),
                RouteDef::new(Method::GET, "users/{id}", move |req: Request, res: ResponseSink| {
                    let log = user_log.clone();
                    async move {
                        log.record("user");
                        match req.wildcard_parsed::<i32>("id") {
                            Some(id) => res.send_text(format!("user {id}")),
                            None => res.set_status(StatusCode::BAD_REQUEST).send_text("bad id"),
                        }
                        Ok(())
                    }
                }),
            ]
        }
    }

    fn dispatcher_with(log: &CallLog, policy: MatchPolicy) -> Dispatcher {
        DispatcherBuilder::new()
            .register(&TestRoutes { log: log.clone() })
            .match_policy(policy)
            .freeze()
    }

    async fn run(dispatcher: &Dispatcher, method: Method, uri: &'static str) -> ResponseSink {
        let sink = ResponseSink::new();
        dispatcher
            .dispatch(
                method,
                Uri::from_static(uri),
                HeaderMap::new(),
                Bytes::new(),
                sink.clone(),
            )
            .await;
        sink
    }

    #[tokio::test]
    async fn test_fan_out_invokes_all_matches_in_table_order() {
        let log = CallLog::default();
        let dispatcher = dispatcher_with(&log, MatchPolicy::FanOutAll);

        let sink = run(&dispatcher, Method::GET, "/health").await;

        // Both the literal and the wildcard route ran, literal first.
        assert_eq!(log.entries(), vec!["health", "page:health"]);

        // First writer wins the shared sink.
        let parts = sink.take().unwrap();
        assert_eq!(&parts.body[..], b"healthy");
    }

    #[tokio::test]
    async fn test_first_match_only_stops_after_first() {
        let log = CallLog::default();
        let dispatcher = dispatcher_with(&log, MatchPolicy::FirstMatchOnly);

        run(&dispatcher, Method::GET, "/health").await;

        assert_eq!(log.entries(), vec!["health"]);
    }

    #[tokio::test]
    async fn test_wildcard_binding_reaches_handler() {
        let log = CallLog::default();
        let dispatcher = dispatcher_with(&log, MatchPolicy::FanOutAll);

        let sink = run(&dispatcher, Method::GET, "/users/7").await;

        assert_eq!(log.entries(), vec!["user"]);
        let parts = sink.take().unwrap();
        assert_eq!(&parts.body[..], b"user 7");
    }

    #[tokio::test]
    async fn test_not_found_invoked_exactly_once() {
        let log = CallLog::default();
        let dispatcher = dispatcher_with(&log, MatchPolicy::FanOutAll);

        let sink = run(&dispatcher, Method::DELETE, "/unknown").await;

        assert!(log.entries().is_empty());
        let parts = sink.take().unwrap();
        assert_eq!(parts.status, StatusCode::NOT_FOUND);
        assert_eq!(&parts.body[..], b"404. Route not found.");
    }

    #[tokio::test]
    async fn test_custom_not_found_handler() {
        let dispatcher = DispatcherBuilder::new()
            .not_found(|_req, res: ResponseSink| async move {
                res.set_status(StatusCode::GONE).send_text("gone");
                Ok(())
            })
            .freeze();

        let sink = run(&dispatcher, Method::GET, "/missing").await;

        let parts = sink.take().unwrap();
        assert_eq!(parts.status, StatusCode::GONE);
        assert_eq!(&parts.body[..], b"gone");
    }

    #[tokio::test]
    async fn test_handler_error_is_contained() {
        struct Failing;

        impl RouteSet for Failing {
            fn routes(&self) -> Vec<RouteDef> {
                vec![
                    RouteDef::new(Method::GET, "boom", |_req, _res| async {
                        Err(HandlerError::message("deliberate failure"))
                    }),
                    RouteDef::new(Method::GET, "{page}", |_req, res: ResponseSink| async move {
                        res.send_text("fallback");
                        Ok(())
                    }),
                ]
            }
        }

        let dispatcher = DispatcherBuilder::new().register(&Failing).freeze();
        let sink = run(&dispatcher, Method::GET, "/boom").await;

        // The failing handler did not stop the fan-out; the second match
        // still wrote the response.
        let parts = sink.take().unwrap();
        assert_eq!(&parts.body[..], b"fallback");
    }

    #[tokio::test]
    async fn test_duplicate_registration_keeps_first() {
        struct First;
        struct Second;

        impl RouteSet for First {
            fn routes(&self) -> Vec<RouteDef> {
                vec![RouteDef::new(Method::GET, "orders/{id}", |_req, res: ResponseSink| async move {
                    res.send_text("first");
                    Ok(())
                })]
            }
        }

        impl RouteSet for Second {
            fn routes(&self) -> Vec<RouteDef> {
                vec![RouteDef::new(Method::GET, "orders/{id}", |_req, res: ResponseSink| async move {
                    res.send_text("second");
                    Ok(())
                })]
            }
        }

        let dispatcher = DispatcherBuilder::new()
            .register(&First)
            .register(&Second)
            .freeze();

        assert_eq!(dispatcher.route_count(), 1);

        let sink = run(&dispatcher, Method::GET, "/orders/9").await;
        let parts = sink.take().unwrap();
        assert_eq!(&parts.body[..], b"first");
    }

    #[tokio::test]
    async fn test_same_pattern_different_methods_both_registered() {
        struct Both;

        impl RouteSet for Both {
            fn routes(&self) -> Vec<RouteDef> {
                vec![
                    RouteDef::new(Method::GET, "items", |_req, res: ResponseSink| async move {
                        res.send_text("list");
                        Ok(())
                    }),
                    RouteDef::new(Method::POST, "items", |_req, res: ResponseSink| async move {
                        res.set_status(StatusCode::CREATED).send_text("created");
                        Ok(())
                    }),
                ]
            }
        }

        let dispatcher = DispatcherBuilder::new().register(&Both).freeze();
        assert_eq!(dispatcher.route_count(), 2);

        let sink = run(&dispatcher, Method::POST, "/items").await;
        let parts = sink.take().unwrap();
        assert_eq!(parts.status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_root_route_dispatch() {
        struct Root;

        impl RouteSet for Root {
            fn routes(&self) -> Vec<RouteDef> {
                vec![RouteDef::new(Method::GET, "", |_req, res: ResponseSink| async move {
                    res.send_text("root");
                    Ok(())
                })]
            }
        }

        let dispatcher = DispatcherBuilder::new().register(&Root).freeze();

        let sink = run(&dispatcher, Method::GET, "/").await;
        assert_eq!(&sink.take().unwrap().body[..], b"root");

        // Root route must not swallow other paths.
        let sink = run(&dispatcher, Method::GET, "/anything").await;
        assert_eq!(sink.take().unwrap().status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_case_insensitive_dispatch_preserves_binding_case() {
        struct Echo;

        impl RouteSet for Echo {
            fn routes(&self) -> Vec<RouteDef> {
                vec![RouteDef::new(Method::GET, "Users/{name}", |req: Request, res: ResponseSink| async move {
                    res.send_text(req.wildcard("name").unwrap_or("?").to_string());
                    Ok(())
                })]
            }
        }

        let dispatcher = DispatcherBuilder::new().register(&Echo).freeze();

        let sink = run(&dispatcher, Method::GET, "/USERS/Alice").await;
        assert_eq!(&sink.take().unwrap().body[..], b"Alice");
    }
}
