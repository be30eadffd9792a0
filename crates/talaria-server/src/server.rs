//! HTTP server implementation.
//!
//! This module provides the main HTTP transport for Talaria,
//! built on Hyper and Tokio for async I/O.
//!
//! # Architecture
//!
//! The server consists of:
//!
//! - TCP listener bound to the configured address
//! - A bounded worker pool gating concurrent connections
//! - Request dispatch via the [`Dispatcher`]
//! - Graceful shutdown support
//!
//! # Example
//!
//! ```rust,ignore
//! use talaria_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::builder()
//!         .http_addr("0.0.0.0:8080")
//!         .register(&MyRoutes)
//!         .build();
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

use talaria_http::ResponseSink;

use crate::config::ServerConfig;
use crate::dispatch::{Dispatcher, DispatcherBuilder, MatchPolicy};
use crate::handler::{HandlerError, RouteSet};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Type alias for the HTTP response body.
pub type ResponseBody = Full<Bytes>;

/// Type alias for the HTTP response.
pub type HttpResponse = Response<ResponseBody>;

/// Server error types.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the configured address.
    #[error("bind error: {0}")]
    Bind(String),

    /// I/O error during server operation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The Talaria HTTP server.
///
/// Accepts connections, collects request bodies, and hands each
/// request to the frozen [`Dispatcher`].
///
/// # Example
///
/// ```rust,ignore
/// use talaria_server::Server;
///
/// let server = Server::builder()
///     .http_addr("127.0.0.1:8080")
///     .worker_limit(20)
///     .register(&UserRoutes)
///     .build();
/// ```
pub struct Server {
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
}

impl Server {
    /// Creates a new server builder.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns a reference to the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Runs the server until a shutdown signal is received.
    ///
    /// Binds to the configured address and begins accepting
    /// connections. Handles graceful shutdown on SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot bind to the configured
    /// address or an I/O error occurs.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Runs the server with a custom shutdown signal.
    ///
    /// This is useful for testing or when you want to control
    /// shutdown programmatically.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot bind or an I/O error occurs.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self.config.socket_addr().map_err(|e| {
            ServerError::Bind(format!(
                "Invalid address '{}': {}",
                self.config.http_addr(),
                e
            ))
        })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(format!("Failed to bind to {addr}: {e}")))?;

        tracing::info!(
            routes = self.dispatcher.route_count(),
            workers = self.config.worker_limit(),
            "Server listening on {}",
            addr
        );

        let workers = Arc::new(Semaphore::new(self.config.worker_limit()));
        let tracker = ConnectionTracker::new();

        // Accept connections until shutdown. A worker permit is held for
        // the lifetime of each connection; when all permits are taken,
        // new connections queue in the listener backlog.
        loop {
            let permit = tokio::select! {
                permit = Arc::clone(&workers).acquire_owned() => {
                    match permit {
                        Ok(permit) => permit,
                        Err(_) => break,
                    }
                }
                _ = shutdown.recv() => break,
            };

            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let dispatcher = Arc::clone(&self.dispatcher);
                            let token = tracker.token();
                            let shutdown_clone = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(e) =
                                    handle_connection(dispatcher, stream, shutdown_clone).await
                                {
                                    tracing::error!("Connection error from {}: {}", remote_addr, e);
                                }
                                drop(token);
                                drop(permit);
                            });
                        }
                        Err(e) => {
                            tracing::error!("Failed to accept connection: {}", e);
                        }
                    }
                }

                _ = shutdown.recv() => break,
            }
        }

        tracing::info!("Shutdown signal received, stopping server");
        drop(listener);

        // Wait for in-flight connections with timeout
        let shutdown_timeout = self.config.shutdown_timeout();
        tokio::select! {
            () = tracker.wait_idle() => {
                tracing::info!("All connections closed");
            }
            () = tokio::time::sleep(shutdown_timeout) => {
                tracing::warn!(
                    "Shutdown timeout of {:?} reached with connections still active",
                    shutdown_timeout
                );
            }
        }

        tracing::info!("Server stopped");
        Ok(())
    }
}

/// Serves one connection with HTTP/1.
async fn handle_connection(
    dispatcher: Arc<Dispatcher>,
    stream: tokio::net::TcpStream,
    shutdown: ShutdownSignal,
) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);

    let service = service_fn(move |req: http::Request<Incoming>| {
        let dispatcher = Arc::clone(&dispatcher);
        async move { handle_request(dispatcher, req).await }
    });

    let conn = http1::Builder::new().serve_connection(io, service);

    tokio::select! {
        result = conn => result,
        _ = shutdown.recv() => Ok(()),
    }
}

/// Handles a single HTTP request.
async fn handle_request(
    dispatcher: Arc<Dispatcher>,
    req: http::Request<Incoming>,
) -> Result<HttpResponse, Infallible> {
    let (parts, body) = req.into_parts();

    tracing::debug!("{} {}", parts.method, parts.uri.path());

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::error!("Failed to collect request body: {}", e);
            return Ok(plain_response(
                StatusCode::BAD_REQUEST,
                "Failed to read request body.",
            ));
        }
    };

    let sink = ResponseSink::new();
    dispatcher
        .dispatch(parts.method, parts.uri, parts.headers, body, sink.clone())
        .await;

    match sink.take() {
        Some(written) => {
            let mut builder = Response::builder().status(written.status);
            if let Some(headers) = builder.headers_mut() {
                headers.extend(written.headers);
            }
            Ok(builder
                .body(Full::new(written.body))
                .unwrap_or_else(|_| plain_response(StatusCode::INTERNAL_SERVER_ERROR, "")))
        }
        None => {
            // Every matched handler returned without writing.
            tracing::error!("No handler wrote a response");
            Ok(plain_response(StatusCode::INTERNAL_SERVER_ERROR, ""))
        }
    }
}

fn plain_response(status: StatusCode, body: &'static str) -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response
}

/// Builder for configuring and creating a [`Server`].
///
/// Combines transport settings with handler registration; [`build`]
/// freezes the route table.
///
/// # Example
///
/// ```rust
/// use talaria_server::Server;
/// use std::time::Duration;
///
/// let server = Server::builder()
///     .http_addr("0.0.0.0:9090")
///     .shutdown_timeout(Duration::from_secs(60))
///     .build();
///
/// assert_eq!(server.config().http_addr(), "0.0.0.0:9090");
/// ```
///
/// [`build`]: ServerBuilder::build
pub struct ServerBuilder {
    config_builder: crate::config::ServerConfigBuilder,
    dispatcher: DispatcherBuilder,
}

impl ServerBuilder {
    /// Creates a new server builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config_builder: crate::config::ServerConfigBuilder::new(),
            dispatcher: DispatcherBuilder::new(),
        }
    }

    /// Sets the HTTP bind address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.http_addr(addr);
        self
    }

    /// Sets the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.shutdown_timeout(timeout);
        self
    }

    /// Sets the concurrent worker limit.
    #[must_use]
    pub fn worker_limit(mut self, limit: usize) -> Self {
        self.config_builder = self.config_builder.worker_limit(limit);
        self
    }

    /// Registers every route contributed by a handler source.
    #[must_use]
    pub fn register(mut self, source: &dyn RouteSet) -> Self {
        self.dispatcher = self.dispatcher.register(source);
        self
    }

    /// Replaces the not-found collaborator.
    #[must_use]
    pub fn not_found<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(talaria_http::Request, ResponseSink) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.dispatcher = self.dispatcher.not_found(handler);
        self
    }

    /// Sets the match policy.
    #[must_use]
    pub fn match_policy(mut self, policy: MatchPolicy) -> Self {
        self.dispatcher = self.dispatcher.match_policy(policy);
        self
    }

    /// Builds the server, freezing the route table.
    #[must_use]
    pub fn build(self) -> Server {
        Server {
            config: self.config_builder.build(),
            dispatcher: Arc::new(self.dispatcher.freeze()),
        }
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::RouteDef;
    use http::Method;
    use talaria_http::Request;

    struct PingRoutes;

    impl RouteSet for PingRoutes {
        fn routes(&self) -> Vec<RouteDef> {
            vec![RouteDef::new(
                Method::GET,
                "ping",
                |_req: Request, res: ResponseSink| async move {
                    res.send_text("pong");
                    Ok(())
                },
            )]
        }
    }

    #[test]
    fn test_server_builder() {
        let server = Server::builder()
            .http_addr("0.0.0.0:9090")
            .shutdown_timeout(Duration::from_secs(60))
            .worker_limit(4)
            .register(&PingRoutes)
            .build();

        assert_eq!(server.config().http_addr(), "0.0.0.0:9090");
        assert_eq!(server.config().shutdown_timeout(), Duration::from_secs(60));
        assert_eq!(server.config().worker_limit(), 4);
        assert_eq!(server.dispatcher().route_count(), 1);
    }

    #[tokio::test]
    async fn test_server_run_invalid_address() {
        let server = Server::builder().http_addr("not-a-valid-address").build();

        let result = server.run_with_shutdown(ShutdownSignal::new()).await;

        match result {
            Err(ServerError::Bind(msg)) => assert!(msg.contains("Invalid address")),
            other => panic!("Expected bind error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_run_and_shutdown() {
        let server = Server::builder()
            .http_addr("127.0.0.1:0") // Use port 0 for random available port
            .shutdown_timeout(Duration::from_millis(100))
            .register(&PingRoutes)
            .build();

        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            server.run_with_shutdown(shutdown),
        )
        .await;

        assert!(result.is_ok());
        assert!(result.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_handle_request_via_dispatcher() {
        let dispatcher = Arc::new(
            DispatcherBuilder::new().register(&PingRoutes).freeze(),
        );

        let sink = ResponseSink::new();
        dispatcher
            .dispatch(
                Method::GET,
                http::Uri::from_static("/ping"),
                http::HeaderMap::new(),
                Bytes::new(),
                sink.clone(),
            )
            .await;

        let parts = sink.take().unwrap();
        assert_eq!(parts.status, StatusCode::OK);
        assert_eq!(&parts.body[..], b"pong");
    }

    #[test]
    fn test_server_error_display() {
        let bind_err = ServerError::Bind("Address in use".to_string());
        assert!(bind_err.to_string().contains("bind error"));

        let io_err = ServerError::from(std::io::Error::other("Connection reset"));
        assert!(io_err.to_string().contains("I/O error"));
    }
}
