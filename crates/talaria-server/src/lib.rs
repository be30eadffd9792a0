//! # Talaria Server
//!
//! HTTP transport and request dispatch for the Talaria framework.
//!
//! This crate provides the serving infrastructure:
//!
//! - HTTP/1.1 support via Hyper
//! - Handler registration through [`RouteSet`]
//! - Fan-out dispatch over a frozen route table
//! - A bounded worker pool and graceful shutdown
//!
//! ## Example
//!
//! ```rust,ignore
//! use talaria_server::{RouteDef, RouteSet, Server};
//! use talaria_http::{Request, ResponseSink};
//! use http::Method;
//!
//! struct UserRoutes;
//!
//! impl RouteSet for UserRoutes {
//!     fn routes(&self) -> Vec<RouteDef> {
//!         vec![RouteDef::new(Method::GET, "users/{id}", get_user)]
//!     }
//! }
//!
//! async fn get_user(req: Request, res: ResponseSink) -> Result<(), talaria_server::HandlerError> {
//!     match req.wildcard_parsed::<u64>("id") {
//!         Some(id) => res.send_text(format!("user {id}")),
//!         None => res.set_status(http::StatusCode::BAD_REQUEST).send_text("bad id"),
//!     }
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::builder()
//!         .http_addr("0.0.0.0:8080")
//!         .register(&UserRoutes)
//!         .build();
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/talaria-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod dispatch;
pub mod handler;
pub mod server;
pub mod shutdown;
pub mod telemetry;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use dispatch::{Dispatcher, DispatcherBuilder, MatchPolicy};
pub use handler::{HandlerError, HandlerFuture, RouteDef, RouteHandler, RouteSet};
pub use server::{Server, ServerBuilder, ServerError};
pub use shutdown::{ConnectionTracker, ShutdownSignal};
pub use telemetry::{init_logging, LogConfig, TelemetryError};
