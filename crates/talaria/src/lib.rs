//! # Talaria
//!
//! **Segment-matched HTTP routing and dispatch, built on Tokio and Hyper**
//!
//! Talaria routes requests over a frozen table of `{name}` path
//! templates. Matching is a linear scan in registration order, and by
//! default every matching route runs, sharing one write-once response
//! sink. Handlers declare themselves through the [`RouteSet`] trait;
//! no macros or reflection.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use talaria::prelude::*;
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
//! async fn get_user(req: Request, res: ResponseSink) -> Result<(), HandlerError> {
//!     match req.wildcard_parsed::<u64>("id") {
//!         Some(id) => res.send_text(format!("user {id}")),
//!         None => res.set_status(http::StatusCode::BAD_REQUEST).send_text("bad id"),
//!     }
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     Server::builder()
//!         .http_addr("0.0.0.0:8080")
//!         .register(&UserRoutes)
//!         .build()
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/talaria/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export router types
pub use talaria_router as router;

// Re-export request/response types
pub use talaria_http as http_types;

// Re-export server types
pub use talaria_server as server;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use talaria::prelude::*;
/// ```
pub mod prelude {
    pub use talaria_http::{Request, ResponseSink};
    pub use talaria_router::Params;
    pub use talaria_server::{
        HandlerError, LogConfig, MatchPolicy, RouteDef, RouteSet, Server, ShutdownSignal,
    };
}
