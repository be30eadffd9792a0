//! Linear-scan route table and pattern matcher for Talaria.
//!
//! This crate provides the route-matching core of the framework: an
//! insertion-ordered route table scanned linearly per request, with
//! segment-wise pattern matching and named wildcard extraction.
//!
//! # Features
//!
//! - **Segment Matching**: path templates split on `/` and compared
//!   segment by segment
//! - **Wildcards**: `{name}` segments bind any single non-empty path
//!   segment (`/users/{id}`)
//! - **Case-Insensitive Paths**: `/Users/{id}` matches `/users/42` and
//!   `/USERS/42`; extracted values keep their original casing
//! - **Duplicate Detection**: registering the same normalized pattern and
//!   method twice keeps the first registration
//!
//! The table is built in two phases: a [`RouteTableBuilder`] accumulates
//! routes during startup, then [`RouteTableBuilder::freeze`] produces an
//! immutable [`RouteTable`] for the serving phase. No synchronization is
//! needed on the hot path because the frozen table is never mutated.
//!
//! Linear scan is a deliberate choice: route tables here are tens to low
//! hundreds of entries, and scanning every route is what allows several
//! templates to match the same request (fan-out dispatch).
//!
//! # Example
//!
//! ```rust
//! use talaria_router::{HandlerId, RouteTableBuilder, RouteTemplate};
//! use http::Method;
//!
//! let mut builder = RouteTableBuilder::new();
//! builder.add(RouteTemplate::new(Method::GET, "users/{id}", HandlerId::new(0)));
//! builder.add(RouteTemplate::new(Method::POST, "users", HandlerId::new(1)));
//!
//! let table = builder.freeze();
//!
//! let matched: Vec<_> = table
//!     .iter()
//!     .filter(|route| route.matches(&Method::GET, "/users/7"))
//!     .collect();
//! assert_eq!(matched.len(), 1);
//!
//! let bindings = matched[0].bind("/users/7");
//! assert_eq!(bindings.get("id"), Some("7"));
//! assert_eq!(bindings.get_parsed::<i32>("id"), Some(7));
//! ```

mod params;
mod route;
mod table;

pub use params::Params;
pub use route::{HandlerId, RouteTemplate};
pub use table::{RouteTable, RouteTableBuilder};
