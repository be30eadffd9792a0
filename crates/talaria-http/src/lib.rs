//! Request descriptor and response sink for the Talaria framework.
//!
//! This crate holds the two per-request abstractions handlers work with:
//!
//! - [`Request`]: an immutable view of the inbound request with lazily
//!   derived conveniences (query parameters, wildcard bindings, body
//!   decoding). Lookups follow one uniform contract: a missing or
//!   unparsable value is `None`, never an error.
//! - [`ResponseSink`]: a cloneable, write-once capability for producing
//!   the response. When several routes match the same request (fan-out
//!   dispatch) they share one sink; the first handler to write wins and
//!   later writes are logged and dropped.
//!
//! Both are created per inbound request and discarded once the response
//! is sent.

mod request;
mod response;

pub use request::Request;
pub use response::{ResponseParts, ResponseSink};
