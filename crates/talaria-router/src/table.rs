//! Two-phase route table: builder for the registration phase, frozen
//! table for the serving phase.
//!
//! Registration and serving are strictly phase-separated. The builder is
//! the only mutable form; freezing it produces a read-only table that can
//! be shared across worker tasks without synchronization.

use crate::route::RouteTemplate;

/// Accumulates route templates during the registration phase.
///
/// Duplicate routes are rejected: two templates are equivalent when their
/// trailing-slash-normalized patterns are equal and their methods are
/// equal. The earlier registration wins; the rejection is logged, never
/// raised.
///
/// # Example
///
/// ```rust
/// use talaria_router::{HandlerId, RouteTableBuilder, RouteTemplate};
/// use http::Method;
///
/// let mut builder = RouteTableBuilder::new();
/// assert!(builder.add(RouteTemplate::new(Method::GET, "orders/{id}", HandlerId::new(0))));
///
/// // Same normalized pattern and method: rejected, first wins.
/// assert!(!builder.add(RouteTemplate::new(Method::GET, "orders/{id}/", HandlerId::new(1))));
///
/// // Same pattern, different method: kept.
/// assert!(builder.add(RouteTemplate::new(Method::DELETE, "orders/{id}", HandlerId::new(2))));
///
/// let table = builder.freeze();
/// assert_eq!(table.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteTableBuilder {
    routes: Vec<RouteTemplate>,
}

impl RouteTableBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route, rejecting duplicates.
    ///
    /// Returns `true` when the route was added and `false` when an
    /// equivalent route was already registered. The scan over existing
    /// routes is O(n) per call, which is fine at expected table sizes.
    pub fn add(&mut self, route: RouteTemplate) -> bool {
        if let Some(existing) = self.routes.iter().find(|r| {
            r.method() == route.method() && r.normalized_pattern() == route.normalized_pattern()
        }) {
            tracing::warn!(
                method = %route.method(),
                pattern = %route.pattern(),
                kept = %existing.pattern(),
                "duplicate route rejected; earlier registration wins"
            );
            return false;
        }

        self.routes.push(route);
        true
    }

    /// Returns the number of routes accumulated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Ends the registration phase and produces the immutable table.
    #[must_use]
    pub fn freeze(self) -> RouteTable {
        RouteTable {
            routes: self.routes,
        }
    }
}

/// The frozen, insertion-ordered route table used during serving.
///
/// Read-only by construction; dispatch scans it linearly per request.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteTemplate>,
}

impl RouteTable {
    /// Returns an iterator over the routes in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, RouteTemplate> {
        self.routes.iter()
    }

    /// Returns the number of routes in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if the table holds no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a RouteTemplate;
    type IntoIter = std::slice::Iter<'a, RouteTemplate>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}
