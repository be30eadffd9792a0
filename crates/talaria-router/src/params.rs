//! Wildcard bindings extracted from a matched route.
//!
//! Bindings are stored as (name, value) pairs with a small-vector
//! optimization, since routes rarely carry more than a handful of
//! wildcards.

use std::str::FromStr;

use smallvec::SmallVec;

/// Maximum number of bindings stored inline (stack allocated).
const INLINE_PARAMS: usize = 4;

/// Named wildcard values bound during a route match.
///
/// One instance is created per matched route per request and discarded
/// when the request completes. Absence is the uniform contract for
/// lookups: a missing name or an unparsable value returns `None`, never
/// an error.
///
/// # Example
///
/// ```rust
/// use talaria_router::Params;
///
/// let mut params = Params::new();
/// params.push("id", "42");
///
/// assert_eq!(params.get("id"), Some("42"));
/// assert_eq!(params.get_parsed::<i64>("id"), Some(42));
/// assert_eq!(params.get("unknown"), None);
/// assert_eq!(params.get_parsed::<i64>("unknown"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates a new empty binding set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a binding.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the value bound to `name`, parsed as `T`.
    ///
    /// Returns `None` when the binding is missing or the value fails to
    /// parse. Callers check for absence; parse failures are never
    /// surfaced as errors.
    ///
    /// # Example
    ///
    /// ```rust
    /// use talaria_router::Params;
    ///
    /// let mut params = Params::new();
    /// params.push("id", "7");
    /// params.push("slug", "intro");
    ///
    /// assert_eq!(params.get_parsed::<i32>("id"), Some(7));
    /// assert_eq!(params.get_parsed::<i32>("slug"), None);
    /// ```
    #[must_use]
    pub fn get_parsed<T: FromStr>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|value| value.parse().ok())
    }

    /// Returns true if there are no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns an iterator over the bindings.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a str, &'a str);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (String, String)>,
        fn(&'a (String, String)) -> (&'a str, &'a str),
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}
