//! Request URI composition.

use crate::error::Result;
use url::Url;

/// Query parameters in insertion order.
///
/// Each key appears once. Inserting an existing key replaces its value and
/// keeps its original position, so the wire order is the order in which keys
/// were first added.
///
/// # Examples
///
/// ```
/// use courier::QueryParams;
///
/// let mut params = QueryParams::new();
/// params.insert("page", "1");
/// params.insert("size", "20");
/// params.insert("page", "2");
///
/// let pairs: Vec<_> = params.iter().collect();
/// assert_eq!(pairs, vec![("page", "2"), ("size", "20")]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Creates an empty set of query parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.pairs.push((key, value)),
        }
    }

    /// Returns the value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over the pairs in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        params.extend(iter);
        params
    }
}

impl<K, V> Extend<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

/// Appends a trailing `/` to a base address if it lacks one.
pub(crate) fn normalize_base(base: &str) -> String {
    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    }
}

/// Joins `base`, `route` and `query` into an absolute URI.
///
/// Query values are written as given. Reserved characters must be
/// percent-encoded by the caller.
pub(crate) fn build_uri(base: &str, route: &str, query: &QueryParams) -> Result<Url> {
    let mut uri = String::with_capacity(base.len() + route.len());
    uri.push_str(base);
    uri.push_str(route);

    if !query.is_empty() {
        uri.push('?');
        let mut pairs = query.iter().peekable();
        while let Some((key, value)) = pairs.next() {
            uri.push_str(key);
            uri.push('=');
            uri.push_str(value);
            if pairs.peek().is_some() {
                uri.push('&');
            }
        }
    }

    Ok(Url::parse(&uri)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_route_is_appended_to_base() {
        let uri = build_uri("http://api.test/", "items/5", &QueryParams::new()).unwrap();
        assert_eq!(uri.as_str(), "http://api.test/items/5");
    }

    #[test]
    fn test_empty_route_is_base_alone() {
        let uri = build_uri("http://api.test/v1/", "", &QueryParams::new()).unwrap();
        assert_eq!(uri.as_str(), "http://api.test/v1/");
    }

    #[test]
    fn test_query_preserves_insertion_order() {
        let query: QueryParams = [("z", "1"), ("a", "2"), ("m", "3")].into_iter().collect();
        let uri = build_uri("http://api.test/", "search", &query).unwrap();
        assert_eq!(uri.as_str(), "http://api.test/search?z=1&a=2&m=3");
        assert_eq!(uri.query(), Some("z=1&a=2&m=3"));
    }

    #[test]
    fn test_query_has_one_pair_per_key() {
        let mut query = QueryParams::new();
        for i in 0..10 {
            query.insert(format!("k{}", i % 4), i.to_string());
        }
        let uri = build_uri("http://api.test/", "", &query).unwrap();
        let raw = uri.query().unwrap();
        assert_eq!(raw.split('&').count(), 4);
        assert!(!raw.ends_with('&'));
        assert_eq!(raw, "k0=8&k1=9&k2=6&k3=7");
    }

    #[test]
    fn test_pre_encoded_values_are_kept() {
        let query: QueryParams = [("q", "a%26b")].into_iter().collect();
        let uri = build_uri("http://api.test/", "find", &query).unwrap();
        assert_eq!(uri.query(), Some("q=a%26b"));
    }

    #[test]
    fn test_relative_base_is_invalid() {
        let err = build_uri("api.test/", "items", &QueryParams::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidUri(_)));
    }

    #[test]
    fn test_normalize_base() {
        assert_eq!(normalize_base("http://api.test"), "http://api.test/");
        assert_eq!(normalize_base("http://api.test/v2/"), "http://api.test/v2/");
    }
}
