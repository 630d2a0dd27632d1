//! Path and query-string construction.
//!
//! A request target is described as an ordered list of [`Segment`]s: literal
//! path tokens interleaved with query mappings. [`build_path`] turns that list
//! into `"<tokens joined by '/'>?<pairs joined by '&'>"`.
//!
//! Path tokens are emitted verbatim. Callers are responsible for passing
//! valid tokens, including the `docs('<key>')` lookup form. Query values are
//! percent-encoded with URI-component rules; query names are emitted as-is.
//!
//! The `?` separator is always present, even when there are no query pairs.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left unescaped in query values, matching URI-component
/// encoding: alphanumerics plus `- _ . ! ~ * ' ( )`.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Value of a single query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// Emitted as one `name=value` pair.
    Single(String),
    /// Emitted as one `name=value` pair per element, in order.
    Many(Vec<String>),
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

impl From<Vec<&str>> for QueryValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Many(values.into_iter().map(str::to_string).collect())
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<u64> for QueryValue {
    fn from(value: u64) -> Self {
        Self::Single(value.to_string())
    }
}

/// An ordered mapping of query-parameter names to values.
///
/// Insertion order is emission order. Inserting an existing name replaces
/// its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, QueryValue)>);

impl QueryParams {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, keeping the existing position of `name` if it
    /// was already present.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<QueryValue>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Returns the value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&QueryValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Returns `true` if no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<QueryValue>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

// ---------------------------------------------------------------------------
// Segments
// ---------------------------------------------------------------------------

/// One element of a request target description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A literal path token.
    Path(String),
    /// A query-parameter mapping.
    Query(QueryParams),
}

impl From<&str> for Segment {
    fn from(token: &str) -> Self {
        Self::Path(token.to_string())
    }
}

impl From<String> for Segment {
    fn from(token: String) -> Self {
        Self::Path(token)
    }
}

impl From<QueryParams> for Segment {
    fn from(params: QueryParams) -> Self {
        Self::Query(params)
    }
}

/// Builds `"<path>?<query>"` from `segments`.
///
/// Path tokens are joined with `/` in order. Query mappings are visited in
/// order of appearance and their entries in insertion order.
///
/// ```
/// use search::path::{build_path, QueryParams, Segment};
///
/// let segments = [
///     Segment::from("a"),
///     Segment::from("b"),
///     Segment::from(QueryParams::new().with("facet", vec!["x", "y"])),
/// ];
/// assert_eq!(build_path(&segments), "a/b?facet=x&facet=y");
/// ```
pub fn build_path(segments: &[Segment]) -> String {
    let mut path: Vec<&str> = Vec::new();
    let mut pairs: Vec<String> = Vec::new();

    for segment in segments {
        match segment {
            Segment::Path(token) => path.push(token),
            Segment::Query(params) => {
                for (name, value) in params.iter() {
                    match value {
                        QueryValue::Single(v) => pairs.push(pair(name, v)),
                        QueryValue::Many(vs) => pairs.extend(vs.iter().map(|v| pair(name, v))),
                    }
                }
            }
        }
    }

    format!("{}?{}", path.join("/"), pairs.join("&"))
}

fn pair(name: &str, value: &str) -> String {
    format!("{name}={}", utf8_percent_encode(value, QUERY_VALUE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn segs(tokens: &[&str], params: Option<QueryParams>) -> Vec<Segment> {
        let mut out: Vec<Segment> = tokens.iter().map(|t| Segment::from(*t)).collect();
        if let Some(p) = params {
            out.push(p.into());
        }
        out
    }

    #[test]
    fn sequence_values_repeat_the_name() {
        let params = QueryParams::new().with("facet", vec!["x", "y"]);
        assert_eq!(build_path(&segs(&["a", "b"], Some(params))), "a/b?facet=x&facet=y");
    }

    #[test]
    fn scalars_and_sequences_keep_insertion_order() {
        let params = QueryParams::new()
            .with("format", "json")
            .with("facet", vec!["a", "b"]);
        assert_eq!(
            build_path(&segs(&["hello", "world"], Some(params))),
            "hello/world?format=json&facet=a&facet=b"
        );
    }

    #[test]
    fn trailing_question_mark_without_query() {
        assert_eq!(build_path(&segs(&["indexes"], None)), "indexes?");
        assert_eq!(build_path(&segs(&["indexes"], Some(QueryParams::new()))), "indexes?");
    }

    #[test]
    fn values_are_component_encoded_but_paths_are_not() {
        let params = QueryParams::new().with("search", "a b&c=d/é").with("$filter", "x eq 'y'");
        assert_eq!(
            build_path(&segs(&["indexes", "docs('k 1')"], Some(params))),
            "indexes/docs('k 1')?search=a%20b%26c%3Dd%2F%C3%A9&$filter=x%20eq%20'y'"
        );
    }

    #[test]
    fn later_mappings_follow_earlier_ones() {
        let segments = vec![
            Segment::from("indexes"),
            QueryParams::new().with("search", "*").into(),
            QueryParams::new().with("api-version", "2020-06-30").into(),
        ];
        assert_eq!(build_path(&segments), "indexes?search=*&api-version=2020-06-30");
    }

    #[test]
    fn reinserting_a_name_replaces_in_place() {
        let params = QueryParams::new()
            .with("top", 5u64)
            .with("skip", 1u64)
            .with("top", 10u64);
        assert_eq!(build_path(&segs(&[], Some(params))), "?top=10&skip=1");
    }

    proptest! {
        #[test]
        fn one_pair_per_sequence_element(values in proptest::collection::vec("[a-z0-9]{1,8}", 0..8)) {
            let params = QueryParams::new().with("facet", values.clone());
            let built = build_path(&segs(&["p"], Some(params)));
            let expected: Vec<String> = values.iter().map(|v| format!("facet={v}")).collect();
            prop_assert_eq!(built, format!("p?{}", expected.join("&")));
        }

        #[test]
        fn building_is_deterministic(tokens in proptest::collection::vec("[a-zA-Z0-9]{1,6}", 1..5),
                                     value in ".{0,16}") {
            let params = QueryParams::new().with("q", value.as_str());
            let refs: Vec<&str> = tokens.iter().map(String::as_str).collect();
            let first = build_path(&segs(&refs, Some(params.clone())));
            let second = build_path(&segs(&refs, Some(params)));
            prop_assert_eq!(first, second);
        }
    }
}
