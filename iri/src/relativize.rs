//! Relativization of IRIs against a base IRI,
//! as performed by JSON-LD processors when compacting document-relative IRIs.
//!
//! Only IRIs sharing the scheme and authority of the base are relativized.
//! The result always resolves back to the original IRI against the base.

use crate::resolve::BaseIri;

/// A relativizer can be used to relativize multiple IRIs against the same base.
#[derive(Clone, Debug)]
pub struct Relativizer {
    base: String,
    /// `scheme://authority` of the base, if it has an authority
    root: Option<String>,
    /// path segments of the base (the first one is empty for absolute paths)
    segments: Vec<String>,
}

impl Relativizer {
    /// Build a [`Relativizer`] from a [`BaseIri`].
    pub fn new(base: &BaseIri) -> Self {
        let root = base
            .authority()
            .map(|authority| format!("{}://{authority}", base.scheme()));
        let segments = base.path().split('/').map(str::to_string).collect();
        Relativizer {
            base: base.as_str().to_string(),
            root,
            segments,
        }
    }

    /// The base of this [`Relativizer`]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Relativize the given absolute IRI against the base of this [`Relativizer`] if possible.
    ///
    /// Return `None` if `iri` does not share the scheme and authority of the base.
    pub fn relativize(&self, iri: &str) -> Option<String> {
        let rest = iri.strip_prefix(self.root.as_deref()?)?;
        if !(rest.is_empty() || rest.starts_with(['/', '?', '#'])) {
            // different authority, sharing a prefix with the base's one
            return None;
        }
        let (rest, fragment) = split_once_opt(rest, '#');
        let (path, query) = split_once_opt(rest, '?');
        if path.is_empty() {
            // no relative reference can drop the base path
            return None;
        }
        let iri_segments: Vec<&str> = path.split('/').collect();

        // the last segment of the IRI is kept, unless followed by a query or fragment
        let keep_last = usize::from(query.is_none() && fragment.is_none());
        let common = self
            .segments
            .iter()
            .zip(&iri_segments)
            .take(iri_segments.len().saturating_sub(keep_last))
            .take_while(|(b, i)| b == i)
            .count();

        let mut result = String::new();
        // the last base segment is a file name, not a directory
        let parents = (self.segments.len() - common).saturating_sub(1);
        for _ in 0..parents {
            result.push_str("../");
        }
        result.push_str(&iri_segments[common..].join("/"));
        if let Some(query) = query {
            result.push('?');
            result.push_str(query);
        }
        if let Some(fragment) = fragment {
            result.push('#');
            result.push_str(fragment);
        }
        if result.is_empty() {
            result.push_str("./");
        }
        Some(result)
    }
}

fn split_once_opt(txt: &str, sep: char) -> (&str, Option<&str>) {
    match txt.split_once(sep) {
        Some((before, after)) => (before, Some(after)),
        None => (txt, None),
    }
}

#[cfg(test)]
mod test {
    use test_case::test_case;

    use super::*;

    const BASE: &str = "http://a/b/c/d;p?q";

    #[test_case("http://a/b/c/g", "g"; "sibling")]
    #[test_case("http://a/b/c/g/", "g/"; "sibling_dir")]
    #[test_case("http://a/b/c/g?y#s", "g?y#s"; "sibling_query")]
    #[test_case("http://a/b/c/d;p?y", "?y"; "other_query")]
    #[test_case("http://a/b/c/d;p?q#s", "?q#s"; "fragment")]
    #[test_case("http://a/b/c/", "./"; "current_dir")]
    #[test_case("http://a/b/", "../"; "parent_dir")]
    #[test_case("http://a/b/g", "../g"; "parent")]
    #[test_case("http://a/g", "../../g"; "grandparent")]
    #[test_case("http://a/", "../../"; "root")]
    fn relativize(iri: &str, exp: &str) {
        let base = BaseIri::new(BASE).unwrap();
        let got = Relativizer::new(&base).relativize(iri);
        assert_eq!(got.as_deref(), Some(exp));
        assert_eq!(base.resolve(exp).unwrap(), iri);
    }

    #[test_case("http://example.org/a/b", "http://example.org/a/b", "b"; "identical")]
    #[test_case("http://example.org/a/b", "http://example.org/a/c", "c"; "sibling")]
    #[test_case("http://example.org/a/b", "http://example.org/x", "../x"; "parent")]
    #[test_case("http://example.org/a/b", "http://example.org/a/b#frag", "#frag"; "fragment")]
    #[test_case("http://example.org/a/", "http://example.org/a/", "./"; "directory")]
    fn relativize_other_bases(base: &str, iri: &str, exp: &str) {
        let rel = Relativizer::new(&BaseIri::new(base).unwrap());
        assert_eq!(rel.relativize(iri).as_deref(), Some(exp));
    }

    #[test]
    fn not_relativizable() {
        let rel = Relativizer::new(&BaseIri::new("http://example.org/a/b").unwrap());
        assert_eq!(rel.relativize("https://example.org/a/b"), None);
        assert_eq!(rel.relativize("http://example.org.uk/a/b"), None);
        assert_eq!(rel.relativize("tag:foo"), None);
        let rel = Relativizer::new(&BaseIri::new("tag:foo/bar").unwrap());
        assert_eq!(rel.relativize("tag:foo/baz"), None);
    }
}
