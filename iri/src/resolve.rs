//! Implementation of IRI resolution as per
//! [\[RFC 3987\]](https://tools.ietf.org/html/rfc3987).
//!
//! This module is based on <https://docs.rs/oxiri/>.
//!
//! NB: a [`BaseIri`] is slower to build than a plain string,
//! because it analyses the internal structure of the IRI,
//! in order to allow for efficient resolution of relative IRIs.

use crate::error::{InvalidIri, Result};
use std::ops::Deref;

pub use oxiri::IriParseError;

/// A `BaseIri` is an absolute IRI against which relative IRIs can be resolved.
/// It stores the internal structure of the IRI,
/// to allow for efficient resolution of relative IRIs against itself.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct BaseIri(oxiri::Iri<String>);

impl BaseIri {
    /// Creates a new `BaseIri` if `iri` is a valid absolute IRI,
    /// otherwise returns an [`InvalidIri`] error.
    pub fn new<T: Into<String>>(iri: T) -> Result<Self> {
        let iri = iri.into();
        match oxiri::Iri::parse(iri) {
            Ok(parsed) => Ok(BaseIri(parsed)),
            Err(err) => {
                log::trace!("invalid base IRI: {err}");
                Err(InvalidIri(err.to_string()))
            }
        }
    }

    /// The textual form of this IRI.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Resolves `iri` against this `BaseIri`.
    ///
    /// Fails if `iri` is not a valid IRI reference.
    pub fn resolve(&self, iri: &str) -> Result<String> {
        self.0
            .resolve(iri)
            .map(oxiri::Iri::into_inner)
            .map_err(|_| InvalidIri(iri.to_string()))
    }

    /// Resolves `iri` against this `BaseIri`, using `buf` to store the result.
    pub fn resolve_into(&self, iri: &str, buf: &mut String) -> Result<()> {
        self.0
            .resolve_into(iri, buf)
            .map_err(|_| InvalidIri(iri.to_string()))
    }

    /// Consume this `BaseIri` and return its textual form.
    pub fn into_inner(self) -> String {
        self.0.into_inner()
    }
}

impl Deref for BaseIri {
    type Target = oxiri::Iri<String>;
    fn deref(&self) -> &oxiri::Iri<String> {
        &self.0
    }
}

impl std::fmt::Display for BaseIri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.as_str().fmt(f)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;

    const BASE: &str = "http://a/b/c/d;p?q";

    #[test]
    fn parts() {
        let base = BaseIri::new("http://a/b/c/d;p?q#f").unwrap();
        assert_eq!(base.scheme(), "http");
        assert_eq!(base.authority(), Some("a"));
        assert_eq!(base.path(), "/b/c/d;p");
        assert_eq!(base.query(), Some("q"));
        assert_eq!(base.fragment(), Some("f"));
        assert_eq!(base.to_string(), "http://a/b/c/d;p?q#f");
    }

    // examples of RFC 3986, section 5.4
    #[test_case("g:h", "g:h"; "other scheme")]
    #[test_case("g", "http://a/b/c/g"; "name")]
    #[test_case("./g", "http://a/b/c/g"; "dot name")]
    #[test_case("g/", "http://a/b/c/g/"; "directory")]
    #[test_case("/g", "http://a/g"; "absolute path")]
    #[test_case("//g", "http://g"; "authority")]
    #[test_case("?y", "http://a/b/c/d;p?y"; "query")]
    #[test_case("g?y", "http://a/b/c/g?y"; "name query")]
    #[test_case("#s", "http://a/b/c/d;p?q#s"; "fragment")]
    #[test_case("g?y#s", "http://a/b/c/g?y#s"; "name query fragment")]
    #[test_case(";x", "http://a/b/c/;x"; "params")]
    #[test_case("", "http://a/b/c/d;p?q"; "empty")]
    #[test_case(".", "http://a/b/c/"; "dot")]
    #[test_case("..", "http://a/b/"; "dot dot")]
    #[test_case("../g", "http://a/b/g"; "parent name")]
    #[test_case("../../", "http://a/"; "grandparent")]
    #[test_case("../../../g", "http://a/g"; "above root")]
    #[test_case("/./g", "http://a/g"; "absolute dot")]
    #[test_case("g.", "http://a/b/c/g."; "trailing dot")]
    #[test_case("..g", "http://a/b/c/..g"; "leading dots")]
    #[test_case("g;x=1/../y", "http://a/b/c/y"; "params dot dot")]
    #[test_case("g?y/../x", "http://a/b/c/g?y/../x"; "dots in query")]
    #[test_case("g#s/./x", "http://a/b/c/g#s/./x"; "dots in fragment")]
    fn resolve(rel: &str, abs: &str) {
        let base = BaseIri::new(BASE).unwrap();
        assert_eq!(base.resolve(rel).unwrap(), abs);
        let mut buf = String::new();
        base.resolve_into(rel, &mut buf).unwrap();
        assert_eq!(buf, abs);
        assert_eq!(BaseIri::new(rel).is_ok(), rel == abs);
    }

    #[test]
    fn resolve_bad_str() {
        let base = BaseIri::new(BASE).unwrap();
        for txt in ["a b", "<foo>", "http://[/"] {
            assert!(base.resolve(txt).is_err(), "{txt}");
        }
    }
}
