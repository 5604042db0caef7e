//! Lightweight checks on IRIs and IRI references.
//!
//! Full validation is delegated to [`oxiri`];
//! the regular expressions below only look at the overall shape of the string,
//! which is what JSON-LD processing needs when deciding how to interpret a key or a value.
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Match any string starting with an RFC 3986 `scheme`, followed by a colon,
    /// and not containing any whitespace.
    ///
    /// # Rule
    ///
    /// `scheme ::= ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`
    static ref ABSOLUTE_IRI: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9+\-.]*:[^\s]*$").unwrap();
}

/// Check whether `txt` looks like an absolute IRI,
/// i.e. starts with a scheme followed by a colon.
///
/// This check is deliberately shallow: it is the one used by JSON-LD processors
/// to distinguish absolute IRIs from terms, compact IRIs and relative references.
/// Use [`is_valid_iri`] for a full RFC 3987 validation.
pub fn is_absolute_iri(txt: &str) -> bool {
    ABSOLUTE_IRI.is_match(txt)
}

/// Check whether `txt` is a valid (absolute) IRI according to RFC 3987.
pub fn is_valid_iri(txt: &str) -> bool {
    oxiri::Iri::parse(txt).is_ok()
}

/// Check whether `txt` is a valid IRI reference (absolute or relative) according to RFC 3987.
pub fn is_valid_iri_ref(txt: &str) -> bool {
    oxiri::IriRef::parse(txt).is_ok()
}

/// Check whether `txt` ends with a `gen-delim` character as defined in RFC 3986
/// (`:`, `/`, `?`, `#`, `[`, `]` or `@`).
pub fn ends_with_gen_delim(txt: &str) -> bool {
    txt.ends_with([':', '/', '?', '#', '[', ']', '@'])
}
