//! Standard namespaces.
//!
//! This module provides the [`namespace`] macro, for defining static namespaces,
//! and modules corresponding to the namespaces used by JSON-LD processing
//! (generated via the [`namespace`] macro).
//!
//! Each term of a namespace is a `&'static str` constant holding the full IRI.
//!
//! # Example use
//! ```
//! use ldtk_api::ns::{rdf, xsd};
//!
//! assert_eq!(rdf::type_, "http://www.w3.org/1999/02/22-rdf-syntax-ns#type");
//! assert_eq!(xsd::PREFIX, "http://www.w3.org/2001/XMLSchema#");
//! ```

// rexport is necessary to ensure that the macros work.
pub use ldtk_iri::is_valid_iri;

#[macro_use]
mod _macro;

/// The standard `rdf:` namespace.
///
/// NB: since `type` is a reserved keyword in Rust,
/// the term `rdf:type` spells `rdf::type_` (with a trailing underscore).
pub mod rdf {
    namespace!(
        "http://www.w3.org/1999/02/22-rdf-syntax-ns#",
        // classes
        List,
        Property,
        // datatypes
        HTML,
        JSON,
        langString,
        XMLLiteral,
        CompoundLiteral,
        // properties
        direction,
        first,
        language,
        rest,
        value,
        // individuals
        nil;
        // 'type' is a Rust keyword, so we use 'type_' instead
        type_, "type"
    );
}

/// The standard `xsd:` namespace.
pub mod xsd {
    namespace!(
        "http://www.w3.org/2001/XMLSchema#",
        boolean,
        date,
        dateTime,
        decimal,
        double,
        float,
        integer,
        string
    );
}

/// The `i18n` namespace, used to encode base directions in datatypes.
pub mod i18n {
    /// Prefix used in this namespace.
    pub const PREFIX: &str = "https://www.w3.org/ns/i18n#";
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rdf_type() {
        assert_eq!(rdf::type_, "http://www.w3.org/1999/02/22-rdf-syntax-ns#type");
        assert_eq!(rdf::nil, "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil");
    }

    #[test]
    fn xsd_string() {
        assert_eq!(xsd::string, "http://www.w3.org/2001/XMLSchema#string");
    }

    #[test]
    fn i18n_prefix() {
        assert!(is_valid_iri(i18n::PREFIX));
    }
}
