//! This crate is part of [ldtk],
//! a [JSON-LD] and [Linked Data] toolkit in Rust.
//!
//! It provides functions for checking IRIs and IRI references,
//! for resolving IRI references against a given base IRI,
//! and for the reverse operation (relativizing an IRI against a base).
//!
//! [ldtk]: https://docs.rs/ldtk_jsonld/latest/ldtk_jsonld/
//! [JSON-LD]: https://www.w3.org/TR/json-ld11/
//! [Linked Data]: http://linkeddata.org/

#![deny(missing_docs)]

mod _regex;
pub use self::_regex::*;
pub mod error;
pub use error::InvalidIri;
pub mod relativize;
pub mod resolve;
