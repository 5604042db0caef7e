//! This crate is part of ldtk,
//! a [JSON-LD] and [Linked Data] toolkit in Rust.
//!
//! This crate provides canonical forms for
//! * RDF datasets, with the [RDFC-1.0](rdfc10) algorithm;
//! * JSON documents, with the [JSON Canonicalization Scheme](json) (RFC 8785);
//! * IEEE-754 [numbers](number), serialized as ECMAScript does.
//!
//! [JSON-LD]: https://www.w3.org/TR/json-ld11/
//! [Linked Data]: http://linkeddata.org/

#![deny(missing_docs)]

mod _permutations;

pub mod hash;
pub mod json;
pub mod number;
pub mod rdfc10;

pub use number::{format_number, InvalidNumber};
pub use rdfc10::normalize;

use thiserror::Error;

/// Canonicalization error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum C14nError {
    /// The dataset was deemed too complex by the configured safeguards of the algorithm
    #[error("Canonicalization complexity exceeded: {0}")]
    ComplexityExceeded(String),
    /// The c14n algorithm does not support this dataset
    #[error("Unsupported feature: {0}")]
    Unsupported(String),
    /// An IO error occurred while writing the normalized form
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for [`Result`](std::result::Result) with [`C14nError`] as the default error type.
pub type Result<T, E = C14nError> = std::result::Result<T, E>;

#[cfg(test)]
fn test_setup() {
    TEST_SETUP.call_once(|| {
        env_logger::init();
    });
}

#[cfg(test)]
static TEST_SETUP: std::sync::Once = std::sync::Once::new();
