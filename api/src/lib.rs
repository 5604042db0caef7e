//! This crate provides the RDF data model used by the ldtk toolkit:
//! [terms](term::Term), [quads](quad::Quad) and [datasets](dataset::Dataset),
//! together with the standard [namespaces](ns) and an [N-Quads](nq) reader and writer.
//!
//! It is deliberately minimal:
//! datasets are insertion-ordered sets of quads,
//! which is what JSON-LD processing and canonicalization need,
//! and nothing more (no indexing, no pattern matching).
#![deny(missing_docs)]

pub mod dataset;
pub mod nq;
pub mod ns;
pub mod quad;
pub mod term;

pub use dataset::Dataset;
pub use quad::Quad;
pub use term::{Literal, Term, TermError};
